use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};

use crate::errors::ParserError;
use crate::model::{ParsedUpload, SourceFormat};
use crate::registry::TabularParser;

use super::common::{normalize_header_labels, HeaderMap, RecordAccumulator};

/// Excel workbooks (`.xls` and `.xlsx`). Only the first worksheet is read and
/// its row 1 is the header.
pub struct SpreadsheetParser;

impl Default for SpreadsheetParser {
    fn default() -> Self {
        Self
    }
}

impl SpreadsheetParser {
    const NAME: &'static str = "SPREADSHEET";
    const HEADER_ROW: u32 = 0;

    fn first_worksheet(content: &[u8]) -> Result<Range<Data>, ParserError> {
        let mut workbook =
            open_workbook_auto_from_rs(Cursor::new(content)).map_err(|err| {
                ParserError::Workbook {
                    parser: Self::NAME,
                    source: err,
                }
            })?;

        workbook
            .worksheet_range_at(0)
            .ok_or_else(|| ParserError::EmptyInput {
                parser: Self::NAME,
                reason: "workbook has no worksheet".to_string(),
            })?
            .map_err(|err| ParserError::Workbook {
                parser: Self::NAME,
                source: err,
            })
    }

    /// Text shown for a cell, in the shape the date and number decoders expect.
    pub(crate) fn cell_text(cell: &Data) -> String {
        match cell {
            Data::Empty | Data::Error(_) => String::new(),
            Data::String(value) | Data::DateTimeIso(value) | Data::DurationIso(value) => {
                value.clone()
            }
            Data::Float(value) => value.to_string(),
            Data::Int(value) => value.to_string(),
            Data::Bool(true) => "TRUE".to_string(),
            Data::Bool(false) => "FALSE".to_string(),
            Data::DateTime(value) => value
                .as_datetime()
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| value.as_f64().to_string()),
        }
    }

    fn parse_range(range: &Range<Data>) -> Result<ParsedUpload, ParserError> {
        let (start_row, start_col) = range.start().ok_or_else(|| ParserError::EmptyInput {
            parser: Self::NAME,
            reason: "first worksheet has no cells".to_string(),
        })?;
        let end_col = range.end().map_or(start_col, |(_, col)| col);

        // The header is worksheet row 1 even when the used range starts lower;
        // columns stay relative to the used range so they line up with `rows()`.
        let header_cells: Vec<String> = (start_col..=end_col)
            .map(|col| {
                range
                    .get_value((Self::HEADER_ROW, col))
                    .map(Self::cell_text)
                    .unwrap_or_default()
            })
            .collect();
        let header_labels = normalize_header_labels(&header_cells);

        let header_map = HeaderMap::from_labels(&header_labels);
        let mut accumulator = RecordAccumulator::new(&header_map);

        for (offset, row) in range.rows().enumerate() {
            let sheet_row = start_row as usize + offset;
            if sheet_row == Self::HEADER_ROW as usize {
                continue;
            }
            let cells: Vec<String> = row.iter().map(Self::cell_text).collect();
            // Reported rows are 1-based worksheet rows.
            accumulator.push_row(sheet_row + 1, &cells);
        }

        Ok(accumulator.finish(SourceFormat::Spreadsheet, header_labels))
    }
}

impl TabularParser for SpreadsheetParser {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn format(&self) -> SourceFormat {
        SourceFormat::Spreadsheet
    }

    fn parse(&self, content: &[u8]) -> Result<ParsedUpload, ParserError> {
        let range = Self::first_worksheet(content)?;
        Self::parse_range(&range)
    }
}
