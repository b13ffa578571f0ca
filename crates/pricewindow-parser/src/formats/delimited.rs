use csv::ByteRecord;

use crate::errors::ParserError;
use crate::model::{ParsedUpload, SourceFormat};
use crate::registry::TabularParser;

use super::common::{normalize_header_labels, HeaderMap, RecordAccumulator};

/// Comma-separated text with a single header line.
///
/// Quoting is disabled, so a value containing a comma shifts the remaining
/// columns. Rows may be shorter or longer than the header.
pub struct DelimitedParser;

impl Default for DelimitedParser {
    fn default() -> Self {
        Self
    }
}

impl DelimitedParser {
    const NAME: &'static str = "DELIMITED";

    fn csv_error(source: csv::Error) -> ParserError {
        ParserError::Csv {
            parser: Self::NAME,
            source,
        }
    }

    /// Invalid UTF-8 is replaced per cell so it only spoils that cell.
    fn decode_cells(record: &ByteRecord) -> Vec<String> {
        record
            .iter()
            .map(|cell| String::from_utf8_lossy(cell).into_owned())
            .collect()
    }

    fn is_blank(cells: &[String]) -> bool {
        cells.iter().all(|cell| cell.trim().is_empty())
    }

    /// 1-based line number of `record` within `content`.
    ///
    /// The reader stamps a record with the offset where it started looking,
    /// which sits before any skipped blank lines and before the `\n` of a
    /// preceding `\r\n`. Those terminator bytes are stepped over first.
    fn line_number(content: &[u8], record: &ByteRecord) -> usize {
        let start = record
            .position()
            .map(|pos| pos.byte() as usize)
            .unwrap_or(0)
            .min(content.len());
        let first_byte = content[start..]
            .iter()
            .position(|byte| *byte != b'\n' && *byte != b'\r')
            .map_or(content.len(), |skipped| start + skipped);
        content[..first_byte]
            .iter()
            .filter(|byte| **byte == b'\n')
            .count()
            + 1
    }
}

impl TabularParser for DelimitedParser {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn format(&self) -> SourceFormat {
        SourceFormat::DelimitedText
    }

    fn parse(&self, content: &[u8]) -> Result<ParsedUpload, ParserError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(content);
        let mut records = reader.byte_records();

        let mut header_labels = None;
        for record in records.by_ref() {
            let cells = Self::decode_cells(&record.map_err(Self::csv_error)?);
            if !Self::is_blank(&cells) {
                header_labels = Some(normalize_header_labels(&cells));
                break;
            }
        }
        let header_labels = header_labels.ok_or_else(|| ParserError::EmptyInput {
            parser: Self::NAME,
            reason: "file has no header line".to_string(),
        })?;

        let header_map = HeaderMap::from_labels(&header_labels);
        let mut accumulator = RecordAccumulator::new(&header_map);

        for record in records {
            let record = record.map_err(Self::csv_error)?;
            let cells = Self::decode_cells(&record);
            accumulator.push_row(Self::line_number(content, &record), &cells);
        }

        Ok(accumulator.finish(SourceFormat::DelimitedText, header_labels))
    }
}
