use std::io::Read;
use std::path::Path;

use crate::errors::ParserError;
use crate::formats::{DelimitedParser, SpreadsheetParser};
use crate::model::{ParsedUpload, SourceFormat};

pub trait TabularParser {
    fn name(&self) -> &'static str;
    fn format(&self) -> SourceFormat;
    fn parse(&self, content: &[u8]) -> Result<ParsedUpload, ParserError>;
}

const DELIMITED_EXTENSIONS: &[&str] = &["csv"];
const SPREADSHEET_EXTENSIONS: &[&str] = &["xls", "xlsx"];

/// Classifies an upload by its file name suffix alone, before any bytes are read.
pub fn detect_format(file_name: &str) -> Result<SourceFormat, ParserError> {
    let extension = Path::new(file_name.trim())
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some(ext) if DELIMITED_EXTENSIONS.contains(&ext) => Ok(SourceFormat::DelimitedText),
        Some(ext) if SPREADSHEET_EXTENSIONS.contains(&ext) => Ok(SourceFormat::Spreadsheet),
        _ => Err(ParserError::UnsupportedFormat {
            file_name: file_name.to_string(),
        }),
    }
}

pub fn parser_for(format: SourceFormat) -> &'static dyn TabularParser {
    static DELIMITED: DelimitedParser = DelimitedParser;
    static SPREADSHEET: SpreadsheetParser = SpreadsheetParser;
    match format {
        SourceFormat::DelimitedText => &DELIMITED,
        SourceFormat::Spreadsheet => &SPREADSHEET,
    }
}

/// Parses an in-memory upload into canonical price records.
pub fn parse_upload(file_name: &str, content: &[u8]) -> Result<ParsedUpload, ParserError> {
    let format = detect_format(file_name)?;
    let parser = parser_for(format);
    if content.is_empty() {
        return Err(ParserError::EmptyInput {
            parser: parser.name(),
            reason: "upload contained no bytes".to_string(),
        });
    }
    parser.parse(content)
}

/// Reads `reader` to the end, then parses it like [`parse_upload`].
///
/// The format is checked first so that unsupported uploads are rejected
/// without consuming the stream.
pub fn parse_upload_reader<R: Read>(
    file_name: &str,
    mut reader: R,
) -> Result<ParsedUpload, ParserError> {
    detect_format(file_name)?;
    let mut content = Vec::new();
    reader.read_to_end(&mut content)?;
    parse_upload(file_name, &content)
}
