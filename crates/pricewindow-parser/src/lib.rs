pub mod errors;
pub mod formats;
pub mod model;
mod registry;

pub use errors::{ErrorKind, ParserError};
pub use formats::{normalize_timestamp, parse_decimal, parse_timestamp, HeaderMap};
pub use model::{
    sentinel_timestamp, FieldIssue, ParsedUpload, PriceRecord, RecordField, SourceFormat,
};
pub use registry::{detect_format, parse_upload, parse_upload_reader, parser_for, TabularParser};
