mod common;
mod delimited;
mod spreadsheet;
mod timestamp;

pub use common::{parse_decimal, resolve_header, HeaderMap};
pub use delimited::DelimitedParser;
pub use spreadsheet::SpreadsheetParser;
pub use timestamp::{normalize_timestamp, parse_timestamp};
