use std::fmt;

use thiserror::Error;

/// Coarse classification of a failure, independent of which parser raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnsupportedFormat,
    EmptyInput,
    FieldParseFailure,
    UnexpectedIoFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnsupportedFormat => "unsupported_format",
            ErrorKind::EmptyInput => "empty_input",
            ErrorKind::FieldParseFailure => "field_parse_failure",
            ErrorKind::UnexpectedIoFailure => "unexpected_io_failure",
        }
    }

    /// True when the caller supplied something unusable, false for internal faults.
    pub fn is_bad_input(&self) -> bool {
        matches!(
            self,
            ErrorKind::UnsupportedFormat | ErrorKind::EmptyInput | ErrorKind::FieldParseFailure
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("unsupported file '{file_name}': expected a .csv, .xls or .xlsx upload")]
    UnsupportedFormat { file_name: String },

    #[error("{parser} input is empty: {reason}")]
    EmptyInput {
        parser: &'static str,
        reason: String,
    },

    #[error("{parser} CSV error: {source}")]
    Csv {
        parser: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("{parser} workbook could not be read: {source}")]
    Workbook {
        parser: &'static str,
        #[source]
        source: calamine::Error,
    },

    #[error("failed to read upload stream: {0}")]
    Io(#[from] std::io::Error),
}

impl ParserError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParserError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            ParserError::EmptyInput { .. } => ErrorKind::EmptyInput,
            ParserError::Csv { .. } | ParserError::Workbook { .. } | ParserError::Io(_) => {
                ErrorKind::UnexpectedIoFailure
            }
        }
    }
}
