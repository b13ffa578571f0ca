// crates/pricewindow-core/src/error.rs

use pricewindow_parser::{ErrorKind, ParserError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to parse upload '{file_name}': {source}")]
    Parse {
        file_name: String,
        #[source]
        source: ParserError,
    },

    #[error("File I/O error for '{file_name}': {source}")]
    Io {
        file_name: String,
        #[source]
        source: std::io::Error,
    },
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::Parse { source, .. } => source.kind(),
            IngestError::Io { .. } => ErrorKind::UnexpectedIoFailure,
        }
    }

    pub fn file_name(&self) -> &str {
        match self {
            IngestError::Parse { file_name, .. } | IngestError::Io { file_name, .. } => file_name,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file '{path}': {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, IngestError>;
