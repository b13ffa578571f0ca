use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ErrorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    DelimitedText,
    Spreadsheet,
}

impl SourceFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::DelimitedText => "delimited_text",
            SourceFormat::Spreadsheet => "spreadsheet",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical fields a source column can be mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    Timestamp,
    Value,
}

impl RecordField {
    pub fn canonical_name(&self) -> &'static str {
        match self {
            RecordField::Timestamp => "timestamp",
            RecordField::Value => "value",
        }
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Timestamp substituted when a date cell cannot be parsed: `0001-01-01T00:00:00`.
pub fn sentinel_timestamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .unwrap_or(NaiveDate::MIN)
        .and_time(NaiveTime::MIN)
}

/// One normalized price observation.
///
/// Both fields always carry a value; unparseable cells hold the sentinel
/// timestamp or zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub timestamp: NaiveDateTime,
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
}

impl PriceRecord {
    pub fn new(timestamp: NaiveDateTime, value: Decimal) -> Self {
        Self { timestamp, value }
    }

    pub fn has_sentinel_timestamp(&self) -> bool {
        self.timestamp == sentinel_timestamp()
    }
}

impl Default for PriceRecord {
    fn default() -> Self {
        Self {
            timestamp: sentinel_timestamp(),
            value: Decimal::ZERO,
        }
    }
}

/// A cell that could not be decoded and was replaced by its sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    /// 1-based line (delimited) or row (spreadsheet) number in the source.
    pub row: usize,
    /// 0-based column position.
    pub column: usize,
    pub field: RecordField,
    /// Trimmed cell text; empty when the cell was blank or the row was shorter
    /// than the header.
    pub raw: String,
}

impl FieldIssue {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::FieldParseFailure
    }

    pub fn is_blank_cell(&self) -> bool {
        self.raw.is_empty()
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.raw.is_empty() {
            write!(
                f,
                "row {} column {}: missing {} value",
                self.row, self.column, self.field
            )
        } else {
            write!(
                f,
                "row {} column {}: could not parse {} from '{}'",
                self.row, self.column, self.field, self.raw
            )
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParsedUpload {
    pub format: SourceFormat,
    /// Header labels, trimmed, in source column order.
    pub header: Vec<String>,
    pub records: Vec<PriceRecord>,
    pub issues: Vec<FieldIssue>,
}

impl ParsedUpload {
    pub fn degraded_rows(&self) -> usize {
        let mut rows: Vec<usize> = self.issues.iter().map(|issue| issue.row).collect();
        rows.dedup();
        rows.len()
    }
}
