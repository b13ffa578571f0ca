use std::collections::HashMap;
use std::str::FromStr;

use once_cell::sync::Lazy;
use rust_decimal::Decimal;

use crate::model::{
    sentinel_timestamp, FieldIssue, ParsedUpload, PriceRecord, RecordField, SourceFormat,
};

use super::timestamp::parse_timestamp;

static HEADER_ALIASES: Lazy<HashMap<&'static str, RecordField>> = Lazy::new(|| {
    HashMap::from([
        ("Date", RecordField::Timestamp),
        ("Market Price EX1", RecordField::Value),
    ])
});

/// Looks up a single header label in the alias table.
pub fn resolve_header(label: &str) -> Option<RecordField> {
    HEADER_ALIASES.get(normalize_label(label)).copied()
}

fn normalize_label(label: &str) -> &str {
    label.trim_start_matches('\u{feff}').trim()
}

/// Positional mapping from source column index to canonical field.
///
/// Columns whose label is not in the alias table are left unmapped and
/// ignored by the record parsers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    columns: Vec<Option<RecordField>>,
}

impl HeaderMap {
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let columns = labels
            .into_iter()
            .map(|label| resolve_header(label.as_ref()))
            .collect();
        Self { columns }
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn field_at(&self, column: usize) -> Option<RecordField> {
        self.columns.get(column).copied().flatten()
    }

    pub fn mapped(&self) -> impl Iterator<Item = (usize, RecordField)> + '_ {
        self.columns
            .iter()
            .enumerate()
            .filter_map(|(idx, field)| field.map(|field| (idx, field)))
    }

    pub fn maps(&self, field: RecordField) -> bool {
        self.columns.iter().any(|mapped| *mapped == Some(field))
    }

    pub fn is_unmapped(&self) -> bool {
        self.mapped().next().is_none()
    }
}

/// Locale-invariant base-10 decoding; accepts an optional sign and exponent.
pub fn parse_decimal(value: &str) -> Option<Decimal> {
    let trimmed = value.trim();
    // `Decimal::from_str` skips `_` digit separators.
    if trimmed.is_empty() || trimmed.contains('_') {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

pub(crate) fn normalize_header_labels<S: AsRef<str>>(labels: &[S]) -> Vec<String> {
    labels
        .iter()
        .map(|label| normalize_label(label.as_ref()).to_string())
        .collect()
}

/// Accumulates one [`PriceRecord`] per data row, degrading bad cells to
/// sentinels and remembering each degradation as a [`FieldIssue`].
pub(crate) struct RecordAccumulator<'a> {
    header: &'a HeaderMap,
    records: Vec<PriceRecord>,
    issues: Vec<FieldIssue>,
}

impl<'a> RecordAccumulator<'a> {
    pub fn new(header: &'a HeaderMap) -> Self {
        Self {
            header,
            records: Vec::new(),
            issues: Vec::new(),
        }
    }

    /// Decodes one row. Returns `false` when every cell is blank and the row
    /// was skipped.
    pub fn push_row<S: AsRef<str>>(&mut self, row: usize, cells: &[S]) -> bool {
        if cells.iter().all(|cell| cell.as_ref().trim().is_empty()) {
            return false;
        }

        let mut record = PriceRecord::default();
        for (column, field) in self.header.mapped() {
            let raw = cells.get(column).map(|cell| cell.as_ref().trim()).unwrap_or("");
            match field {
                RecordField::Timestamp => match parse_timestamp(raw) {
                    Some(timestamp) => record.timestamp = timestamp,
                    None => {
                        record.timestamp = sentinel_timestamp();
                        self.push_issue(row, column, field, raw);
                    }
                },
                RecordField::Value => match parse_decimal(raw) {
                    Some(value) => record.value = value,
                    None => {
                        record.value = Decimal::ZERO;
                        self.push_issue(row, column, field, raw);
                    }
                },
            }
        }

        self.records.push(record);
        true
    }

    fn push_issue(&mut self, row: usize, column: usize, field: RecordField, raw: &str) {
        self.issues.push(FieldIssue {
            row,
            column,
            field,
            raw: raw.to_string(),
        });
    }

    pub fn finish(self, format: SourceFormat, header: Vec<String>) -> ParsedUpload {
        ParsedUpload {
            format,
            header,
            records: self.records,
            issues: self.issues,
        }
    }
}
