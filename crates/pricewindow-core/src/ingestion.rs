use std::collections::HashSet;
use std::path::Path;

use blake3::Hasher;
use chrono::NaiveDateTime;
use pricewindow_parser::{
    parse_upload, FieldIssue, HeaderMap, ParsedUpload, PriceRecord, RecordField, SourceFormat,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::IngestionSettings;
use crate::error::{IngestError, Result};

#[derive(Debug, Clone, Copy)]
pub struct UploadInput<'a> {
    pub file_name: &'a str,
    pub contents: &'a [u8],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Timeframe {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    pub file_name: String,
    pub hash: String,
    pub format: SourceFormat,
    pub row_count: usize,
    pub degraded_fields: usize,
    pub degraded_rows: usize,
    /// Canonical fields that no header column mapped onto.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<RecordField>,
    /// Earliest and latest parsed timestamps, ignoring sentinels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<Timeframe>,
}

#[derive(Debug, Clone)]
pub struct IngestedUpload {
    pub report: UploadReport,
    pub records: Vec<PriceRecord>,
    pub issues: Vec<FieldIssue>,
}

pub fn ingest_upload(input: UploadInput<'_>, settings: &IngestionSettings) -> Result<IngestedUpload> {
    let hash = compute_hash(input.contents);
    let parsed = parse_upload(input.file_name, input.contents).map_err(|source| {
        IngestError::Parse {
            file_name: input.file_name.to_string(),
            source,
        }
    })?;

    let report = build_report(input.file_name, hash, &parsed);
    log_upload(&report, &parsed.issues, settings);

    Ok(IngestedUpload {
        report,
        records: parsed.records,
        issues: parsed.issues,
    })
}

pub fn ingest_path(path: &Path, settings: &IngestionSettings) -> Result<IngestedUpload> {
    let file_name = path.display().to_string();
    let contents = std::fs::read(path).map_err(|source| IngestError::Io {
        file_name: file_name.clone(),
        source,
    })?;
    ingest_upload(
        UploadInput {
            file_name: &file_name,
            contents: &contents,
        },
        settings,
    )
}

fn build_report(file_name: &str, hash: String, parsed: &ParsedUpload) -> UploadReport {
    let header_map = HeaderMap::from_labels(&parsed.header);
    let missing_fields = [RecordField::Timestamp, RecordField::Value]
        .into_iter()
        .filter(|field| !header_map.maps(*field))
        .collect();

    UploadReport {
        file_name: file_name.to_string(),
        hash,
        format: parsed.format,
        row_count: parsed.records.len(),
        degraded_fields: parsed.issues.len(),
        degraded_rows: parsed.degraded_rows(),
        missing_fields,
        timeframe: timeframe(&parsed.records),
    }
}

fn timeframe(records: &[PriceRecord]) -> Option<Timeframe> {
    let mut timestamps = records
        .iter()
        .filter(|record| !record.has_sentinel_timestamp())
        .map(|record| record.timestamp);
    let first = timestamps.next()?;
    let (start, end) = timestamps.fold((first, first), |(start, end), ts| {
        (start.min(ts), end.max(ts))
    });
    Some(Timeframe { start, end })
}

fn log_upload(report: &UploadReport, issues: &[FieldIssue], settings: &IngestionSettings) {
    info!(
        file_name = %report.file_name,
        format = %report.format,
        rows = report.row_count,
        degraded_fields = report.degraded_fields,
        hash = %report.hash,
        "parsed upload"
    );

    if !report.missing_fields.is_empty() {
        let missing: Vec<&str> = report
            .missing_fields
            .iter()
            .map(|field| field.canonical_name())
            .collect();
        warn!(
            file_name = %report.file_name,
            missing = ?missing,
            "header does not map every canonical field; those fields will hold sentinel values"
        );
    }

    for issue in issues.iter().take(settings.issue_log_limit) {
        warn!(
            file_name = %report.file_name,
            row = issue.row,
            column = issue.column,
            field = %issue.field,
            raw = %issue.raw,
            "field degraded to sentinel"
        );
    }
    if issues.len() > settings.issue_log_limit {
        debug!(
            file_name = %report.file_name,
            suppressed = issues.len() - settings.issue_log_limit,
            "further degraded fields not logged individually"
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Duplicate,
    Parsed,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: String,
    pub hash: String,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload: Option<UploadReport>,
}

#[derive(Debug, Default)]
pub struct IngestionBatch {
    pub reports: Vec<FileReport>,
}

impl IngestionBatch {
    pub fn count(&self, status: FileStatus) -> usize {
        self.reports
            .iter()
            .filter(|report| report.status == status)
            .count()
    }
}

/// Ingests several uploads independently. A file whose content hash repeats an
/// earlier file of the same batch is reported as a duplicate and not parsed
/// again. A failing file never stops the rest of the batch.
pub fn ingest_files(inputs: &[UploadInput<'_>], settings: &IngestionSettings) -> IngestionBatch {
    let mut batch = IngestionBatch::default();
    let mut seen: HashSet<String> = HashSet::new();

    for input in inputs {
        let hash = compute_hash(input.contents);
        if seen.contains(&hash) {
            debug!(path = input.file_name, hash = %hash, "skipping duplicate upload");
            batch.reports.push(FileReport {
                path: input.file_name.to_string(),
                hash,
                status: FileStatus::Duplicate,
                error_kind: None,
                error: None,
                upload: None,
            });
            continue;
        }

        match ingest_upload(*input, settings) {
            Ok(upload) => {
                seen.insert(hash.clone());
                batch.reports.push(FileReport {
                    path: input.file_name.to_string(),
                    hash,
                    status: FileStatus::Parsed,
                    error_kind: None,
                    error: None,
                    upload: Some(upload.report),
                });
            }
            Err(err) => {
                warn!(path = input.file_name, error = %err, kind = %err.kind(), "upload failed");
                batch.reports.push(FileReport {
                    path: input.file_name.to_string(),
                    hash,
                    status: FileStatus::Failed,
                    error_kind: Some(err.kind().as_str()),
                    error: Some(err.to_string()),
                    upload: None,
                });
            }
        }
    }

    batch
}

pub fn compute_hash(contents: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(contents);
    let hash = hasher.finalize();
    hash.to_hex().to_string()
}
