use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{presets::UTF8_FULL, Table};
use pricewindow_core::analytics::{is_chronological, sort_chronologically, summarize, PriceSummary};
use pricewindow_core::config::Settings;
use pricewindow_core::ingestion::{
    ingest_files, ingest_path, FileStatus, IngestedUpload, UploadInput, UploadReport,
};
use pricewindow_parser::PriceRecord;
use serde::Serialize;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Ingest market price uploads and find their most expensive half hour pair.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Settings file (TOML). Falls back to $PRICEWINDOW_CONFIG, then defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse one upload and print its records.
    Parse {
        file: PathBuf,
        #[arg(long)]
        pretty: bool,
        #[arg(long, value_enum, default_value_t = RecordFormat::Json)]
        format: RecordFormat,
    },
    /// Print summary statistics and the most expensive window of one upload.
    Stats {
        file: PathBuf,
        /// Analyse records in file order instead of sorting by timestamp.
        #[arg(long)]
        keep_order: bool,
        #[arg(long)]
        json: bool,
    },
    /// Ingest every file matching a glob pattern, skipping identical content.
    Batch {
        pattern: String,
        #[arg(long)]
        json: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum RecordFormat {
    Json,
    Csv,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let settings = Settings::resolve(cli.config.as_deref()).context("failed to load settings")?;

    match cli.command {
        Commands::Parse {
            file,
            pretty,
            format,
        } => {
            let upload = ingest(&file, &settings)?;
            match format {
                RecordFormat::Json => {
                    print_json(&upload.records, pretty || settings.output.pretty_json)?
                }
                RecordFormat::Csv => write_records_csv(&upload.records)?,
            }
        }
        Commands::Stats {
            file,
            keep_order,
            json,
        } => {
            let mut upload = ingest(&file, &settings)?;
            if !keep_order && settings.analytics.sort_by_timestamp {
                if !is_chronological(&upload.records) {
                    info!(file = %file.display(), "sorting records chronologically");
                }
                sort_chronologically(&mut upload.records);
            } else if !is_chronological(&upload.records) {
                warn!(
                    file = %file.display(),
                    "records are not in chronological order; windows follow file order"
                );
            }

            let summary = summarize(&upload.records);
            if json {
                let output = StatsOutput {
                    upload: &upload.report,
                    summary: &summary,
                };
                print_json(&output, settings.output.pretty_json)?;
            } else {
                print_stats_table(&upload.report, &summary);
            }
        }
        Commands::Batch { pattern, json } => run_batch(&pattern, json, &settings)?,
    }

    Ok(())
}

#[derive(Serialize)]
struct StatsOutput<'a> {
    upload: &'a UploadReport,
    summary: &'a PriceSummary,
}

fn ingest(file: &std::path::Path, settings: &Settings) -> Result<IngestedUpload> {
    ingest_path(file, &settings.ingestion)
        .map_err(|err| {
            if err.kind().is_bad_input() {
                warn!(file = err.file_name(), kind = %err.kind(), "upload rejected");
            } else {
                error!(file = err.file_name(), kind = %err.kind(), "internal failure while ingesting upload");
            }
            err
        })
        .with_context(|| format!("failed to ingest {}", file.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{rendered}");
    Ok(())
}

fn write_records_csv(records: &[PriceRecord]) -> Result<()> {
    let stdout = io::stdout();
    let mut writer = csv::Writer::from_writer(stdout.lock());
    writer.write_record(["timestamp", "value"])?;
    for record in records {
        writer.write_record([
            record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            record.value.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn print_stats_table(report: &UploadReport, summary: &PriceSummary) {
    let stats = &summary.statistics;
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Metric", "Value"]);
    table.add_row(vec!["File".to_string(), report.file_name.clone()]);
    table.add_row(vec!["Format".to_string(), report.format.to_string()]);
    table.add_row(vec!["Records".to_string(), stats.count.to_string()]);
    table.add_row(vec![
        "Degraded fields".to_string(),
        report.degraded_fields.to_string(),
    ]);
    table.add_row(vec!["Minimum".to_string(), stats.minimum.to_string()]);
    table.add_row(vec!["Maximum".to_string(), stats.maximum.to_string()]);
    table.add_row(vec!["Average".to_string(), stats.average.to_string()]);

    match &summary.most_expensive_window {
        Some(window) => {
            table.add_row(vec![
                "Window start".to_string(),
                format!(
                    "{} ({})",
                    window.left.timestamp.format(TIMESTAMP_FORMAT),
                    window.left.value
                ),
            ]);
            table.add_row(vec![
                "Window end".to_string(),
                format!(
                    "{} ({})",
                    window.right.timestamp.format(TIMESTAMP_FORMAT),
                    window.right.value
                ),
            ]);
            table.add_row(vec![
                "Window total".to_string(),
                window.combined_value.to_string(),
            ]);
            table.add_row(vec![
                "Window difference".to_string(),
                window.price_difference.to_string(),
            ]);
        }
        None => {
            table.add_row(vec![
                "Window".to_string(),
                "needs at least two records".to_string(),
            ]);
        }
    }

    println!("{table}");
}

fn run_batch(pattern: &str, json: bool, settings: &Settings) -> Result<()> {
    let mut files: Vec<(String, Vec<u8>)> = Vec::new();
    let mut unreadable = 0usize;

    for entry in glob::glob(pattern).with_context(|| format!("invalid glob pattern {pattern}"))? {
        let path = match entry {
            Ok(path) => path,
            Err(err) => {
                warn!(error = %err, "could not read path from glob pattern");
                unreadable += 1;
                continue;
            }
        };
        if !path.is_file() {
            continue;
        }
        match std::fs::read(&path) {
            Ok(contents) => files.push((path.display().to_string(), contents)),
            Err(err) => {
                warn!(file = %path.display(), error = %err, "failed to read file");
                unreadable += 1;
            }
        }
    }

    let inputs: Vec<UploadInput<'_>> = files
        .iter()
        .map(|(name, contents)| UploadInput {
            file_name: name,
            contents,
        })
        .collect();
    let batch = ingest_files(&inputs, &settings.ingestion);

    info!(
        pattern,
        parsed = batch.count(FileStatus::Parsed),
        duplicates = batch.count(FileStatus::Duplicate),
        failed = batch.count(FileStatus::Failed),
        unreadable,
        "batch finished"
    );

    if json {
        return print_json(&batch.reports, settings.output.pretty_json);
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["File", "Status", "Records", "Degraded", "Detail"]);
    for report in &batch.reports {
        let (records, degraded) = match &report.upload {
            Some(upload) => (
                upload.row_count.to_string(),
                upload.degraded_fields.to_string(),
            ),
            None => (String::new(), String::new()),
        };
        let status = match report.status {
            FileStatus::Parsed => "parsed",
            FileStatus::Duplicate => "duplicate",
            FileStatus::Failed => "failed",
        };
        let detail = report
            .error
            .clone()
            .unwrap_or_else(|| report.hash.chars().take(12).collect());
        table.add_row(vec![
            report.path.clone(),
            status.to_string(),
            records,
            degraded,
            detail,
        ]);
    }

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{table}")?;
    Ok(())
}
