//! Output tables.
//!
//! Records are written with a header built from every key seen in the run,
//! in first-seen order, so all rows share one schema.

use crate::errors::{AppError, ResultExt};
use crate::flatten::FlatRecord;
use chrono::{DateTime, Local};
use indexmap::IndexSet;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Header of the unavailable identifier table.
pub const UNAVAILABLE_ICO_COLUMN: &str = "unavailable_ico";

/// An identifier the API could not serve.
#[derive(Debug, Clone, PartialEq)]
pub struct BadIdentifier {
    pub ico: String,
    pub reason: String,
}

/// Union of record keys, in the order they were first seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputColumnSet {
    columns: IndexSet<String>,
}

impl OutputColumnSet {
    pub fn from_records(records: &[FlatRecord]) -> Self {
        let columns = records
            .iter()
            .flat_map(FlatRecord::keys)
            .map(str::to_string)
            .collect();
        Self { columns }
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Renders `record` in column order, blank where a key is missing.
    pub fn row(&self, record: &FlatRecord) -> Vec<String> {
        self.columns
            .iter()
            .map(|col| record.get(col).map(|v| v.to_cell()).unwrap_or_default())
            .collect()
    }
}

/// Manifest the host environment reads next to each output table.
#[derive(Debug, Serialize)]
struct TableManifest {
    incremental: bool,
    primary_key: Vec<String>,
}

/// Output file names for a run started at `started_at`.
pub fn output_paths(dir: &Path, started_at: DateTime<Local>) -> (PathBuf, PathBuf) {
    let stamp = started_at.format("%Y-%m-%d-%H-%M-%S");
    (
        dir.join(format!("finstat-out-{}.csv", stamp)),
        dir.join(format!("finstat-bad-ico-out-{}.csv", stamp)),
    )
}

/// Writes the success table and, when `failure_path` is set, the table of
/// unavailable identifiers.
///
/// Fails with `EmptyResult` before touching the filesystem when no record
/// was produced.
pub fn write_results(
    records: &[FlatRecord],
    bad: &[BadIdentifier],
    success_path: &Path,
    failure_path: Option<&Path>,
) -> Result<(), AppError> {
    if records.is_empty() {
        return Err(AppError::EmptyResult { failed: bad.len() });
    }

    let columns = OutputColumnSet::from_records(records);
    write_records(&columns, records, success_path)
        .with_context(|| format!("Failed to write {}", success_path.display()))?;
    write_table_manifest(success_path)?;
    tracing::info!(
        "Wrote {} records with {} columns to {}",
        records.len(),
        columns.len(),
        success_path.display()
    );

    if let Some(path) = failure_path {
        write_bad_identifiers(bad, path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        write_table_manifest(path)?;
        tracing::info!("Wrote {} unavailable icos to {}", bad.len(), path.display());
    }

    Ok(())
}

fn write_records(
    columns: &OutputColumnSet,
    records: &[FlatRecord],
    path: &Path,
) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(columns.columns())?;
    for record in records {
        writer.write_record(columns.row(record))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::OutputError(e.to_string()))
}

fn write_bad_identifiers(bad: &[BadIdentifier], path: &Path) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([UNAVAILABLE_ICO_COLUMN])?;
    for item in bad {
        writer.write_record([item.ico.as_str()])?;
    }
    writer
        .flush()
        .map_err(|e| AppError::OutputError(e.to_string()))
}

/// Writes `<table>.manifest` next to `table`.
pub fn write_table_manifest(table: &Path) -> Result<(), AppError> {
    let mut manifest_path = table.as_os_str().to_owned();
    manifest_path.push(".manifest");

    let manifest = TableManifest {
        incremental: false,
        primary_key: Vec::new(),
    };
    let content = serde_json::to_string(&manifest)
        .map_err(|e| AppError::OutputError(format!("Failed to encode manifest: {}", e)))?;
    std::fs::write(&manifest_path, content).map_err(|e| {
        AppError::OutputError(format!(
            "Failed to write manifest {}: {}",
            Path::new(&manifest_path).display(),
            e
        ))
    })
}
