use crate::errors::AppError;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Header of the preferred identifier column.
pub const ICO_COLUMN: &str = "ico";

/// Reads ICO codes from a CSV table.
///
/// Uses the `ico` column when present, otherwise the first column. Values
/// are returned as read (row order, duplicates and leading zeros kept).
pub fn load_identifiers<R: Read>(source: R) -> Result<Vec<String>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::InputError(format!("Failed to read input header: {}", e)))?
        .clone();

    if headers.is_empty() {
        return Err(AppError::InputError("Input table has no columns".to_string()));
    }

    let column = headers.iter().position(|h| h == ICO_COLUMN).unwrap_or(0);
    tracing::debug!(
        "Reading identifiers from column '{}'",
        headers.get(column).unwrap_or_default()
    );

    let mut identifiers = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        let row = row.map_err(|e| {
            AppError::InputError(format!("Failed to read input row {}: {}", idx + 1, e))
        })?;
        identifiers.push(row.get(column).unwrap_or_default().to_string());
    }

    Ok(identifiers)
}

/// Opens `path` and reads its identifiers.
pub fn load_identifiers_from_path(path: &Path) -> Result<Vec<String>, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::InputError(format!(
            "Input ICO file {} is not accessible, make sure it is added in the input mapping: {}",
            path.display(),
            e
        ))
    })?;
    load_identifiers(file)
}

/// Picks the input table: the explicit path if given, otherwise the first
/// `*.csv` (by file name) in `tables_dir`.
pub fn resolve_input_path(
    explicit: Option<&Path>,
    tables_dir: &Path,
) -> Result<PathBuf, AppError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let not_found = || {
        AppError::InputError(
            "Input ICO file is not accessible, make sure it is added in the input mapping"
                .to_string(),
        )
    };

    let entries = std::fs::read_dir(tables_dir).map_err(|_| not_found())?;
    let mut tables: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
        })
        .collect();
    tables.sort();

    tables.into_iter().next().ok_or_else(not_found)
}
