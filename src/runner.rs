//! One extraction run.
//!
//! 1. Read the previous run marker
//! 2. Load identifiers from the input table
//! 3. Fetch and flatten each identifier, in order, one request at a time
//! 4. Write the output tables
//! 5. Store the new run marker
use crate::config::{Config, FailurePolicy};
use crate::errors::{AppError, ResultExt};
use crate::finstat_client::FinstatClient;
use crate::flatten::{flatten, FlatRecord, KEY_DELIMITER};
use crate::identifiers::{load_identifiers_from_path, resolve_input_path};
use crate::state::StateStore;
use crate::writer::{output_paths, write_results, BadIdentifier};
use chrono::{DateTime, Local};
use std::path::PathBuf;

/// Layout of the stored `last_update` marker.
pub const STATE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub success_path: PathBuf,
    pub failure_path: Option<PathBuf>,
}

pub async fn run<S: StateStore>(
    config: &Config,
    client: &FinstatClient,
    state: &mut S,
    started_at: DateTime<Local>,
) -> Result<RunSummary, AppError> {
    let previous = state.read_last_update()?;
    tracing::info!(
        "Previous update on: {}",
        previous.as_deref().unwrap_or(" ")
    );

    let input_path =
        resolve_input_path(config.input_path.as_deref(), &config.input_tables_dir())?;
    tracing::info!("Reading ICOs from {}", input_path.display());
    let icos = load_identifiers_from_path(&input_path)?;
    tracing::info!("Running .... {} ICOs to fetch", icos.len());

    let mut records: Vec<FlatRecord> = Vec::with_capacity(icos.len());
    let mut bad: Vec<BadIdentifier> = Vec::new();

    for (idx, ico) in icos.iter().enumerate() {
        tracing::info!(
            "[{}/{}] Getting Finstat data for ico : {}",
            idx + 1,
            icos.len(),
            ico
        );

        match client.fetch_detail(ico).await {
            Ok(detail) => records.push(flatten(&detail, KEY_DELIMITER)),
            Err(e) if e.is_per_identifier() => {
                tracing::warn!("✗ Error : ico {} failed: {}", ico, e);
                bad.push(BadIdentifier {
                    ico: ico.clone(),
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e).with_context(|| format!("Fetching ico {}", ico)),
        }
    }

    tracing::info!(
        "Fetched {} of {} ICOs ({} unavailable)",
        records.len(),
        icos.len(),
        bad.len()
    );

    let out_dir = config.output_tables_dir();
    std::fs::create_dir_all(&out_dir).map_err(|e| {
        AppError::OutputError(format!("Failed to create {}: {}", out_dir.display(), e))
    })?;
    let (success_path, bad_path) = output_paths(&out_dir, started_at);
    let failure_path = match config.failure_policy {
        FailurePolicy::Segregate => Some(bad_path),
        FailurePolicy::Drop => None,
    };

    write_results(&records, &bad, &success_path, failure_path.as_deref())?;

    let current = started_at.format(STATE_TIMESTAMP_FORMAT).to_string();
    state.write_last_update(&current)?;
    tracing::info!("Updating state to : {}", current);

    Ok(RunSummary {
        processed: icos.len(),
        succeeded: records.len(),
        failed: bad.len(),
        success_path,
        failure_path,
    })
}
