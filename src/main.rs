use clap::Parser;
use finstat_extractor::config::{Config, Parameters};
use finstat_extractor::errors::AppError;
use finstat_extractor::finstat_client::FinstatClient;
use finstat_extractor::runner;
use finstat_extractor::state::FileStateStore;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Host data directory holding `config.json`, `in/` and `out/`.
    #[arg(long, env = "KBC_DATADIR", default_value = "data")]
    data_dir: PathBuf,

    /// Input table; defaults to the first CSV in `<data-dir>/in/tables`.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Enables debug logging.
    #[arg(short, long)]
    debug: bool,
}

fn init_tracing(debug: bool) {
    let default_filter = if debug {
        "finstat_extractor=debug"
    } else {
        "finstat_extractor=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Main entry point for the extractor.
///
/// Loads parameters first so a `debug` parameter can raise the log level,
/// then validates the configuration and runs the extraction. Every failure
/// surfaces here and is mapped to the process exit code.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let params = Parameters::load(&cli.data_dir);
    let debug = cli.debug
        || params
            .as_ref()
            .ok()
            .and_then(|p| p.debug)
            .unwrap_or(false);
    init_tracing(debug);

    tracing::info!("Running version {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Loading configuration...");

    match execute(cli, params).await {
        Ok(summary) => {
            tracing::info!(
                "✓ Run finished: {} processed, {} succeeded, {} unavailable",
                summary.processed,
                summary.succeeded,
                summary.failed
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn execute(
    cli: Cli,
    params: Result<Parameters, AppError>,
) -> Result<runner::RunSummary, AppError> {
    let mut config = Config::from_parameters(params?, cli.data_dir.clone())?;
    config.input_path = cli.input;
    config.log_summary();

    let client = FinstatClient::new(&config)?;
    let mut state = FileStateStore::new(&config.data_dir);

    runner::run(&config, &client, &mut state, chrono::Local::now()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use finstat_extractor::errors::EXIT_USER_ERROR;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["finstat-extractor"]);
        assert!(!cli.debug);
        assert!(cli.input.is_none());
    }

    #[tokio::test]
    async fn test_missing_configuration_is_user_error() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::parse_from([
            "finstat-extractor",
            "--data-dir",
            dir.path().to_str().unwrap(),
        ]);

        let err = execute(cli, Ok(Parameters::default())).await.unwrap_err();
        assert_eq!(err.exit_code(), EXIT_USER_ERROR);
    }
}
