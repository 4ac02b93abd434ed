//! Weather refresh CLI
//!
//! Batch driver for the fetch-or-cache weather service.

#![allow(clippy::print_stdout)]

mod batch;

use std::{path::PathBuf, sync::Arc};

use application::{WeatherService, WeatherSourcePort, WeatherStorePort};
use clap::{Parser, Subcommand};
use domain::LocationName;
use infrastructure::{AppConfig, LogFormat, SqliteWeatherStore, WeatherApiAdapter, create_pool};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Weather refresh CLI
#[derive(Parser)]
#[command(name = "weather-refresh")]
#[command(author, version, about = "Keeps cached weather readings fresh", long_about = None)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file (default: ./config.toml if present)
    #[arg(short, long, env = "WEATHER_REFRESH_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format, overrides the configured one
    #[arg(long)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh every configured location once
    Run,

    /// Look up a single location and print the reading as JSON
    ///
    /// Example: weather-refresh get "New York"
    Get {
        /// Location name
        location: String,
    },

    /// Print the configured API base URL and exit
    ShowConfig,
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// `RUST_LOG` wins over the verbosity flag
fn env_filter(verbose: u8) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_filter_from_verbosity(verbose)))
}

fn init_logging(verbose: u8, format: LogFormat) {
    let registry = tracing_subscriber::registry().with(env_filter(verbose));
    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

fn build_service(config: &AppConfig) -> anyhow::Result<WeatherService> {
    let threshold = config.freshness.threshold().ok_or_else(|| {
        anyhow::anyhow!(
            "freshness.threshold_minutes out of range: {}",
            config.freshness.threshold_minutes
        )
    })?;

    let pool = create_pool(&config.database)?;
    info!(path = %config.database.path, "Database ready");

    let store: Arc<dyn WeatherStorePort> =
        Arc::new(SqliteWeatherStore::new(Arc::new(pool), config.store_retry));
    let source: Arc<dyn WeatherSourcePort> =
        Arc::new(WeatherApiAdapter::new(&config.weather_api, config.api_retry)?);

    Ok(WeatherService::new(source, store, threshold))
}

/// Cancel the token on Ctrl-C
fn spawn_shutdown_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling");
            cancel.cancel();
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from(cli.config.as_deref())?;
    init_logging(cli.verbose, cli.log_format.unwrap_or(config.log_format));

    if matches!(cli.command, Commands::ShowConfig) {
        println!("API Base URL: {}", config.weather_api.base_url);
        return Ok(());
    }

    config.validate()?;

    info!(
        base_url = %config.weather_api.base_url,
        database = %config.database.path,
        threshold_minutes = config.freshness.threshold_minutes,
        "Configuration loaded"
    );

    let service = build_service(&config)?;
    let cancel = CancellationToken::new();
    spawn_shutdown_handler(cancel.clone());

    match cli.command {
        Commands::Run => {
            let locations = config.batch_locations()?;
            let summary = batch::run_batch(&service, &locations, &cancel).await;

            println!(
                "Refreshed {} location(s), {} failed, {} skipped",
                summary.succeeded, summary.failed, summary.skipped
            );
            if !summary.is_success() {
                std::process::exit(1);
            }
        },

        Commands::Get { location } => {
            let location = LocationName::new(location)?;
            let lookup = service.lookup(&location, &cancel).await?;
            println!("{}", serde_json::to_string_pretty(&lookup)?);
        },

        Commands::ShowConfig => {},
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_filter_verbosity_zero() {
        assert_eq!(log_filter_from_verbosity(0), "warn");
    }

    #[test]
    fn log_filter_verbosity_one() {
        assert_eq!(log_filter_from_verbosity(1), "info");
    }

    #[test]
    fn log_filter_verbosity_two() {
        assert_eq!(log_filter_from_verbosity(2), "debug");
    }

    #[test]
    fn log_filter_verbosity_three_or_more() {
        assert_eq!(log_filter_from_verbosity(3), "trace");
        assert_eq!(log_filter_from_verbosity(10), "trace");
    }

    #[test]
    fn cli_accepts_log_format_override() {
        let cli = Cli::try_parse_from(["weather-refresh", "--log-format", "json", "run"]).unwrap();
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        assert!(matches!(cli.command, Commands::Run));
    }

    #[test]
    fn cli_rejects_unknown_log_format() {
        let result = Cli::try_parse_from(["weather-refresh", "--log-format", "xml", "run"]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn build_service_uses_configured_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.database.path = dir.path().join("weather.db").to_string_lossy().into_owned();
        config.freshness.threshold_minutes = 15;

        let service = build_service(&config).unwrap();

        assert_eq!(service.freshness_threshold(), chrono::Duration::minutes(15));
    }

    #[tokio::test]
    async fn build_service_rejects_bad_base_url() {
        let mut config = AppConfig::default();
        config.database = infrastructure::DatabaseConfig::in_memory();
        config.weather_api.base_url = "not a url".to_string();

        assert!(build_service(&config).is_err());
    }

    #[test]
    fn build_service_rejects_oversized_threshold() {
        let mut config = AppConfig::default();
        config.database = infrastructure::DatabaseConfig::in_memory();
        config.freshness.threshold_minutes = i64::MAX;

        let err = build_service(&config).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }
}
