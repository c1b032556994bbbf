//! FareSight - terminal driver for the simulated pricing analytics engine
//!
//! Each subcommand mounts one view, drives it to completion and prints
//! what it produced:
//! - `dashboard`: headline stats, charts, refresh and analysis runs
//! - `health`: live metric ticks and service status
//! - `detect` / `export`: anomaly detection runs and CSV exports
//! - `sync`: data source synchronization
//! - `predict` / `forecast`: fare prediction and demand forecast
//! - `market`: popular routes over a reporting period
//! - `notifications`: the alert feed

use clap::{Parser, Subcommand};
use faresight_engine::FareSightConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

use commands::analytics::{DashboardArgs, MarketArgs};
use commands::anomalies::{DetectArgs, ExportArgs};
use commands::forecast::{ForecastArgs, PredictArgs};
use commands::health::HealthArgs;
use commands::notifications::NotificationsArgs;
use commands::sources::SyncArgs;
use commands::Session;
use output::{print_error, OutputFormat};

/// FareSight CLI
#[derive(Parser)]
#[command(name = "faresight")]
#[command(about = "FareSight - simulated pricing analytics engine", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "FARESIGHT_CONFIG")]
    config: Option<String>,

    /// Seed for reproducible runs
    #[arg(long, env = "FARESIGHT_SEED")]
    seed: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,

    /// Log level, overrides the configured one
    #[arg(long, env = "FARESIGHT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "FARESIGHT_LOG_JSON")]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the dashboard and its stats ticker
    Dashboard(DashboardArgs),

    /// Watch live system metrics
    Health(HealthArgs),

    /// Run anomaly detection
    Detect(DetectArgs),

    /// Sync all data sources
    Sync(SyncArgs),

    /// Predict a fare
    Predict(PredictArgs),

    /// Forecast demand over a date range
    Forecast(ForecastArgs),

    /// Popular routes over a date range
    Market(MarketArgs),

    /// List and manage notifications
    Notifications(NotificationsArgs),

    /// Export a CSV file
    Export(ExportArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = FareSightConfig::load(cli.config.as_deref())?;

    // Override with CLI args
    if let Some(seed) = cli.seed {
        config.random.seed = Some(seed);
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;
    if let Commands::Health(HealthArgs {
        interval_ms: Some(ms),
        ..
    }) = &cli.command
    {
        config.ticker.interval_ms = *ms;
    }
    if let Commands::Dashboard(DashboardArgs {
        interval_ms: Some(ms),
        ..
    }) = &cli.command
    {
        config.ticker.stats_interval_ms = *ms;
    }
    config.validate()?;

    // Initialize tracing; stdout is reserved for command output
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    tracing::debug!(seed = ?config.random.seed, "Configuration loaded");

    let mut session = Session::new(config, cli.output);
    let result = match cli.command {
        Commands::Dashboard(args) => commands::analytics::dashboard(args, &mut session).await,
        Commands::Health(args) => commands::health::execute(args, &mut session).await,
        Commands::Detect(args) => commands::anomalies::detect(args, &mut session).await,
        Commands::Sync(args) => commands::sources::execute(args, &mut session).await,
        Commands::Predict(args) => commands::forecast::predict(args, &mut session).await,
        Commands::Forecast(args) => commands::forecast::forecast(args, &mut session).await,
        Commands::Market(args) => commands::analytics::market(args, &mut session),
        Commands::Notifications(args) => commands::notifications::execute(args, &mut session),
        Commands::Export(args) => commands::anomalies::export(args, &mut session),
    };

    if let Err(e) = result {
        print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}
