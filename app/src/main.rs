// In app/src/main.rs

use anyhow::{Context, Result};
use app_config::{Settings, DEFAULT_CONFIG_PATH};
use clap::{Parser, Subcommand};
use core_types::{Clock, SystemClock};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

mod tracing_layer;
use self::tracing_layer::FileLogLayer;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "Forwards trading terminal account state to the ingestion API.")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// Polls every enabled account until interrupted (default).
    Run,

    /// Runs a single poll cycle and exits.
    Once,

    /// Loads and validates the configuration, then prints a redacted summary.
    CheckConfig,
}

/// What the logging setup needs from the settings.
struct LogOptions {
    level: Option<tracing::Level>,
    configured_level: String,
    file: Option<PathBuf>,
}

impl LogOptions {
    fn from_settings(settings: &Settings) -> Self {
        Self {
            level: settings.general.parsed_log_level(),
            configured_level: settings.general.log_level.clone(),
            file: settings.general.log_file.as_ref().map(PathBuf::from),
        }
    }
}

// --- Main Application Entry Point ---

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Configuration problems are fatal before anything runs.
    let settings = app_config::load_settings(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;

    init_tracing(&LogOptions::from_settings(&settings))?;
    tracing::info!(config = %cli.config.display(), "Starting terminal bridge.");
    for adjustment in &settings.adjustments {
        tracing::warn!(%adjustment, "Configuration value adjusted.");
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_forever(&settings, &cli.config).await?,
        Commands::Once => run_once(&settings).await?,
        Commands::CheckConfig => check_config(&settings),
    }

    Ok(())
}

/// Installs the console layer and, when configured, the file layer.
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(options: &LogOptions) -> Result<()> {
    let level = options.level.unwrap_or(tracing::Level::INFO);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let file_layer = match &options.file {
        Some(path) => Some(
            FileLogLayer::open(path).with_context(|| format!("failed to open log file {}", path.display()))?,
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    if options.level.is_none() {
        tracing::warn!(configured = %options.configured_level, "Invalid log level; using INFO.");
    }
    Ok(())
}

// --- "Run" Subcommand Logic ---

/// Polls until Ctrl-C. Push and terminal failures never end the loop.
/// Accounts are re-read from `config_path` before every cycle.
async fn run_forever(settings: &Settings, config_path: &Path) -> Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut poller = engine::build_gateway_poller(settings, clock)?.with_accounts_file(config_path);

    if poller.enabled_accounts() == 0 {
        tracing::warn!("No enabled accounts in configuration; waiting for one to be enabled.");
    }

    tokio::select! {
        cycles = poller.run(|_| false) => {
            tracing::error!(cycles, "Poll loop ended unexpectedly.");
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for shutdown signal")?;
            tracing::info!("Shutdown signal received; stopping.");
        }
    }

    Ok(())
}

// --- "Once" Subcommand Logic ---

async fn run_once(settings: &Settings) -> Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut poller = engine::build_gateway_poller(settings, clock)?;

    let report = poller.run_cycle().await;
    for account in &report.accounts {
        tracing::info!(
            account_id = account.trading_account_id,
            login = account.login,
            session_opened = account.session_opened,
            live_pushed = ?account.live_pushed,
            closed_trades = account.closed_trades,
            closed_pushed = ?account.closed_pushed,
            skipped_deals = account.skipped_deals,
            "Account summary."
        );
    }

    Ok(())
}

// --- "Check-Config" Subcommand Logic ---

fn check_config(settings: &Settings) {
    let general = &settings.general;
    println!("Configuration OK");
    println!("  api_base_url:      {}", general.api_base_url);
    println!("  poll interval:     {}s", general.poll_interval().as_secs());
    println!("  lookback:          {}h", general.lookback_hours_closed_trades);
    println!("  retries:           {} x {}s", general.max_retries, general.retry_delay_secs);
    println!("  tls verification:  {}", if general.disable_ssl_verification { "off" } else { "on" });
    println!("  terminal gateway:  {}", settings.terminal.gateway_url);
    for account in &settings.accounts {
        println!(
            "  account {:>6} login {:>10} server {} [{}]",
            account.trading_account_id,
            account.login,
            account.server,
            if account.enabled { "enabled" } else { "disabled" },
        );
    }
}
