mod commands;
mod http;
mod tui;
mod ui;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::RwLock;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fleetmon_core::api::FleetApi;
use fleetmon_core::config::{ConfigError, DashboardConfig};
use fleetmon_core::model::ControlAction;
use fleetmon_core::poll::PollLoop;
use fleetmon_core::reducer::{EventSender, run_reducer};
use fleetmon_core::state::DashboardState;

use http::HttpFleetApi;

const DEFAULT_LOG_FILTER: &str = "fleetmon=info";

#[derive(Parser)]
#[command(name = "fleetmon")]
#[command(about = "Watch and control a fleet of cloud instances", long_about = None)]
struct Cli {
    /// Config file (defaults to fleetmon.yaml discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the status API base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Override the poll interval in milliseconds
    #[arg(long, global = true)]
    interval_ms: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Live dashboard (default)
    Tui,
    /// Print the fleet table once
    Status,
    /// Print an instance's console log
    Logs { instance: String },
    /// Print an instance's last hour of CPU and network samples
    Metrics { instance: String },
    Start { instance: String },
    Stop { instance: String },
}

/// Discovered or explicit config, with command-line overrides applied
fn resolve_config(cli: &Cli) -> anyhow::Result<(Option<PathBuf>, DashboardConfig)> {
    let (source, mut config) = match &cli.config {
        Some(path) => {
            let config = DashboardConfig::load(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            (Some(path.clone()), config)
        }
        None => {
            let cwd = std::env::current_dir()?;
            match DashboardConfig::discover(&cwd) {
                Ok((path, config)) => (Some(path), config),
                Err(ConfigError::NotFound { .. }) => (None, DashboardConfig::default()),
                Err(e) => return Err(e.into()),
            }
        }
    };

    if let Some(url) = &cli.api_url {
        config.api_url = url.trim_end_matches('/').to_string();
    }
    if let Some(ms) = cli.interval_ms {
        config.poll_interval_ms = ms;
    }
    config.validate()?;

    Ok((source, config))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn init_stderr_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// The TUI owns the terminal, so tracing goes to a file or nowhere
fn init_file_tracing(path: &Path) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (source, config) = resolve_config(&cli)?;

    match &cli.command {
        Some(Commands::Tui) | None => {
            if let Some(path) = &config.log_file {
                init_file_tracing(path)?;
            }
        }
        Some(_) => init_stderr_tracing(),
    }

    match &source {
        Some(path) => info!(path = %path.display(), "loaded config"),
        None => info!("no config file found, using defaults"),
    }

    let api: Arc<dyn FleetApi> =
        Arc::new(HttpFleetApi::new(&config.api_url, config.request_timeout())?);

    match cli.command {
        Some(Commands::Status) => commands::run_status(api).await,
        Some(Commands::Logs { instance }) => commands::run_logs(api, &instance).await,
        Some(Commands::Metrics { instance }) => commands::run_metrics(api, &instance).await,
        Some(Commands::Start { instance }) => {
            commands::run_control(api, &instance, ControlAction::Start).await
        }
        Some(Commands::Stop { instance }) => {
            commands::run_control(api, &instance, ControlAction::Stop).await
        }
        Some(Commands::Tui) | None => run_tui(api, &config).await,
    }
}

async fn run_tui(api: Arc<dyn FleetApi>, config: &DashboardConfig) -> anyhow::Result<()> {
    let state = Arc::new(RwLock::new(DashboardState::new(config.alert_duration())));
    let (events, rx) = EventSender::channel();

    let reducer = tokio::spawn(run_reducer(state.clone(), rx));

    let mut poller = PollLoop::new(api.clone(), events.clone(), config.poll_interval());
    poller.start();

    let mut terminal = tui::setup_terminal()?;
    let result = tui::tui_loop(
        &mut terminal,
        state,
        &poller,
        api,
        events,
        &config.api_url,
    )
    .await;
    tui::restore_terminal(terminal)?;

    poller.stop();
    reducer.abort();

    result?;
    Ok(())
}
