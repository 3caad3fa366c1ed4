//! FarmDaemon - farm cycle daemon
//!
//! CLI entry point for running the daemon and inspecting its configuration.

use std::fs;
use std::sync::Arc;

use clap::Parser;
use eyre::{Context, Result};
use tracing::{debug, info, warn};

use farmdaemon::cli::{Cli, Command, OutputFormat, get_log_path};
use farmdaemon::config::Config;
use farmdaemon::cycle::CycleSupervisor;
use farmdaemon::gateway::{FarmGateway, create_gateway};
use farmdaemon::report::Reporter;
use farmdaemon::status::StatusBoard;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level_str = cli_log_level.or(config_log_level);
    let level = if let Some(s) = level_str {
        match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        }
    } else {
        tracing::Level::INFO
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Plots { format }) => cmd_plots(&config, format),
        Some(Command::Check) => cmd_check(&config),
        Some(Command::Run) | None => cmd_run(&config).await,
    }
}

/// List the configured plots
fn cmd_plots(config: &Config, format: OutputFormat) -> Result<()> {
    debug!(?format, "cmd_plots: called");

    if config.plots.is_empty() {
        println!("No plots configured.");
        return Ok(());
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&config.plots)?);
        }
        OutputFormat::Text => {
            println!("{:<20} {:<20} {:<16} {:>12}", "PLOT", "GARDEN", "SEED", "GROWTH");
            println!("{}", "-".repeat(72));
            for plot in &config.plots {
                println!(
                    "{:<20} {:<20} {:<16} {:>11}s",
                    plot.plot_id,
                    plot.garden_id,
                    plot.seed_id,
                    plot.growth().as_secs()
                );
            }
        }
    }

    Ok(())
}

/// Validate configuration and credentials without starting the daemon
fn cmd_check(config: &Config) -> Result<()> {
    debug!("cmd_check: called");

    config.validate()?;
    config.farm.resolve().context("Failed to resolve farm credentials")?;

    println!("Configuration OK ({} plots)", config.plots.len());
    Ok(())
}

/// Run the daemon main loop
async fn cmd_run(config: &Config) -> Result<()> {
    debug!("cmd_run: called");
    info!("Daemon starting...");

    // Fail fast with clear error messages before spawning anything
    config.validate()?;
    let resolved = config.farm.resolve().context("Failed to resolve farm credentials")?;
    debug!("cmd_run: startup validation passed");

    let gateway: Arc<dyn FarmGateway> = create_gateway(&resolved).context("Failed to create farm gateway")?;
    info!(base_url = %resolved.base_url, "Farm gateway initialized");

    let board = StatusBoard::new();

    let reporter = Reporter::new(board.clone(), config.timing.report_interval());
    let reporter_handle = tokio::spawn(reporter.run());
    info!("Reporter started");

    let supervisor = CycleSupervisor::new(config.plots.clone(), config.timing.clone(), gateway, board);
    let (shutdown_tx, shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);
    let supervisor_handle = tokio::spawn(supervisor.run(shutdown_rx));
    info!(plot_count = config.plots.len(), "Supervisor started");

    info!("Daemon running. Press Ctrl+C to stop.");

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => {
                debug!("cmd_run: SIGINT received, initiating shutdown");
                warn!("SIGINT received");
            }
            _ = sigterm.recv() => {
                debug!("cmd_run: SIGTERM received, initiating shutdown");
                warn!("SIGTERM received");
            }
        }
        let _ = shutdown_tx.send(()).await;
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        debug!("cmd_run: ctrl_c received, initiating shutdown");
        let _ = shutdown_tx.send(()).await;
    }

    info!("Daemon shutting down...");

    // Wait for the supervisor to abort its engines
    let _ = supervisor_handle.await;
    debug!("cmd_run: supervisor finished");

    reporter_handle.abort();
    debug!("cmd_run: shutdown complete");
    Ok(())
}
