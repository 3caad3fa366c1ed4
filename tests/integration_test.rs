//! Integration tests for FarmDaemon
//!
//! These tests verify end-to-end behavior of the daemon components through
//! the public API, with a scripted gateway standing in for the farm service.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use farmdaemon::config::{Config, PlotConfig, TimingConfig};
use farmdaemon::cycle::CycleSupervisor;
use farmdaemon::domain::Phase;
use farmdaemon::gateway::{FarmGateway, Garden, GatewayError};
use farmdaemon::status::StatusBoard;
use tempfile::NamedTempFile;

// =============================================================================
// Test gateway
// =============================================================================

/// Gateway that reports no gardens and accepts every command
struct AcceptingGateway {
    plant_count: AtomicUsize,
    harvest_count: AtomicUsize,
}

impl AcceptingGateway {
    fn new() -> Self {
        Self {
            plant_count: AtomicUsize::new(0),
            harvest_count: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl FarmGateway for AcceptingGateway {
    async fn list_gardens(&self) -> Result<Vec<Garden>, GatewayError> {
        Ok(vec![])
    }

    async fn plant(&self, _garden_id: &str, plot_id: &str, _seed_id: &str) -> Result<String, GatewayError> {
        let n = self.plant_count.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{}-farming-{}", plot_id, n))
    }

    async fn harvest(&self, _farming_id: &str) -> Result<(), GatewayError> {
        self.harvest_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn plot(id: &str, growth_ms: u64) -> PlotConfig {
    PlotConfig {
        garden_id: "garden-1".to_string(),
        plot_id: id.to_string(),
        seed_id: "wheat".to_string(),
        growth_ms,
    }
}

fn fast_timing() -> TimingConfig {
    TimingConfig {
        poll_interval_ms: 10,
        settle_delay_ms: 1,
        stagger_delay_ms: 1,
        report_interval_ms: 10,
    }
}

// =============================================================================
// Supervisor + Engine Tests
// =============================================================================

#[tokio::test]
async fn test_daemon_cycles_plots_end_to_end() {
    let gateway = Arc::new(AcceptingGateway::new());
    let board = StatusBoard::new();
    let supervisor = CycleSupervisor::new(
        vec![plot("bed-1", 40), plot("bed-2", 40)],
        fast_timing(),
        gateway.clone(),
        board.clone(),
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::mpsc::channel(1);
    let handle = tokio::spawn(supervisor.run(shutdown_rx));

    // Long enough for several full grow/harvest/replant cycles
    tokio::time::sleep(Duration::from_millis(300)).await;

    let snapshot = board.snapshot();
    assert_eq!(snapshot.len(), 2, "both plots should have published status");
    for status in snapshot.values() {
        assert_ne!(status.phase, Phase::PlantFailed);
    }
    assert!(gateway.plant_count.load(Ordering::SeqCst) >= 2);
    assert!(gateway.harvest_count.load(Ordering::SeqCst) >= 1);

    shutdown_tx.send(()).await.expect("Should be able to send shutdown");
    let result = tokio::time::timeout(Duration::from_secs(5), handle).await;
    assert!(result.is_ok(), "Supervisor should shut down gracefully");
}

#[tokio::test]
async fn test_shutdown_before_any_activity() {
    let gateway = Arc::new(AcceptingGateway::new());
    let board = StatusBoard::new();
    let supervisor = CycleSupervisor::new(vec![plot("bed-1", 60_000)], fast_timing(), gateway, board);

    let (shutdown_tx, shutdown_rx) = tokio::sync::mpsc::channel(1);
    let handle = tokio::spawn(supervisor.run(shutdown_rx));

    shutdown_tx.send(()).await.expect("Should be able to send shutdown");
    let result = tokio::time::timeout(Duration::from_secs(5), handle).await;
    assert!(result.is_ok(), "Supervisor should shut down immediately");
}

// =============================================================================
// Config Tests
// =============================================================================

#[test]
fn test_config_load_from_file() {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(
        file,
        r#"
farm:
  token-env: INTEGRATION_FARM_TOKEN
  request-token-env: INTEGRATION_FARM_REQUEST_TOKEN

timing:
  poll-interval-ms: 1234

plots:
  - garden-id: garden-1
    plot-id: bed-1
    seed-id: wheat
    growth-ms: 120000
"#
    )
    .expect("Failed to write temp config");

    let path = file.path().to_path_buf();
    let config = Config::load(Some(&path)).expect("Failed to load config");

    assert_eq!(config.timing.poll_interval_ms, 1234);
    assert_eq!(config.plots.len(), 1);
    assert_eq!(config.plots[0].plot_id, "bed-1");
    // Unspecified fields fall back to defaults
    assert_eq!(config.timing.report_interval_ms, 25_000);
}

#[test]
fn test_config_load_missing_explicit_file_fails() {
    let path = std::path::PathBuf::from("/nonexistent/farmd-test.yml");
    assert!(Config::load(Some(&path)).is_err());
}

#[test]
fn test_config_validation_missing_token() {
    let mut config = Config::default();
    config.farm.token_env = "NONEXISTENT_INTEGRATION_TOKEN_12345".to_string();
    config.plots = vec![plot("bed-1", 1000)];

    let result = config.validate();

    assert!(result.is_err(), "Should fail without token");
    let err = result.unwrap_err().to_string();
    assert!(
        err.contains("NONEXISTENT_INTEGRATION_TOKEN_12345"),
        "Error should mention the env var"
    );
}

#[test]
fn test_config_validation_with_credentials() {
    // SAFETY: We're in a single-threaded test environment
    unsafe {
        std::env::set_var("INTEGRATION_OK_TOKEN", "t");
        std::env::set_var("INTEGRATION_OK_REQUEST_TOKEN", "r");
    }

    let mut config = Config::default();
    config.farm.token_env = "INTEGRATION_OK_TOKEN".to_string();
    config.farm.request_token_env = "INTEGRATION_OK_REQUEST_TOKEN".to_string();
    config.plots = vec![plot("bed-1", 1000)];

    let result = config.validate();

    // SAFETY: We're in a single-threaded test environment
    unsafe {
        std::env::remove_var("INTEGRATION_OK_TOKEN");
        std::env::remove_var("INTEGRATION_OK_REQUEST_TOKEN");
    }

    assert!(result.is_ok(), "Should pass with credentials set");
}
