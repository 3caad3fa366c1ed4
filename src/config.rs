//! FarmDaemon configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::gateway::GatewayError;

/// Main FarmDaemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote farm service configuration
    pub farm: FarmConfig,

    /// Cycle timing configuration
    pub timing: TimingConfig,

    /// Plots managed by this daemon
    pub plots: Vec<PlotConfig>,

    /// Log level when not overridden on the CLI
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks credentials, the plot set, and growth durations. Call this
    /// early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        if std::env::var(&self.farm.token_env).is_err() {
            return Err(eyre::eyre!(
                "Farm API token not found. Set the {} environment variable.",
                self.farm.token_env
            ));
        }
        if std::env::var(&self.farm.request_token_env).is_err() {
            return Err(eyre::eyre!(
                "Farm request token not found. Set the {} environment variable.",
                self.farm.request_token_env
            ));
        }

        if self.plots.is_empty() {
            return Err(eyre::eyre!("No plots configured. Add at least one entry under 'plots'."));
        }

        let mut seen = HashSet::new();
        for plot in &self.plots {
            if !seen.insert(&plot.plot_id) {
                return Err(eyre::eyre!("Duplicate plot id: {}", plot.plot_id));
            }
            if plot.growth_ms == 0 {
                return Err(eyre::eyre!("Plot {} has growth-ms of 0; must be positive", plot.plot_id));
            }
        }

        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .farmd.yml
        let local_config = PathBuf::from(".farmd.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/farmd/farmd.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("farmd").join("farmd.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Best-effort read of just the log level from the config file
    ///
    /// Runs before logging is initialized, so nothing is reported here;
    /// an unreadable or unparseable file yields `None` and the full
    /// [`Config::load`] surfaces the problem afterwards.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let path = match config_path {
            Some(path) => path.clone(),
            None => {
                let local = PathBuf::from(".farmd.yml");
                if local.exists() {
                    local
                } else {
                    dirs::config_dir()
                        .map(|dir| dir.join("farmd").join("farmd.yml"))
                        .filter(|path| path.exists())?
                }
            }
        };

        let content = fs::read_to_string(path).ok()?;
        let config: Config = serde_yaml::from_str(&content).ok()?;
        config.log_level
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Remote farm service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FarmConfig {
    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Environment variable containing the bearer token
    #[serde(rename = "token-env")]
    pub token_env: String,

    /// Environment variable containing the per-request token id
    #[serde(rename = "request-token-env")]
    pub request_token_env: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://chainers.io/api/farm".to_string(),
            token_env: "FARM_TOKEN".to_string(),
            request_token_env: "FARM_REQUEST_TOKEN".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl FarmConfig {
    /// Resolve credentials from the environment
    ///
    /// Done once at startup so the gateway never touches the environment.
    pub fn resolve(&self) -> Result<ResolvedFarmConfig, GatewayError> {
        let token = std::env::var(&self.token_env).map_err(|_| GatewayError::Credential(self.token_env.clone()))?;
        let request_token = std::env::var(&self.request_token_env)
            .map_err(|_| GatewayError::Credential(self.request_token_env.clone()))?;

        Ok(ResolvedFarmConfig {
            base_url: self.base_url.clone(),
            token,
            request_token,
            timeout_ms: self.timeout_ms,
        })
    }
}

/// Farm configuration with credentials resolved
#[derive(Debug, Clone)]
pub struct ResolvedFarmConfig {
    pub base_url: String,
    pub token: String,
    pub request_token: String,
    pub timeout_ms: u64,
}

/// Cycle timing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Engine reconciliation interval in milliseconds
    #[serde(rename = "poll-interval-ms")]
    pub poll_interval_ms: u64,

    /// Delay before planting an empty plot (and after a harvest)
    #[serde(rename = "settle-delay-ms")]
    pub settle_delay_ms: u64,

    /// Delay between engine launches at startup
    #[serde(rename = "stagger-delay-ms")]
    pub stagger_delay_ms: u64,

    /// Console status report interval in milliseconds
    #[serde(rename = "report-interval-ms")]
    pub report_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 20_000,
            settle_delay_ms: 20_000,
            stagger_delay_ms: 20_000,
            report_interval_ms: 25_000,
        }
    }
}

impl TimingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn stagger_delay(&self) -> Duration {
        Duration::from_millis(self.stagger_delay_ms)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }
}

/// One plot managed by the daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotConfig {
    /// Garden the plot belongs to
    #[serde(rename = "garden-id")]
    pub garden_id: String,

    /// Bed identifier, unique across the configured set
    #[serde(rename = "plot-id")]
    pub plot_id: String,

    /// Seed to plant on this plot
    #[serde(rename = "seed-id")]
    pub seed_id: String,

    /// Expected growth time in milliseconds
    #[serde(rename = "growth-ms")]
    pub growth_ms: u64,
}

impl PlotConfig {
    pub fn growth(&self) -> Duration {
        Duration::from_millis(self.growth_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plot(id: &str) -> PlotConfig {
        PlotConfig {
            garden_id: "garden-1".to_string(),
            plot_id: id.to_string(),
            seed_id: "wheat".to_string(),
            growth_ms: 120_000,
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.farm.base_url, "https://chainers.io/api/farm");
        assert_eq!(config.farm.token_env, "FARM_TOKEN");
        assert_eq!(config.timing.poll_interval_ms, 20_000);
        assert_eq!(config.timing.report_interval_ms, 25_000);
        assert!(config.plots.is_empty());
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
farm:
  base-url: https://farm.example.com/api
  token-env: MY_TOKEN
  request-token-env: MY_REQUEST_TOKEN
  timeout-ms: 10000

timing:
  poll-interval-ms: 5000
  settle-delay-ms: 2000
  stagger-delay-ms: 1000
  report-interval-ms: 8000

plots:
  - garden-id: garden-1
    plot-id: bed-1
    seed-id: wheat
    growth-ms: 120000
  - garden-id: garden-1
    plot-id: bed-2
    seed-id: corn
    growth-ms: 240000
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.farm.base_url, "https://farm.example.com/api");
        assert_eq!(config.farm.token_env, "MY_TOKEN");
        assert_eq!(config.timing.poll_interval_ms, 5000);
        assert_eq!(config.plots.len(), 2);
        assert_eq!(config.plots[1].seed_id, "corn");
        assert_eq!(config.plots[1].growth(), Duration::from_secs(240));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
timing:
  poll-interval-ms: 1000
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        // Specified value
        assert_eq!(config.timing.poll_interval_ms, 1000);

        // Defaults for unspecified
        assert_eq!(config.timing.settle_delay_ms, 20_000);
        assert_eq!(config.farm.token_env, "FARM_TOKEN");
    }

    #[test]
    fn test_validate_rejects_duplicate_plot_ids() {
        // SAFETY: We're in a single-threaded test environment
        unsafe {
            std::env::set_var("DUP_TEST_TOKEN", "t");
            std::env::set_var("DUP_TEST_REQUEST_TOKEN", "r");
        }

        let mut config = Config::default();
        config.farm.token_env = "DUP_TEST_TOKEN".to_string();
        config.farm.request_token_env = "DUP_TEST_REQUEST_TOKEN".to_string();
        config.plots = vec![plot("bed-1"), plot("bed-1")];

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("Duplicate plot id"), "got: {}", err);
    }

    #[test]
    fn test_validate_rejects_zero_growth() {
        // SAFETY: We're in a single-threaded test environment
        unsafe {
            std::env::set_var("ZERO_TEST_TOKEN", "t");
            std::env::set_var("ZERO_TEST_REQUEST_TOKEN", "r");
        }

        let mut config = Config::default();
        config.farm.token_env = "ZERO_TEST_TOKEN".to_string();
        config.farm.request_token_env = "ZERO_TEST_REQUEST_TOKEN".to_string();
        let mut bad = plot("bed-1");
        bad.growth_ms = 0;
        config.plots = vec![bad];

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("growth-ms"), "got: {}", err);
    }

    #[test]
    fn test_validate_missing_token() {
        let mut config = Config::default();
        config.farm.token_env = "NONEXISTENT_FARM_TOKEN_12345".to_string();
        config.plots = vec![plot("bed-1")];

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("NONEXISTENT_FARM_TOKEN_12345"), "got: {}", err);
    }

    #[test]
    fn test_load_log_level_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log-level: debug").unwrap();
        let path = file.path().to_path_buf();

        assert_eq!(Config::load_log_level(Some(&path)), Some("debug".to_string()));
    }

    #[test]
    fn test_load_log_level_absent() {
        use std::io::Write;

        // File exists but sets no log level
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timing:\n  poll-interval-ms: 1000").unwrap();
        let path = file.path().to_path_buf();
        assert_eq!(Config::load_log_level(Some(&path)), None);

        // File missing entirely
        let missing = PathBuf::from("/nonexistent/farmd-log-level.yml");
        assert_eq!(Config::load_log_level(Some(&missing)), None);
    }

    #[test]
    fn test_resolve_missing_credential() {
        let mut farm = FarmConfig::default();
        farm.token_env = "NONEXISTENT_FARM_TOKEN_67890".to_string();

        let result = farm.resolve();
        assert!(matches!(result, Err(GatewayError::Credential(_))));
    }
}
