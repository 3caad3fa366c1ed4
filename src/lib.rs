//! FarmDaemon - automated farm cycle orchestrator
//!
//! Runs one independent plant/grow/harvest/replant state machine per
//! configured plot against a remote farm service, with a shared status board
//! and a periodic console report.

pub mod cli;
pub mod config;
pub mod cycle;
pub mod domain;
pub mod gateway;
pub mod report;
pub mod status;

pub use config::{Config, FarmConfig, PlotConfig, ResolvedFarmConfig, TimingConfig};
pub use cycle::{CycleSupervisor, PlotEngine};
pub use domain::{Occupancy, Phase, PlotStatus};
pub use gateway::{FarmGateway, GatewayError, HttpGateway, create_gateway};
pub use report::Reporter;
pub use status::StatusBoard;
