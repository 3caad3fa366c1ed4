//! Gateway error taxonomy

use thiserror::Error;

/// Errors surfaced by the farm gateway
///
/// Each operation fails with its own variant so the engine can log and
/// recover per operation. The HTTP client retries transient statuses
/// internally before any of these are returned.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Garden listing could not be fetched (network, auth, or server)
    #[error("garden listing unavailable: {0}")]
    Fetch(String),

    /// Plant command rejected by the service
    #[error("plant rejected: {0}")]
    Plant(String),

    /// Harvest command rejected by the service
    #[error("harvest rejected: {0}")]
    Harvest(String),

    /// A required credential environment variable is not set
    #[error("missing credential: {0} is not set")]
    Credential(String),

    /// HTTP client could not be constructed
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}
