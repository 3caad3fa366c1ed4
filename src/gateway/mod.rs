//! Farm service gateway
//!
//! All remote interaction goes through the [`FarmGateway`] trait so the
//! cycle engine never depends on the HTTP implementation directly.

mod error;
mod http;
mod types;

pub use error::GatewayError;
pub use http::HttpGateway;
pub use types::{ActivePlanting, Garden, RemotePlot};

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::config::ResolvedFarmConfig;

/// Remote farm operations
///
/// Implementations must be safe to share across the engine tasks.
#[async_trait]
pub trait FarmGateway: Send + Sync {
    /// List the account's gardens with their current bed contents
    async fn list_gardens(&self) -> Result<Vec<Garden>, GatewayError>;

    /// Plant a seed on a bed; returns the server-assigned farming id
    async fn plant(&self, garden_id: &str, plot_id: &str, seed_id: &str) -> Result<String, GatewayError>;

    /// Collect the harvest for an active planting
    async fn harvest(&self, farming_id: &str) -> Result<(), GatewayError>;
}

/// Build the HTTP gateway from resolved configuration
pub fn create_gateway(config: &ResolvedFarmConfig) -> Result<Arc<dyn FarmGateway>, GatewayError> {
    debug!(base_url = %config.base_url, "create_gateway: called");
    Ok(Arc::new(HttpGateway::from_config(config)?))
}
