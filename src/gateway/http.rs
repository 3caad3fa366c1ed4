//! HTTP implementation of the farm gateway
//!
//! Talks to the farm service's JSON API with bearer-token auth. Transient
//! HTTP failures are retried with exponential backoff before an error is
//! surfaced to the engine.

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::types::Garden;
use super::{FarmGateway, GatewayError};
use crate::config::ResolvedFarmConfig;

/// Maximum number of retries for transient errors
const MAX_RETRIES: u32 = 3;

/// Initial backoff delay for retries
const INITIAL_BACKOFF_MS: u64 = 1000;

const ORIGIN: &str = "https://static.chainers.io";
const REFERER: &str = "https://static.chainers.io/";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
}

/// Farm service HTTP client
pub struct HttpGateway {
    base_url: String,
    token: String,
    request_token: String,
    http: Client,
}

impl HttpGateway {
    /// Create a new client from resolved configuration
    pub fn from_config(config: &ResolvedFarmConfig) -> Result<Self, GatewayError> {
        debug!(base_url = %config.base_url, timeout_ms = config.timeout_ms, "from_config: called");
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(GatewayError::Network)?;

        Ok(Self {
            base_url: config.base_url.clone(),
            token: config.token.clone(),
            request_token: config.request_token.clone(),
            http,
        })
    }

    /// Send one request with bounded retry of transient failures
    ///
    /// Returns the successful response, or an error message the caller
    /// wraps in the operation's own variant.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response, String> {
        let url = format!("{}{}", self.base_url, path);

        let mut last_error = None;
        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let backoff = INITIAL_BACKOFF_MS * 2u64.pow(attempt - 1);
                warn!(attempt, backoff_ms = backoff, %path, "send: retrying after transient error");
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }

            let mut request = self
                .http
                .request(method.clone(), &url)
                .header("Authorization", format!("Bearer {}", self.token))
                .header("x-request-token-id", &self.request_token)
                .header("Origin", ORIGIN)
                .header("Referer", REFERER)
                .header("User-Agent", USER_AGENT);
            if let Some(json) = body {
                request = request.json(json);
            }

            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    debug!(attempt, error = %e, "send: network error");
                    last_error = Some(format!("network error: {}", e));
                    continue;
                }
            };

            let status = response.status().as_u16();

            if is_retryable_status(status) && attempt < MAX_RETRIES {
                let text = response.text().await.unwrap_or_default();
                debug!(attempt, status, "send: retryable status");
                last_error = Some(format!("status {}: {}", status, text));
                continue;
            }

            if !response.status().is_success() {
                debug!(status, "send: request failed");
                let text = response.text().await.unwrap_or_default();
                return Err(format!("status {}: {}", status, text));
            }

            debug!(status, %path, "send: success");
            return Ok(response);
        }

        Err(last_error.unwrap_or_else(|| "max retries exceeded".to_string()))
    }
}

#[async_trait]
impl FarmGateway for HttpGateway {
    async fn list_gardens(&self) -> Result<Vec<Garden>, GatewayError> {
        debug!("list_gardens: called");
        let response = self
            .send(Method::GET, "/user/gardens", None)
            .await
            .map_err(GatewayError::Fetch)?;

        let parsed: GardensResponse = response.json().await.map_err(|e| GatewayError::Fetch(e.to_string()))?;
        debug!(garden_count = parsed.data.len(), "list_gardens: parsed");
        Ok(parsed.data)
    }

    async fn plant(&self, garden_id: &str, plot_id: &str, seed_id: &str) -> Result<String, GatewayError> {
        debug!(%garden_id, %plot_id, %seed_id, "plant: called");
        let body = serde_json::json!({
            "userGardensID": garden_id,
            "userBedsID": plot_id,
            "seedID": seed_id,
        });

        let response = self
            .send(Method::POST, "/control/plant-seed", Some(&body))
            .await
            .map_err(GatewayError::Plant)?;

        let parsed: PlantResponse = response.json().await.map_err(|e| GatewayError::Plant(e.to_string()))?;
        debug!(farming_id = %parsed.data.farming_id, "plant: success");
        Ok(parsed.data.farming_id)
    }

    async fn harvest(&self, farming_id: &str) -> Result<(), GatewayError> {
        debug!(%farming_id, "harvest: called");
        let body = serde_json::json!({ "userFarmingID": farming_id });

        self.send(Method::POST, "/control/collect-harvest", Some(&body))
            .await
            .map_err(GatewayError::Harvest)?;

        debug!(%farming_id, "harvest: success");
        Ok(())
    }
}

// Farm API response envelopes

#[derive(Debug, Deserialize)]
struct GardensResponse {
    #[serde(default)]
    data: Vec<Garden>,
}

#[derive(Debug, Deserialize)]
struct PlantResponse {
    data: PlantData,
}

#[derive(Debug, Deserialize)]
struct PlantData {
    #[serde(rename = "userFarmingID")]
    farming_id: String,
}
