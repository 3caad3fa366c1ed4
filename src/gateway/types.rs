//! Remote farm data model
//!
//! Field names mirror the service's JSON wire format; the rename attributes
//! keep the Rust side idiomatic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One garden owned by the account, with its placed beds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Garden {
    #[serde(rename = "userGardensID")]
    pub garden_id: String,

    #[serde(rename = "placedBeds", default)]
    pub plots: Vec<RemotePlot>,
}

/// One bed (plot) inside a garden
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemotePlot {
    #[serde(rename = "userBedsID")]
    pub plot_id: String,

    /// Present when the service reports something growing on this bed
    #[serde(rename = "plantedSeed", default, skip_serializing_if = "Option::is_none")]
    pub active_planting: Option<ActivePlanting>,
}

/// Server-reported active planting on a bed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivePlanting {
    #[serde(rename = "userFarmingID")]
    pub farming_id: String,

    #[serde(rename = "plantedDate")]
    pub planted_at: DateTime<Utc>,
}

impl Garden {
    /// Active planting on the named plot, if the garden has that plot
    /// and the service reports something growing there
    pub fn active_planting(&self, plot_id: &str) -> Option<&ActivePlanting> {
        self.plots
            .iter()
            .find(|plot| plot.plot_id == plot_id)
            .and_then(|plot| plot.active_planting.as_ref())
    }
}
