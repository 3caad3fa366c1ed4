//! Shared status board
//!
//! A concurrency-safe map from plot id to [`PlotStatus`]. Each plot engine
//! writes only its own key; the reporter (and anything else) reads a
//! point-in-time snapshot. The board is an explicit component handed to both
//! sides, never a global.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::domain::PlotStatus;

/// Concurrency-safe plot status map
///
/// Cheap to clone; all clones share the same underlying map.
#[derive(Clone, Default)]
pub struct StatusBoard {
    inner: Arc<RwLock<HashMap<String, PlotStatus>>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the status for one plot
    pub fn publish(&self, plot_id: &str, status: PlotStatus) {
        debug!(%plot_id, phase = %status.phase, "publish: called");
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(plot_id.to_string(), status);
    }

    /// Current status for one plot, if any has been published
    pub fn get(&self, plot_id: &str) -> Option<PlotStatus> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.get(plot_id).cloned()
    }

    /// Point-in-time copy of the whole board
    pub fn snapshot(&self) -> HashMap<String, PlotStatus> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.clone()
    }

    /// Number of plots that have published at least once
    pub fn len(&self) -> usize {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
