//! Per-plot cycle engine
//!
//! Each engine owns one plot's lifecycle: reconcile against remote state,
//! predict readiness from the planting time, harvest when due, replant, and
//! publish status. All failures are recovered locally; the next tick retries
//! at the same fixed interval, so no error ever escapes the engine task.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::{PlotConfig, TimingConfig};
use crate::domain::{Occupancy, Phase, PlotStatus};
use crate::gateway::{FarmGateway, Garden};
use crate::status::StatusBoard;

/// State machine for one plot
pub struct PlotEngine {
    plot: PlotConfig,
    timing: TimingConfig,
    gateway: Arc<dyn FarmGateway>,
    board: StatusBoard,
    occupancy: Occupancy,
}

impl PlotEngine {
    pub fn new(plot: PlotConfig, timing: TimingConfig, gateway: Arc<dyn FarmGateway>, board: StatusBoard) -> Self {
        debug!(plot_id = %plot.plot_id, seed_id = %plot.seed_id, "new: called");
        Self {
            plot,
            timing,
            gateway,
            board,
            occupancy: Occupancy::Empty,
        }
    }

    /// Current local belief about the plot
    pub fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }

    /// Run the reconciliation loop forever
    pub async fn run(mut self) {
        info!(plot_id = %self.plot.plot_id, seed_id = %self.plot.seed_id, "engine starting");
        loop {
            self.tick().await;
            tokio::time::sleep(self.timing.poll_interval()).await;
        }
    }

    /// One reconciliation pass
    ///
    /// Fetch remote state, adopt any planting the service reports while we
    /// believe the plot is empty, then act on the resulting occupancy.
    pub async fn tick(&mut self) {
        debug!(plot_id = %self.plot.plot_id, "tick: called");

        match self.gateway.list_gardens().await {
            Ok(gardens) => self.adopt_remote(&gardens),
            Err(e) => {
                // Non-fatal: act on local belief, refreshed next tick
                warn!(plot_id = %self.plot.plot_id, error = %e, "tick: remote fetch failed");
            }
        }

        match self.occupancy.clone() {
            Occupancy::Occupied { farming_id, planted_at } => {
                self.tick_occupied(&farming_id, planted_at).await;
            }
            Occupancy::Empty => {
                self.tick_empty().await;
            }
        }
    }

    /// Adopt a remote-reported planting when the local belief is empty
    ///
    /// The service is authoritative for plantings we did not issue (a
    /// previous process, another client). A locally tracked planting is
    /// never overwritten.
    fn adopt_remote(&mut self, gardens: &[Garden]) {
        if !self.occupancy.is_empty() {
            return;
        }

        let planting = gardens
            .iter()
            .find(|garden| garden.garden_id == self.plot.garden_id)
            .and_then(|garden| garden.active_planting(&self.plot.plot_id));

        if let Some(planting) = planting {
            info!(
                plot_id = %self.plot.plot_id,
                farming_id = %planting.farming_id,
                planted_at = %planting.planted_at,
                "adopting remote planting"
            );
            self.occupancy = Occupancy::Occupied {
                farming_id: planting.farming_id.clone(),
                planted_at: planting.planted_at,
            };
        }
    }

    /// Growth time left for a planting started at `planted_at`, clamped at zero
    fn remaining(&self, planted_at: DateTime<Utc>) -> Duration {
        let elapsed = (Utc::now() - planted_at).to_std().unwrap_or_default();
        self.plot.growth().saturating_sub(elapsed)
    }

    async fn tick_occupied(&mut self, farming_id: &str, planted_at: DateTime<Utc>) {
        let remaining = self.remaining(planted_at);
        debug!(plot_id = %self.plot.plot_id, remaining_secs = remaining.as_secs(), "tick_occupied: called");

        if remaining > Duration::ZERO {
            self.publish(Phase::Growing, remaining);
            return;
        }

        self.publish(Phase::ReadyToHarvest, Duration::ZERO);

        match self.gateway.harvest(farming_id).await {
            Ok(()) => {
                info!(plot_id = %self.plot.plot_id, %farming_id, "harvest collected");
                self.occupancy = Occupancy::Empty;
                // Give the service time to register the cleared bed
                tokio::time::sleep(self.timing.settle_delay()).await;
                self.issue_plant(Phase::JustReplanted).await;
            }
            Err(e) => {
                // Occupancy unchanged; the harvest is retried next tick
                warn!(plot_id = %self.plot.plot_id, %farming_id, error = %e, "tick_occupied: harvest failed");
            }
        }
    }

    async fn tick_empty(&mut self) {
        debug!(plot_id = %self.plot.plot_id, "tick_empty: called");
        tokio::time::sleep(self.timing.settle_delay()).await;
        self.issue_plant(Phase::JustPlanted).await;
    }

    /// Issue one plant command and record the outcome
    ///
    /// A failed plant never records a farming id, so retries stay
    /// idempotent: each tick issues exactly one fresh attempt.
    async fn issue_plant(&mut self, success_phase: Phase) {
        match self
            .gateway
            .plant(&self.plot.garden_id, &self.plot.plot_id, &self.plot.seed_id)
            .await
        {
            Ok(farming_id) => {
                info!(plot_id = %self.plot.plot_id, %farming_id, phase = %success_phase, "seed planted");
                self.occupancy = Occupancy::Occupied {
                    farming_id,
                    planted_at: Utc::now(),
                };
                self.publish(success_phase, self.plot.growth());
            }
            Err(e) => {
                warn!(plot_id = %self.plot.plot_id, error = %e, "issue_plant: plant failed");
                self.occupancy = Occupancy::Empty;
                self.publish(Phase::PlantFailed, self.plot.growth());
            }
        }
    }

    fn publish(&self, phase: Phase, remaining: Duration) {
        self.board.publish(
            &self.plot.plot_id,
            PlotStatus {
                seed_id: self.plot.seed_id.clone(),
                remaining,
                phase,
            },
        );
    }
}
