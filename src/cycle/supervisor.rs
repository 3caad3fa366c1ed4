//! Cycle supervisor
//!
//! Launches one engine task per configured plot, staggered so a fleet of
//! plots does not hammer the service at startup, and aborts them all on
//! shutdown. The contract is launch, not liveness: a panicked engine task is
//! not restarted (its last published status stays on the board).

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::{PlotConfig, TimingConfig};
use crate::cycle::PlotEngine;
use crate::gateway::FarmGateway;
use crate::status::StatusBoard;

/// Owns the engine tasks for the configured plot set
pub struct CycleSupervisor {
    plots: Vec<PlotConfig>,
    timing: TimingConfig,
    gateway: Arc<dyn FarmGateway>,
    board: StatusBoard,
    tasks: HashMap<String, JoinHandle<()>>,
}

impl CycleSupervisor {
    pub fn new(
        plots: Vec<PlotConfig>,
        timing: TimingConfig,
        gateway: Arc<dyn FarmGateway>,
        board: StatusBoard,
    ) -> Self {
        debug!(plot_count = plots.len(), "new: called");
        Self {
            plots,
            timing,
            gateway,
            board,
            tasks: HashMap::new(),
        }
    }

    /// Launch all engines, then wait for the shutdown signal
    pub async fn run(mut self, mut shutdown_rx: mpsc::Receiver<()>) {
        info!(plot_count = self.plots.len(), "supervisor starting");

        let stagger = self.timing.stagger_delay();
        let plots = self.plots.clone();
        for (idx, plot) in plots.into_iter().enumerate() {
            if idx > 0 {
                tokio::select! {
                    _ = tokio::time::sleep(stagger) => {}
                    _ = shutdown_rx.recv() => {
                        debug!("run: shutdown during staggered launch");
                        self.shutdown();
                        return;
                    }
                }
            }
            self.spawn_engine(plot);
        }

        let _ = shutdown_rx.recv().await;
        self.shutdown();
    }

    fn spawn_engine(&mut self, plot: PlotConfig) {
        info!(plot_id = %plot.plot_id, seed_id = %plot.seed_id, "launching plot engine");
        let engine = PlotEngine::new(plot.clone(), self.timing.clone(), self.gateway.clone(), self.board.clone());
        let handle = tokio::spawn(engine.run());
        self.tasks.insert(plot.plot_id, handle);
    }

    /// Abort all engine tasks
    ///
    /// Engines hold no state worth flushing; in-flight gateway calls
    /// complete or fail on their own.
    fn shutdown(&mut self) {
        info!(task_count = self.tasks.len(), "supervisor shutting down");
        for (plot_id, handle) in self.tasks.drain() {
            debug!(%plot_id, "shutdown: aborting engine task");
            handle.abort();
        }
    }
}
