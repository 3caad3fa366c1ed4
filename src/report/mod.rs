//! Console status reporting
//!
//! A passive observer task that renders the status board as a table on a
//! fixed cadence. It never touches engine state.

use std::time::Duration;

use colored::Colorize;
use tracing::debug;

use crate::domain::{Phase, PlotStatus};
use crate::status::StatusBoard;

/// Periodic console renderer for the status board
pub struct Reporter {
    board: StatusBoard,
    interval: Duration,
}

impl Reporter {
    pub fn new(board: StatusBoard, interval: Duration) -> Self {
        debug!(interval_ms = interval.as_millis() as u64, "new: called");
        Self { board, interval }
    }

    /// Render the board forever at the configured cadence
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            ticker.tick().await;
            self.render();
        }
    }

    fn render(&self) {
        let snapshot = self.board.snapshot();
        if snapshot.is_empty() {
            debug!("render: board empty, skipping");
            return;
        }

        println!();
        println!(
            "Farm status at {}",
            chrono::Local::now().format("%H:%M:%S")
        );
        println!("{:<20} {:<16} {:>10}  {}", "PLOT", "SEED", "REMAINING", "PHASE");
        println!("{}", "-".repeat(64));
        for line in format_rows(&snapshot) {
            println!("{}", line);
        }
    }
}

/// Table rows sorted by plot id
fn format_rows(snapshot: &std::collections::HashMap<String, PlotStatus>) -> Vec<String> {
    let mut rows: Vec<_> = snapshot.iter().collect();
    rows.sort_by(|a, b| a.0.cmp(b.0));

    rows.into_iter()
        .map(|(plot_id, status)| {
            format!(
                "{:<20} {:<16} {:>9}s  {}",
                plot_id,
                status.seed_id,
                status.remaining.as_secs(),
                colorize_phase(status.phase),
            )
        })
        .collect()
}

fn colorize_phase(phase: Phase) -> colored::ColoredString {
    let label = phase.to_string();
    match phase {
        Phase::Growing => label.green(),
        Phase::ReadyToHarvest => label.yellow(),
        Phase::JustPlanted | Phase::JustReplanted => label.cyan(),
        Phase::PlantFailed => label.red(),
    }
}
