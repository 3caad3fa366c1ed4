//! Core domain types shared across the daemon
//!
//! These types describe what a plot engine believes about its plot
//! (occupancy) and what it reports to observers (phase + remaining time).

use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

/// What the engine believes about its plot right now
///
/// Owned exclusively by the plot's engine task. `planted_at` comes from the
/// remote service when a planting is adopted, otherwise it is recorded
/// locally at the moment a plant command succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Occupancy {
    /// Nothing growing, nothing to harvest
    Empty,

    /// A planting is in progress (or ready, once its growth time elapses)
    Occupied {
        /// Server-assigned id of the active planting
        farming_id: String,
        /// When the seed went into the ground
        planted_at: DateTime<Utc>,
    },
}

impl Occupancy {
    pub fn is_empty(&self) -> bool {
        matches!(self, Occupancy::Empty)
    }

    pub fn farming_id(&self) -> Option<&str> {
        match self {
            Occupancy::Empty => None,
            Occupancy::Occupied { farming_id, .. } => Some(farming_id),
        }
    }
}

/// Lifecycle phase reported on the status board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Planted and still within its growth window
    Growing,
    /// Growth time elapsed, harvest pending
    ReadyToHarvest,
    /// Fresh plant command succeeded on a previously empty plot
    JustPlanted,
    /// Plant command succeeded immediately after a harvest
    JustReplanted,
    /// The last plant command was rejected; retried next tick
    PlantFailed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Growing => "growing",
            Phase::ReadyToHarvest => "ready to harvest",
            Phase::JustPlanted => "just planted",
            Phase::JustReplanted => "replanted",
            Phase::PlantFailed => "plant failed",
        };
        write!(f, "{}", s)
    }
}

/// Point-in-time status of one plot, as published to the status board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotStatus {
    /// Seed being grown on this plot
    pub seed_id: String,
    /// Time left until harvest, clamped at zero
    pub remaining: Duration,
    /// Current lifecycle phase
    pub phase: Phase,
}
