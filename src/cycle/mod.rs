//! Plot cycle orchestration
//!
//! One [`PlotEngine`] per configured plot runs the plant/grow/harvest/replant
//! state machine; the [`CycleSupervisor`] launches and stops the engines.

mod engine;
mod supervisor;

pub use engine::PlotEngine;
pub use supervisor::CycleSupervisor;
