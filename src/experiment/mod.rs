//! Experiment sweeps: configuration, single runs and parallel execution.

mod config;
mod runner;
mod sweep;

pub use config::{ExperimentConfig, RunConfig};
pub use runner::{execute, run_one, RunOutcome};
pub use sweep::run_sweep;
