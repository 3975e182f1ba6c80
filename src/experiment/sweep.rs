//! Parallel execution of a whole sweep.

use super::config::{ExperimentConfig, RunConfig};
use super::runner::{run_one, RunOutcome};
use crate::error::{Result, RouteChoiceError};
use crate::network::NetworkDefinition;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::info;

/// Expands `config` and runs every configuration.
///
/// The network file is parsed once and shared; each run builds its own
/// groups and routes. Up to `number_of_processes` runs execute at once.
/// The first failing run's error is returned.
pub fn run_sweep(config: &ExperimentConfig) -> Result<Vec<RunOutcome>> {
    let runs = config.runs()?;
    let definition = NetworkDefinition::from_file(&config.network, config.base_flow)?;
    info!(
        runs = runs.len(),
        processes = config.number_of_processes,
        network = %config.network.display(),
        "sweep started"
    );
    execute_runs(&runs, &definition, config.number_of_processes)
}

#[cfg(feature = "parallel")]
fn execute_runs(
    runs: &[RunConfig],
    definition: &NetworkDefinition,
    processes: usize,
) -> Result<Vec<RunOutcome>> {
    if processes <= 1 {
        return runs.iter().map(|run| run_one(run, definition)).collect();
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(processes)
        .build()
        .map_err(|e| RouteChoiceError::config(format!("cannot start worker pool: {e}")))?;
    pool.install(|| {
        runs.par_iter()
            .map(|run| run_one(run, definition))
            .collect()
    })
}

#[cfg(not(feature = "parallel"))]
fn execute_runs(
    runs: &[RunConfig],
    definition: &NetworkDefinition,
    processes: usize,
) -> Result<Vec<RunOutcome>> {
    if processes > 1 {
        tracing::warn!(processes, "built without `parallel`, running sequentially");
    }
    runs.iter().map(|run| run_one(run, definition)).collect()
}
