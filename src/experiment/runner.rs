//! Single-run driver.

use super::config::RunConfig;
use crate::assignment::RouteChoiceProblem;
use crate::error::Result;
use crate::evaluation::CostEvaluationEngine;
use crate::ga::GaRunner;
use crate::hybrid::{HybridCoordinator, HybridEvent, HybridMode};
use crate::learning::{EpisodeRunner, QLearner};
use crate::network::{NetworkDefinition, NetworkModel};
use crate::report::paths::create_log_file;
use crate::report::{report_step, LogWriter, StepReporter, StepScores};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run: RunConfig,
    /// Log file written by the run.
    pub log_path: PathBuf,
    /// Best assignment seen (GA best, or best QL episode in QL-only runs).
    pub best_assignment: Vec<usize>,
    pub best_score: f64,
    /// Steps executed (generations or episodes).
    pub steps: usize,
    pub events: Vec<HybridEvent>,
}

/// Builds the run's network, writes its log and runs the selected mode.
///
/// `definition` is the parsed network file; it is split into groups and
/// routed with the run's group size and `k`.
pub fn run_one(run: &RunConfig, definition: &NetworkDefinition) -> Result<RunOutcome> {
    run.validate()?;
    let network = Arc::new(
        definition
            .clone()
            .build(&run.network_name, run.group_size, run.k)?,
    );
    let (path, file) = create_log_file(&run.log_dir(), &run.log_stem())?;
    let log = LogWriter::new(
        path,
        file,
        &network,
        run.mode.report_kind(),
        &run.parameters(network.num_travelers()),
        run.report,
    )?;
    info!(
        mode = %run.mode,
        groups = network.groups().len(),
        log = %log.path().display(),
        "run started"
    );

    let started = Instant::now();
    let (outcome, log) = execute(run, network, log)?;
    let log_path = log.finish()?;
    info!(
        mode = %run.mode,
        best = outcome.best_score,
        elapsed_ms = started.elapsed().as_millis() as u64,
        log = %log_path.display(),
        "run finished"
    );
    Ok(RunOutcome { log_path, ..outcome })
}

/// Runs `run` against `network`, recording every step into `reporter`.
///
/// Returns the outcome (with an empty `log_path`) and the reporter.
pub fn execute<R: StepReporter>(
    run: &RunConfig,
    network: Arc<NetworkModel>,
    reporter: R,
) -> Result<(RunOutcome, R)> {
    let engine = CostEvaluationEngine::new(network);
    match run.mode {
        HybridMode::QlOnly => {
            let learner = QLearner::new(engine.clone(), run.ql_config(), run.learner_seed())?;
            run_ql_only(run, &engine, learner, reporter)
        }
        mode => {
            let learner = if mode.uses_ql() {
                Some(QLearner::new(engine.clone(), run.ql_config(), run.learner_seed())?)
            } else {
                None
            };
            let problem = RouteChoiceProblem::new(engine.clone());
            let mut coordinator =
                HybridCoordinator::new(mode, engine, learner, reporter, run.population)?;
            let result = GaRunner::run_with_hook(&problem, &run.ga_config(), &mut coordinator)?;
            let (reporter, events) = coordinator.into_parts();
            let outcome = RunOutcome {
                run: run.clone(),
                log_path: PathBuf::new(),
                best_assignment: result.best.genes,
                best_score: result.best_fitness,
                steps: result.generations,
                events,
            };
            Ok((outcome, reporter))
        }
    }
}

/// One free episode per step.
fn run_ql_only<L: EpisodeRunner, R: StepReporter>(
    run: &RunConfig,
    engine: &CostEvaluationEngine,
    mut learner: L,
    mut reporter: R,
) -> Result<(RunOutcome, R)> {
    let mut best_assignment = Vec::new();
    let mut best_score = f64::INFINITY;
    for episode in 0..run.generations {
        let result = learner.run_free_episode()?;
        let scores = StepScores::QlOnly {
            ql: result.average_travel_time,
        };
        report_step(&mut reporter, engine, episode, scores, &result.assignment)?;
        if result.average_travel_time < best_score {
            best_score = result.average_travel_time;
            best_assignment = result.assignment;
        }
    }
    let outcome = RunOutcome {
        run: run.clone(),
        log_path: PathBuf::new(),
        best_assignment,
        best_score,
        steps: run.generations,
        events: Vec::new(),
    };
    Ok((outcome, reporter))
}
