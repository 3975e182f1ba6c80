//! End-to-end runs over the bundled networks through the public API.

use std::path::PathBuf;
use std::sync::Arc;
use u_routechoice::assignment::{CandidateSolution, RouteChoiceProblem};
use u_routechoice::evaluation::CostEvaluationEngine;
use u_routechoice::experiment::{run_sweep, ExperimentConfig};
use u_routechoice::ga::{GaConfig, GaRunner, GenerationHook, Selection};
use u_routechoice::hybrid::{HybridCoordinator, HybridMode};
use u_routechoice::learning::{QLearner, QLearningConfig};
use u_routechoice::network::{NetworkDefinition, NetworkModel};
use u_routechoice::report::{StepRecord, StepScores};
use u_routechoice::RouteChoiceError;

fn network_file(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("networks")
        .join(name)
}

fn braess(group_size: usize) -> Arc<NetworkModel> {
    let definition = NetworkDefinition::from_file(network_file("braess.net"), 0.0).unwrap();
    Arc::new(definition.build("braess", group_size, 3).unwrap())
}

/// Wraps a coordinator and checks what injection may and may not touch.
struct Checked<H> {
    inner: H,
    generations: Vec<usize>,
}

impl<H> GenerationHook<CandidateSolution> for Checked<H>
where
    H: GenerationHook<CandidateSolution, Error = RouteChoiceError>,
{
    type Error = RouteChoiceError;

    fn on_generation(
        &mut self,
        generation: usize,
        population: &mut [CandidateSolution],
    ) -> Result<(), RouteChoiceError> {
        assert!(population
            .windows(2)
            .all(|w| w[0].fitness <= w[1].fitness));
        let best = population[0].clone();
        let untouched = population[2..population.len() - 1].to_vec();

        self.inner.on_generation(generation, population)?;

        assert_eq!(population[0], best, "best overwritten at {generation}");
        let n = population.len();
        assert_eq!(&population[2..n - 1], untouched.as_slice());
        self.generations.push(generation);
        Ok(())
    }
}

#[test]
fn exchange_run_keeps_best_and_reports_every_generation() {
    let network = braess(200);
    let engine = CostEvaluationEngine::new(network.clone());
    let learner = QLearner::new(
        engine.clone(),
        QLearningConfig::default().with_alpha(0.5),
        Some(9),
    )
    .unwrap();
    let coordinator = HybridCoordinator::new(
        HybridMode::QlGaExchange { interval: 4 },
        engine.clone(),
        Some(learner),
        Vec::<StepRecord>::new(),
        20,
    )
    .unwrap();
    let mut hook = Checked {
        inner: coordinator,
        generations: Vec::new(),
    };
    let config = GaConfig::default()
        .with_population_size(20)
        .with_max_generations(30)
        .with_elite_count(2)
        .with_selection(Selection::Rank)
        .with_seed(5);

    let result =
        GaRunner::run_with_hook(&RouteChoiceProblem::new(engine.clone()), &config, &mut hook)
            .unwrap();

    assert_eq!(hook.generations, (0..30).collect::<Vec<_>>());
    assert_eq!(result.population.len(), 20);
    let (records, events) = hook.inner.into_parts();
    assert_eq!(records.len(), 30);
    for (g, record) in records.iter().enumerate() {
        assert_eq!(record.step, g);
        assert!(matches!(record.scores, StepScores::Hybrid { .. }));
    }
    for event in events {
        let u_routechoice::hybrid::HybridEvent::BestBeaten {
            ql_score,
            best_score,
            ..
        } = event;
        assert!(ql_score < best_score);
    }
    assert_eq!(
        engine.average_travel_time(&result.best.genes).unwrap(),
        result.best_fitness
    );
}

#[test]
fn ga_never_does_worse_than_its_initial_population() {
    let engine = CostEvaluationEngine::new(braess(100));
    let config = GaConfig::default()
        .with_population_size(30)
        .with_max_generations(40)
        .with_elite_count(3)
        .with_seed(11);
    let result = GaRunner::run(&RouteChoiceProblem::new(engine), &config).unwrap();
    assert!(result
        .fitness_history
        .windows(2)
        .all(|w| w[1] <= w[0]));
}

#[test]
fn sweep_over_bundled_network_writes_logs() {
    let dir = tempfile::tempdir().unwrap();
    let config = ExperimentConfig {
        network: network_file("two_routes.net"),
        experiment_type: 3,
        generations: 8,
        population: 6,
        elite_size: 1,
        group_sizes: vec![25],
        ks: vec![2],
        alphas: vec![0.3, 0.7],
        output: dir.path().to_path_buf(),
        seed: Some(2),
        ..ExperimentConfig::default()
    };
    let outcomes = run_sweep(&config).unwrap();
    assert_eq!(outcomes.len(), 2);
    for outcome in outcomes {
        assert!(outcome.log_path.starts_with(dir.path().join("net_two_routes/QLGA")));
        let text = std::fs::read_to_string(&outcome.log_path).unwrap();
        let rows = text.lines().filter(|l| !l.starts_with('#')).count();
        assert_eq!(rows, 8);
        // Four groups: everyone on the direct road costs 2.
        assert!(outcome.best_score >= 2.0 - 1e-9);
        assert!(outcome.best_score <= 4.0);
    }
}
