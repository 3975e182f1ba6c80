//! Criterion benchmarks for cost evaluation and the optimizers.
//!
//! Uses synthetic grid networks with BPR-style edge costs, routed with
//! `k = 8`, so the numbers reflect evaluation and search overhead only.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use u_routechoice::assignment::RouteChoiceProblem;
use u_routechoice::evaluation::CostEvaluationEngine;
use u_routechoice::experiment::{execute, ExperimentConfig};
use u_routechoice::ga::{GaConfig, GaRunner, Selection};
use u_routechoice::network::{NetworkDefinition, NetworkModel};
use u_routechoice::report::StepRecord;

// ===========================================================================
// Grid network: n x n nodes, edges right and down, corner-to-corner demand
// ===========================================================================

fn grid_network(n: usize, travelers: usize, group_size: usize) -> NetworkModel {
    let mut text = String::from("function bpr (f) t * (1 + 0.15 * (f / c) ^ 4)\n");
    for r in 0..n {
        for c in 0..n {
            text.push_str(&format!("node n{r}_{c}\n"));
        }
    }
    for r in 0..n {
        for c in 0..n {
            if c + 1 < n {
                text.push_str(&format!("dedge r{r}_{c} n{r}_{c} n{r}_{} bpr 1 200\n", c + 1));
            }
            if r + 1 < n {
                text.push_str(&format!("dedge d{r}_{c} n{r}_{c} n{}_{c} bpr 1 200\n", r + 1));
            }
        }
    }
    let last = n - 1;
    text.push_str(&format!("od a n0_0 n{last}_{last} {travelers}\n"));
    text.push_str(&format!("od b n0_{last} n{last}_0 {travelers}\n"));
    text.push_str(&format!("od c n{last}_0 n0_{last} {travelers}\n"));
    NetworkDefinition::parse(&text, 0.0)
        .unwrap()
        .build("grid", group_size, 8)
        .unwrap()
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_average_travel_time(c: &mut Criterion) {
    let mut group = c.benchmark_group("average_travel_time");

    for group_size in [100usize, 10, 1] {
        let engine = CostEvaluationEngine::new(Arc::new(grid_network(6, 1000, group_size)));
        let assignment: Vec<usize> = engine
            .network()
            .route_counts()
            .iter()
            .enumerate()
            .map(|(i, &k)| i % k)
            .collect();
        group.bench_with_input(
            BenchmarkId::from_parameter(assignment.len()),
            &(engine, assignment),
            |b, (e, a)| b.iter(|| black_box(e.average_travel_time(black_box(a)).unwrap())),
        );
    }
    group.finish();
}

fn bench_ga_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("ga_grid");
    group.sample_size(10);

    for (pop, gen) in [(50usize, 50usize), (100, 30)] {
        let engine = CostEvaluationEngine::new(Arc::new(grid_network(6, 1000, 20)));
        let problem = RouteChoiceProblem::new(engine);
        let config = GaConfig {
            population_size: pop,
            max_generations: gen,
            selection: Selection::Rank,
            seed: Some(42),
            ..GaConfig::default()
        };
        group.bench_with_input(
            BenchmarkId::new(format!("p{pop}_g{gen}"), pop),
            &(problem, config),
            |b, (p, c)| {
                b.iter(|| {
                    let result = GaRunner::run(black_box(p), black_box(c)).unwrap();
                    black_box(result)
                })
            },
        );
    }
    group.finish();
}

fn bench_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("modes");
    group.sample_size(10);

    let network = Arc::new(grid_network(6, 1000, 20));
    for experiment_type in 1u8..=4 {
        let config = ExperimentConfig {
            experiment_type,
            generations: 30,
            population: 50,
            intervals: vec![Some(5)],
            seed: Some(42),
            ..ExperimentConfig::default()
        };
        let run = config.runs().unwrap().remove(0);
        group.bench_with_input(
            BenchmarkId::from_parameter(run.mode),
            &run,
            |b, run| {
                b.iter(|| {
                    let (outcome, records) =
                        execute(black_box(run), network.clone(), Vec::<StepRecord>::new())
                            .unwrap();
                    black_box((outcome, records))
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_average_travel_time, bench_ga_grid, bench_modes);
criterion_main!(benches);
