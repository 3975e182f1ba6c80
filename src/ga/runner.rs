//! GA evolutionary loop execution.
//!
//! [`GaRunner`] orchestrates the evolutionary process:
//! initialization → evaluation → (selection → crossover → mutation →
//! evaluation → ranking → hook) × generations.

use super::config::GaConfig;
use super::types::{Fitness, GaProblem, GenerationHook, Individual};
use crate::random::rng_from;
use rand::Rng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::marker::PhantomData;
use tracing::debug;

/// Result of a GA optimization run.
#[derive(Debug, Clone)]
pub struct GaResult<I: Individual> {
    /// The best individual found during the entire run.
    pub best: I,

    /// Best fitness value (same as `best.fitness()`).
    pub best_fitness: I::Fitness,

    /// Total number of generations executed.
    pub generations: usize,

    /// Best fitness of the initial population, then at the end of each
    /// generation (`generations + 1` entries).
    pub fitness_history: Vec<f64>,

    /// The final population, ranked best first.
    pub population: Vec<I>,
}

/// Executes the GA evolutionary loop.
///
/// # Usage
///
/// ```ignore
/// let problem = MyProblem::new();
/// let config = GaConfig::default().with_seed(42);
/// let result = GaRunner::run(&problem, &config)?;
/// println!("Best fitness: {:?}", result.best_fitness);
/// ```
pub struct GaRunner;

impl GaRunner {
    /// Runs the GA optimization without a generation hook.
    ///
    /// # Errors
    /// The first evaluation error stops the run and is returned unchanged.
    ///
    /// # Panics
    /// Panics if the configuration is invalid (call [`GaConfig::validate`] first
    /// to get a descriptive error).
    pub fn run<P: GaProblem>(
        problem: &P,
        config: &GaConfig,
    ) -> Result<GaResult<P::Individual>, P::Error> {
        Self::run_with_hook(problem, config, &mut NoHook(PhantomData))
    }

    /// Runs the GA, invoking `hook` once per generation.
    ///
    /// For each generation `g` in `0..max_generations`: elites are kept,
    /// offspring are bred and evaluated, the population is ranked and
    /// handed to the hook with index `g`, then ranked again and the best is
    /// updated. The population size never changes.
    ///
    /// # Errors
    /// The first evaluation error (converted into the hook's error type) or
    /// hook error stops the run.
    ///
    /// # Panics
    /// Panics if the configuration is invalid.
    pub fn run_with_hook<P, H>(
        problem: &P,
        config: &GaConfig,
        hook: &mut H,
    ) -> Result<GaResult<P::Individual>, H::Error>
    where
        P: GaProblem,
        H: GenerationHook<P::Individual>,
        H::Error: From<P::Error>,
    {
        if let Err(message) = config.validate() {
            panic!("invalid GaConfig: {message}");
        }

        let mut rng = rng_from(config.seed);

        // 1. Initialize population
        let mut population: Vec<P::Individual> = (0..config.population_size)
            .map(|_| problem.create_individual(&mut rng))
            .collect();

        // 2. Evaluate and rank initial population
        evaluate_all(problem, &mut population, config.parallel)?;
        rank(&mut population);

        // 3. Track best
        let mut best = population[0].clone();
        let mut fitness_history = Vec::with_capacity(config.max_generations + 1);
        fitness_history.push(best.fitness().to_f64());

        // 4. Evolutionary loop
        for generation in 0..config.max_generations {
            let mut next_gen: Vec<P::Individual> = population[..config.elite_count].to_vec();

            while next_gen.len() < config.population_size {
                let p1_idx = config.selection.select(&population, &mut rng);
                let p2_idx = config.selection.select(&population, &mut rng);

                let children = if rng.random_range(0.0..1.0) < config.crossover_rate {
                    problem.crossover(&population[p1_idx], &population[p2_idx], &mut rng)
                } else {
                    vec![population[p1_idx].clone()]
                };

                for mut child in children {
                    if next_gen.len() >= config.population_size {
                        break;
                    }
                    problem.mutate(&mut child, config.mutation_rate, &mut rng);
                    next_gen.push(child);
                }
            }

            // Elites are already evaluated
            evaluate_all(problem, &mut next_gen[config.elite_count..], config.parallel)?;
            population = next_gen;
            rank(&mut population);

            hook.on_generation(generation, &mut population)?;
            assert_eq!(
                population.len(),
                config.population_size,
                "population size changed during generation {generation}"
            );
            rank(&mut population);

            if population[0].fitness() < best.fitness() {
                best = population[0].clone();
            }
            fitness_history.push(best.fitness().to_f64());

            debug!(
                generation,
                generation_best = population[0].fitness().to_f64(),
                best = best.fitness().to_f64(),
                "generation complete"
            );
        }

        Ok(GaResult {
            best_fitness: best.fitness(),
            best,
            generations: config.max_generations,
            fitness_history,
            population,
        })
    }
}

/// Sorts ascending by fitness (best first). Stable, so ties keep order.
fn rank<I: Individual>(population: &mut [I]) {
    population.sort_by(|a, b| {
        a.fitness()
            .partial_cmp(&b.fitness())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Hook of [`GaRunner::run`]: does nothing and fails with the problem's
/// error type.
struct NoHook<E>(PhantomData<fn() -> E>);

impl<I: Individual, E> GenerationHook<I> for NoHook<E> {
    type Error = E;

    fn on_generation(&mut self, _generation: usize, _population: &mut [I]) -> Result<(), E> {
        Ok(())
    }
}

#[cfg(feature = "parallel")]
fn evaluate_all<P: GaProblem>(
    problem: &P,
    individuals: &mut [P::Individual],
    parallel: bool,
) -> Result<(), P::Error> {
    if parallel {
        individuals.par_iter_mut().try_for_each(|ind| {
            let f = problem.evaluate(ind)?;
            ind.set_fitness(f);
            Ok(())
        })
    } else {
        evaluate_sequential(problem, individuals)
    }
}

#[cfg(not(feature = "parallel"))]
fn evaluate_all<P: GaProblem>(
    problem: &P,
    individuals: &mut [P::Individual],
    _parallel: bool,
) -> Result<(), P::Error> {
    evaluate_sequential(problem, individuals)
}

fn evaluate_sequential<P: GaProblem>(
    problem: &P,
    individuals: &mut [P::Individual],
) -> Result<(), P::Error> {
    for ind in individuals.iter_mut() {
        let f = problem.evaluate(ind)?;
        ind.set_fitness(f);
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
