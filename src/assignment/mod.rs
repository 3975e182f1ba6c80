//! Route assignments as GA individuals.
//!
//! [`CandidateSolution`] is one route index per driver group;
//! [`RouteChoiceProblem`] plugs the search space and the congestion
//! objective of a network into the generic [`ga`](crate::ga) engine.

use crate::error::{Result, RouteChoiceError};
use crate::evaluation::CostEvaluationEngine;
use crate::ga::operators::{random_genes, random_reset_mutation, single_point_crossover};
use crate::ga::{GaProblem, Individual};
use rand::Rng;

/// One assignment and its fitness.
///
/// `fitness` is `f64::INFINITY` until evaluated. Changing `genes` in place
/// leaves the fitness stale; call [`CandidateSolution::reevaluate`] after.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSolution {
    pub genes: Vec<usize>,
    pub fitness: f64,
}

impl CandidateSolution {
    /// An unevaluated solution.
    pub fn new(genes: Vec<usize>) -> Self {
        Self {
            genes,
            fitness: f64::INFINITY,
        }
    }

    /// Recomputes the fitness through `engine`, propagating failures.
    pub fn reevaluate(&mut self, engine: &CostEvaluationEngine) -> Result<f64> {
        self.fitness = engine.average_travel_time(&self.genes)?;
        Ok(self.fitness)
    }
}

impl Individual for CandidateSolution {
    type Fitness = f64;

    fn fitness(&self) -> f64 {
        self.fitness
    }

    fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
    }
}

/// Route choice as a GA problem: one gene per group, gene `i` ranging over
/// the routes of group `i`'s OD pair, fitness = average travel time.
#[derive(Debug, Clone)]
pub struct RouteChoiceProblem {
    engine: CostEvaluationEngine,
    domains: Vec<usize>,
}

impl RouteChoiceProblem {
    pub fn new(engine: CostEvaluationEngine) -> Self {
        let domains = engine.network().route_counts();
        Self { engine, domains }
    }

    pub fn engine(&self) -> &CostEvaluationEngine {
        &self.engine
    }

    /// Number of routes per gene.
    pub fn domains(&self) -> &[usize] {
        &self.domains
    }
}

impl GaProblem for RouteChoiceProblem {
    type Individual = CandidateSolution;
    type Error = RouteChoiceError;

    fn create_individual<R: Rng>(&self, rng: &mut R) -> CandidateSolution {
        CandidateSolution::new(random_genes(&self.domains, rng))
    }

    fn evaluate(&self, individual: &CandidateSolution) -> Result<f64> {
        self.engine.average_travel_time(&individual.genes)
    }

    fn crossover<R: Rng>(
        &self,
        parent1: &CandidateSolution,
        parent2: &CandidateSolution,
        rng: &mut R,
    ) -> Vec<CandidateSolution> {
        let (c1, c2) = single_point_crossover(&parent1.genes, &parent2.genes, rng);
        vec![CandidateSolution::new(c1), CandidateSolution::new(c2)]
    }

    fn mutate<R: Rng>(&self, individual: &mut CandidateSolution, rate: f64, rng: &mut R) {
        random_reset_mutation(&mut individual.genes, &self.domains, rate, rng);
    }
}
