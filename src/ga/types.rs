//! Core trait definitions for the GA engine.
//!
//! [`Individual`] and [`GaProblem`] define the contract between the generic
//! evolutionary loop and a concrete problem; [`GenerationHook`] lets an
//! outside process inspect and rewrite the ranked population once per
//! generation.

use rand::Rng;

/// Marker trait for fitness values.
///
/// Lower fitness is considered better (minimization).
pub trait Fitness: PartialOrd + Copy + Send + Sync + std::fmt::Debug + 'static {
    /// Converts the fitness to `f64` for logging and statistics.
    fn to_f64(self) -> f64;
}

impl Fitness for f64 {
    fn to_f64(self) -> f64 {
        self
    }
}

/// A candidate solution in the GA population.
///
/// Individuals carry their own fitness value. The runner calls
/// [`GaProblem::evaluate`] and stores the result via
/// [`set_fitness`](Individual::set_fitness).
pub trait Individual: Clone + Send + Sync {
    type Fitness: Fitness;

    fn fitness(&self) -> Self::Fitness;

    fn set_fitness(&mut self, fitness: Self::Fitness);
}

/// Defines a GA optimization problem.
///
/// `GaProblem` must be `Send + Sync` because offspring may be evaluated in
/// parallel with rayon.
pub trait GaProblem: Send + Sync {
    type Individual: Individual;

    /// Evaluation failure. The runner stops at the first one.
    type Error: Send;

    /// Creates a random individual for the initial population.
    fn create_individual<R: Rng>(&self, rng: &mut R) -> Self::Individual;

    /// Evaluates an individual and returns its fitness (lower is better).
    fn evaluate(
        &self,
        individual: &Self::Individual,
    ) -> Result<<Self::Individual as Individual>::Fitness, Self::Error>;

    /// Produces one or two offspring by recombining two parents.
    ///
    /// The default implementation clones parent1 (no crossover).
    fn crossover<R: Rng>(
        &self,
        parent1: &Self::Individual,
        _parent2: &Self::Individual,
        _rng: &mut R,
    ) -> Vec<Self::Individual> {
        vec![parent1.clone()]
    }

    /// Mutates an individual in place, touching each gene with probability
    /// `rate`. The default is a no-op.
    fn mutate<R: Rng>(&self, _individual: &mut Self::Individual, _rate: f64, _rng: &mut R) {}
}

/// Per-generation callback of [`GaRunner::run_with_hook`].
///
/// Invoked once per generation with the population ranked ascending by
/// fitness (index 0 is the best). The hook may overwrite individuals but
/// must leave every fitness consistent with its genome; the runner re-ranks
/// afterwards. An error aborts the run.
///
/// Evaluation errors of the problem are converted into the hook's error
/// type, so a run has a single error type.
///
/// [`GaRunner::run_with_hook`]: super::GaRunner::run_with_hook
pub trait GenerationHook<I: Individual> {
    type Error;

    fn on_generation(&mut self, generation: usize, population: &mut [I]) -> Result<(), Self::Error>;
}
