//! Genetic Algorithm engine.
//!
//! A generic GA built on trait-based abstractions. A problem is defined by
//! implementing [`GaProblem`]; an outside process can take part in every
//! generation through a [`GenerationHook`].
//!
//! # Core Traits
//!
//! - [`Individual`]: A candidate solution with associated fitness type
//! - [`GaProblem`]: Problem definition (initialization, evaluation, operators)
//! - [`GenerationHook`]: Per-generation access to the ranked population
//!
//! # Key Types
//!
//! - [`GaConfig`]: Algorithm parameters (population size, selection, elites)
//! - [`GaRunner`]: Executes the evolutionary loop
//! - [`GaResult`]: Final optimization result with statistics
//!
//! # Submodules
//!
//! - [`operators`]: Integer-vector crossover and mutation operators
//!
//! # References
//!
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*

mod config;
pub mod operators;
mod runner;
mod selection;
mod types;

pub use config::GaConfig;
pub use runner::{GaResult, GaRunner};
pub use selection::Selection;
pub use types::{Fitness, GaProblem, GenerationHook, Individual};
