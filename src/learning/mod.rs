//! Reinforcement learning over route choices.
//!
//! The hybrid loop only sees the [`EpisodeRunner`] trait; [`QLearner`] is
//! the tabular implementation used by the experiments.
//!
//! # Key Types
//!
//! - [`QLearningConfig`]: learning rate, epsilon decay, action selection,
//!   Q-table initialization
//! - [`QLearner`]: one Q-row per driver group
//! - [`Episode`]: assignment plus its average travel time

mod config;
pub mod coupling;
mod learner;
mod types;

pub use config::{ActionSelection, QLearningConfig, QTableInit};
pub use learner::QLearner;
pub use types::{Episode, EpisodeRunner};
