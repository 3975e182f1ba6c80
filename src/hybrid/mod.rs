//! GA / Q-learning cooperation.
//!
//! A [`HybridCoordinator`] is installed as the GA runner's generation hook.
//! Depending on its [`HybridMode`] it injects Q-learning episodes into the
//! ranked population and reports every generation.

mod coordinator;
mod types;

pub use coordinator::HybridCoordinator;
pub use types::{EpisodeKind, HybridEvent, HybridMode};
