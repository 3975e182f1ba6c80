//! Episode abstraction shared by the hybrid loop and the learners.

use crate::error::Result;

/// Outcome of one learning episode.
#[derive(Debug, Clone, PartialEq)]
pub struct Episode {
    /// One route index per driver group.
    pub assignment: Vec<usize>,
    /// Average travel time of `assignment` as evaluated by the learner.
    pub average_travel_time: f64,
}

/// A reinforcement-learning process that produces assignments on demand.
///
/// Calls are synchronous; the caller blocks until the episode is done.
pub trait EpisodeRunner {
    /// Runs an episode driven only by the learner's own policy.
    fn run_free_episode(&mut self) -> Result<Episode>;

    /// Runs an episode seeded with an externally found assignment.
    fn run_guided_episode(&mut self, seed: &[usize]) -> Result<Episode>;
}
