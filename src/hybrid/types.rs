//! Operating modes and events of the hybrid loop.

use crate::error::{Result, RouteChoiceError};
use crate::report::ReportKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the GA and the Q-learner cooperate. Fixed for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HybridMode {
    /// GA alone; the hook only records progress.
    GaOnly,
    /// Q-learning alone, one episode per step. Does not use the GA.
    QlOnly,
    /// Every generation a free QL episode is injected into the population.
    QlSeedsGa,
    /// Like [`QlSeedsGa`](Self::QlSeedsGa), but every `interval`
    /// generations the QL episode is guided by the GA's best individual.
    QlGaExchange { interval: usize },
}

/// Kind of QL episode requested for a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeKind {
    Free,
    Guided,
}

impl HybridMode {
    /// Maps the numeric experiment types `1..=4` (QL, GA, QL→GA, GA↔QL).
    ///
    /// `interval` is required by type 4 only.
    pub fn from_experiment_type(experiment_type: u8, interval: Option<usize>) -> Result<Self> {
        match experiment_type {
            1 => Ok(HybridMode::QlOnly),
            2 => Ok(HybridMode::GaOnly),
            3 => Ok(HybridMode::QlSeedsGa),
            4 => interval
                .map(|interval| HybridMode::QlGaExchange { interval })
                .ok_or_else(|| RouteChoiceError::config("experiment type 4 requires an interval")),
            other => Err(RouteChoiceError::config(format!(
                "unknown experiment type {other}, expected 1-4"
            ))),
        }
    }

    pub fn uses_ga(&self) -> bool {
        !matches!(self, HybridMode::QlOnly)
    }

    pub fn uses_ql(&self) -> bool {
        !matches!(self, HybridMode::GaOnly)
    }

    /// Whether QL solutions are injected into the GA population.
    pub fn is_hybrid(&self) -> bool {
        self.uses_ga() && self.uses_ql()
    }

    /// Directory name of this mode's logs.
    pub fn label(&self) -> &'static str {
        match self {
            HybridMode::QlOnly => "QL",
            HybridMode::GaOnly => "GA",
            HybridMode::QlSeedsGa => "QLGA",
            HybridMode::QlGaExchange { .. } => "GAQL",
        }
    }

    pub fn report_kind(&self) -> ReportKind {
        match self {
            HybridMode::QlOnly => ReportKind::QlOnly,
            HybridMode::GaOnly => ReportKind::GaOnly,
            HybridMode::QlSeedsGa | HybridMode::QlGaExchange { .. } => ReportKind::Hybrid,
        }
    }

    /// Episode requested at `generation`, or `None` for modes that do not
    /// inject. An interval of 0 (rejected by [`validate`](Self::validate))
    /// schedules like 1.
    pub fn episode_kind(&self, generation: usize) -> Option<EpisodeKind> {
        match *self {
            HybridMode::GaOnly | HybridMode::QlOnly => None,
            HybridMode::QlSeedsGa => Some(EpisodeKind::Free),
            HybridMode::QlGaExchange { interval } => {
                if generation != 0 && (generation + 1) % interval.max(1) == 0 {
                    Some(EpisodeKind::Guided)
                } else {
                    Some(EpisodeKind::Free)
                }
            }
        }
    }

    /// Checks the mode against the population size.
    ///
    /// Injection needs distinct best, second-best and worst slots, so
    /// hybrid modes require at least 3 individuals.
    pub fn validate(&self, population_size: usize) -> Result<()> {
        if let HybridMode::QlGaExchange { interval: 0 } = self {
            return Err(RouteChoiceError::config("exchange interval must be at least 1"));
        }
        if self.is_hybrid() && population_size < 3 {
            return Err(RouteChoiceError::config(format!(
                "{} needs a population of at least 3, got {population_size}",
                self.label()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for HybridMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HybridMode::QlGaExchange { interval } => write!(f, "GAQL(interval={interval})"),
            other => f.write_str(other.label()),
        }
    }
}

/// Notable event raised during injection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HybridEvent {
    /// The QL score was strictly lower than the GA's best fitness.
    BestBeaten {
        generation: usize,
        ql_score: f64,
        best_score: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_experiment_types() {
        assert_eq!(HybridMode::from_experiment_type(1, None).unwrap(), HybridMode::QlOnly);
        assert_eq!(HybridMode::from_experiment_type(2, Some(3)).unwrap(), HybridMode::GaOnly);
        assert_eq!(HybridMode::from_experiment_type(3, None).unwrap(), HybridMode::QlSeedsGa);
        assert_eq!(
            HybridMode::from_experiment_type(4, Some(5)).unwrap(),
            HybridMode::QlGaExchange { interval: 5 }
        );
        assert!(HybridMode::from_experiment_type(4, None).is_err());
        assert!(HybridMode::from_experiment_type(7, None).is_err());
    }

    #[test]
    fn test_exchange_schedule() {
        let mode = HybridMode::QlGaExchange { interval: 3 };
        let guided: Vec<usize> = (0..10)
            .filter(|&g| mode.episode_kind(g) == Some(EpisodeKind::Guided))
            .collect();
        assert_eq!(guided, vec![2, 5, 8]);
    }

    #[test]
    fn test_exchange_interval_one_skips_generation_zero() {
        let mode = HybridMode::QlGaExchange { interval: 1 };
        assert_eq!(mode.episode_kind(0), Some(EpisodeKind::Free));
        assert!((1..20).all(|g| mode.episode_kind(g) == Some(EpisodeKind::Guided)));
    }

    #[test]
    fn test_unvalidated_zero_interval_schedules_like_one() {
        let zero = HybridMode::QlGaExchange { interval: 0 };
        let one = HybridMode::QlGaExchange { interval: 1 };
        assert!((0..10).all(|g| zero.episode_kind(g) == one.episode_kind(g)));
    }

    #[test]
    fn test_seeds_always_free_and_ga_only_never_injects() {
        assert!((0..10).all(|g| HybridMode::QlSeedsGa.episode_kind(g) == Some(EpisodeKind::Free)));
        assert_eq!(HybridMode::GaOnly.episode_kind(4), None);
        assert_eq!(HybridMode::QlOnly.episode_kind(4), None);
    }

    #[test]
    fn test_validate_population_and_interval() {
        assert!(HybridMode::QlSeedsGa.validate(2).is_err());
        assert!(HybridMode::QlSeedsGa.validate(3).is_ok());
        assert!(HybridMode::GaOnly.validate(2).is_ok());
        assert!(HybridMode::QlGaExchange { interval: 0 }.validate(10).is_err());
    }

    #[test]
    fn test_yaml_representation() {
        let mode: HybridMode = serde_yaml::from_str("kind: ql_ga_exchange\ninterval: 4").unwrap();
        assert_eq!(mode, HybridMode::QlGaExchange { interval: 4 });
        assert_eq!(mode.to_string(), "GAQL(interval=4)");
    }
}
