//! Q-learning configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// How the Q-table is filled before the first episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QTableInit {
    /// Every entry set to `value`.
    Fixed { value: f64 },
    /// Every entry drawn uniformly from `[min, max]`.
    Random { min: f64, max: f64 },
    /// Per-OD values read from a coupling file (`<OD> v1 v2 ...` per line).
    Coupling { path: PathBuf },
}

impl Default for QTableInit {
    fn default() -> Self {
        QTableInit::Fixed { value: 0.0 }
    }
}

impl fmt::Display for QTableInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QTableInit::Fixed { value } => write!(f, "fixed\tFixed value={value}"),
            QTableInit::Random { min, max } => write!(f, "random\tMin={min}\tMax={max}"),
            QTableInit::Coupling { path } => write!(f, "coupling\tFile={}", path.display()),
        }
    }
}

/// Route selection policy of each group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionSelection {
    /// Random route with probability epsilon, best known route otherwise.
    EpsilonGreedy,
    /// Route drawn with probability proportional to `exp(Q / temperature)`.
    Boltzmann { temperature: f64 },
}

impl Default for ActionSelection {
    fn default() -> Self {
        ActionSelection::EpsilonGreedy
    }
}

/// Parameters of a [`QLearner`](super::QLearner).
///
/// ```
/// use u_routechoice::learning::{ActionSelection, QLearningConfig};
///
/// let config = QLearningConfig::default()
///     .with_alpha(0.5)
///     .with_action_selection(ActionSelection::Boltzmann { temperature: 2.0 });
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QLearningConfig {
    /// Learning rate in `(0, 1]`.
    pub alpha: f64,
    /// Factor applied to epsilon after every episode, in `(0, 1]`.
    pub decay: f64,
    /// Initial exploration rate in `[0, 1]`.
    pub epsilon: f64,
    pub action_selection: ActionSelection,
    pub table_init: QTableInit,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        Self {
            alpha: 0.9,
            decay: 0.99,
            epsilon: 1.0,
            action_selection: ActionSelection::default(),
            table_init: QTableInit::default(),
        }
    }
}

impl QLearningConfig {
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_decay(mut self, decay: f64) -> Self {
        self.decay = decay;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_action_selection(mut self, selection: ActionSelection) -> Self {
        self.action_selection = selection;
        self
    }

    pub fn with_table_init(mut self, init: QTableInit) -> Self {
        self.table_init = init;
        self
    }

    /// Returns `Err` with a description if any parameter is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(format!("alpha must be within (0, 1], got {}", self.alpha));
        }
        if !(self.decay > 0.0 && self.decay <= 1.0) {
            return Err(format!("decay must be within (0, 1], got {}", self.decay));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(format!("epsilon must be within [0, 1], got {}", self.epsilon));
        }
        if let ActionSelection::Boltzmann { temperature } = self.action_selection {
            if !(temperature > 0.0 && temperature.is_finite()) {
                return Err(format!("temperature must be positive, got {temperature}"));
            }
        }
        match &self.table_init {
            QTableInit::Fixed { value } if !value.is_finite() => {
                Err("fixed Q-table value must be finite".into())
            }
            QTableInit::Random { min, max } if !(min <= max && min.is_finite() && max.is_finite()) => {
                Err(format!("random Q-table range [{min}, {max}] is invalid"))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = QLearningConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.table_init, QTableInit::Fixed { value: 0.0 });
        assert_eq!(config.action_selection, ActionSelection::EpsilonGreedy);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert!(QLearningConfig::default().with_alpha(0.0).validate().is_err());
        assert!(QLearningConfig::default().with_decay(1.5).validate().is_err());
        assert!(QLearningConfig::default().with_epsilon(-0.1).validate().is_err());
        assert!(QLearningConfig::default()
            .with_action_selection(ActionSelection::Boltzmann { temperature: 0.0 })
            .validate()
            .is_err());
        assert!(QLearningConfig::default()
            .with_table_init(QTableInit::Random { min: 1.0, max: 0.0 })
            .validate()
            .is_err());
    }

    #[test]
    fn test_yaml_tagged_variants() {
        let yaml = "
alpha: 0.5
action_selection:
  kind: boltzmann
  temperature: 3.0
table_init:
  kind: random
  min: -2.0
  max: 0.0
";
        let config: QLearningConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.alpha, 0.5);
        assert_eq!(config.decay, 0.99);
        assert_eq!(
            config.action_selection,
            ActionSelection::Boltzmann { temperature: 3.0 }
        );
        assert_eq!(config.table_init, QTableInit::Random { min: -2.0, max: 0.0 });
    }
}
