//! Stateless tabular Q-learning over route choices.
//!
//! Each driver group keeps one Q-value per candidate route of its OD pair.
//! An episode lets every group pick a route, evaluates the joint assignment
//! and updates the chosen entries with reward `-travel_time`:
//!
//! ```text
//! Q[g][a] <- (1 - alpha) * Q[g][a] + alpha * (-t_g)
//! ```
//!
//! Epsilon is multiplied by `decay` after every episode, guided or free.
//!
//! # References
//!
//! - Watkins & Dayan (1992), "Q-learning"
//! - Claus & Boutilier (1998), "The Dynamics of Reinforcement Learning in
//!   Cooperative Multiagent Systems"

use super::config::{ActionSelection, QLearningConfig, QTableInit};
use super::coupling::read_coupling_file;
use super::types::{Episode, EpisodeRunner};
use crate::error::{Result, RouteChoiceError};
use crate::evaluation::{CostEvaluationEngine, Evaluation};
use crate::random::rng_from;
use rand::rngs::StdRng;
use rand::Rng;
use tracing::trace;

/// Q-learner driving one route choice per group.
#[derive(Debug)]
pub struct QLearner {
    engine: CostEvaluationEngine,
    config: QLearningConfig,
    q: Vec<Vec<f64>>,
    epsilon: f64,
    episodes: usize,
    rng: StdRng,
}

impl QLearner {
    /// Creates a learner and fills its Q-table.
    ///
    /// # Errors
    /// `Configuration` for invalid parameters or a coupling file that does
    /// not cover every OD pair; `Resource` if the coupling file cannot be
    /// read.
    pub fn new(
        engine: CostEvaluationEngine,
        config: QLearningConfig,
        seed: Option<u64>,
    ) -> Result<Self> {
        config.validate().map_err(RouteChoiceError::Configuration)?;
        let mut rng = rng_from(seed);
        let q = initial_table(&engine, &config.table_init, &mut rng)?;
        Ok(Self {
            epsilon: config.epsilon,
            engine,
            config,
            q,
            episodes: 0,
            rng,
        })
    }

    /// Q-values per group, indexed by route.
    pub fn q_table(&self) -> &[Vec<f64>] {
        &self.q
    }

    /// Current exploration rate.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Episodes run so far.
    pub fn episodes(&self) -> usize {
        self.episodes
    }

    pub fn config(&self) -> &QLearningConfig {
        &self.config
    }

    fn choose(&mut self, group: usize) -> usize {
        let values = &self.q[group];
        match self.config.action_selection {
            ActionSelection::EpsilonGreedy => {
                if self.rng.random_bool(self.epsilon) {
                    self.rng.random_range(0..values.len())
                } else {
                    let best = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    let ties: Vec<usize> = (0..values.len()).filter(|&a| values[a] == best).collect();
                    ties[self.rng.random_range(0..ties.len())]
                }
            }
            ActionSelection::Boltzmann { temperature } => {
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let weights: Vec<f64> = values
                    .iter()
                    .map(|&v| ((v - max) / temperature).exp())
                    .collect();
                let total: f64 = weights.iter().sum();
                let threshold = self.rng.random_range(0.0..total);
                let mut cumulative = 0.0;
                for (action, w) in weights.iter().enumerate() {
                    cumulative += w;
                    if cumulative > threshold {
                        return action;
                    }
                }
                values.len() - 1
            }
        }
    }

    fn learn(&mut self, assignment: &[usize], evaluation: &Evaluation) {
        let alpha = self.config.alpha;
        for (group, (&action, &time)) in assignment.iter().zip(&evaluation.group_times).enumerate() {
            let entry = &mut self.q[group][action];
            *entry = (1.0 - alpha) * *entry + alpha * -time;
        }
        self.epsilon *= self.config.decay;
        self.episodes += 1;
        trace!(
            episode = self.episodes,
            average = evaluation.average,
            epsilon = self.epsilon,
            "q-learning episode"
        );
    }
}

impl EpisodeRunner for QLearner {
    fn run_free_episode(&mut self) -> Result<Episode> {
        let assignment: Vec<usize> = (0..self.q.len()).map(|g| self.choose(g)).collect();
        let evaluation = self.engine.evaluate(&assignment)?;
        self.learn(&assignment, &evaluation);
        Ok(Episode {
            average_travel_time: evaluation.average,
            assignment,
        })
    }

    fn run_guided_episode(&mut self, seed: &[usize]) -> Result<Episode> {
        let evaluation = self.engine.evaluate(seed)?;
        self.learn(seed, &evaluation);
        Ok(Episode {
            assignment: seed.to_vec(),
            average_travel_time: evaluation.average,
        })
    }
}

fn initial_table<R: Rng>(
    engine: &CostEvaluationEngine,
    init: &QTableInit,
    rng: &mut R,
) -> Result<Vec<Vec<f64>>> {
    let net = engine.network();
    let per_od: Vec<Vec<f64>> = match init {
        QTableInit::Fixed { value } => net
            .od_pairs()
            .iter()
            .map(|od| vec![*value; od.route_count()])
            .collect(),
        QTableInit::Random { min, max } => {
            // Drawn independently for every group.
            return Ok(net
                .groups()
                .iter()
                .map(|g| {
                    (0..net.od(g.od).route_count())
                        .map(|_| if min == max { *min } else { rng.random_range(*min..=*max) })
                        .collect()
                })
                .collect());
        }
        QTableInit::Coupling { path } => {
            let table = read_coupling_file(path)?;
            net.od_pairs()
                .iter()
                .map(|od| {
                    let concatenated = format!("{}{}", od.origin, od.destination);
                    let values = table
                        .get(&od.label())
                        .or_else(|| table.get(&concatenated))
                        .ok_or_else(|| {
                            RouteChoiceError::config(format!(
                                "coupling file {} has no entry for OD {}",
                                path.display(),
                                od.label()
                            ))
                        })?;
                    if values.len() < od.route_count() {
                        return Err(RouteChoiceError::config(format!(
                            "coupling entry for OD {} has {} values, {} routes needed",
                            od.label(),
                            values.len(),
                            od.route_count()
                        )));
                    }
                    Ok(values[..od.route_count()].to_vec())
                })
                .collect::<Result<_>>()?
        }
    };
    Ok(net.groups().iter().map(|g| per_od[g.od.0].clone()).collect())
}
