//! Experiment configuration and sweep expansion.
//!
//! An [`ExperimentConfig`] holds list-valued parameters; [`ExperimentConfig::runs`]
//! expands them into one [`RunConfig`] per combination and repetition.

use crate::error::{Result, RouteChoiceError};
use crate::ga::{GaConfig, Selection};
use crate::hybrid::HybridMode;
use crate::learning::{ActionSelection, QLearningConfig, QTableInit};
use crate::report::ReportFlags;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// A parameter sweep, usually read from YAML.
///
/// ```
/// use u_routechoice::experiment::ExperimentConfig;
///
/// let config = ExperimentConfig::from_yaml_str(
///     "network: nets/two.net\nexperiment_type: 3\ngenerations: 10\nalphas: [0.5, 0.9]",
/// )
/// .unwrap();
/// assert_eq!(config.runs().unwrap().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Network file.
    pub network: PathBuf,
    /// Name used in log paths; defaults to the network file stem.
    pub network_name: Option<String>,
    /// 1 = QL, 2 = GA, 3 = QL seeds GA, 4 = GA and QL exchange.
    pub experiment_type: u8,
    /// GA generations, or QL episodes for experiment type 1.
    pub generations: usize,
    pub population: usize,
    pub elite_size: usize,
    pub selection: Selection,
    pub group_sizes: Vec<usize>,
    pub alphas: Vec<f64>,
    pub decays: Vec<f64>,
    pub crossovers: Vec<f64>,
    pub mutations: Vec<f64>,
    pub ks: Vec<usize>,
    /// Exchange intervals; only meaningful for experiment type 4.
    pub intervals: Vec<Option<usize>>,
    pub repetitions: usize,
    pub epsilon: f64,
    pub action_selection: ActionSelection,
    pub table_init: QTableInit,
    /// Flow at which free-flow costs are measured for routing.
    pub base_flow: f64,
    pub report: ReportFlags,
    /// Root directory of the logs.
    pub output: PathBuf,
    /// Base seed; run `i` uses `seed + i`.
    pub seed: Option<u64>,
    /// Runs executed concurrently.
    pub number_of_processes: usize,
    /// Evaluate GA offspring in parallel.
    pub parallel_evaluation: bool,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            network: PathBuf::from("networks/braess.net"),
            network_name: None,
            experiment_type: 1,
            generations: 400,
            population: 100,
            elite_size: 5,
            selection: Selection::Rank,
            group_sizes: vec![100],
            alphas: vec![0.9],
            decays: vec![0.99],
            crossovers: vec![0.2],
            mutations: vec![0.001],
            ks: vec![8],
            intervals: vec![None],
            repetitions: 1,
            epsilon: 1.0,
            action_selection: ActionSelection::default(),
            table_init: QTableInit::default(),
            base_flow: 0.0,
            report: ReportFlags::default(),
            output: PathBuf::from("results_gaql_grouped"),
            seed: None,
            number_of_processes: 1,
            parallel_evaluation: true,
        }
    }
}

impl ExperimentConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text =
            std::fs::read_to_string(path).map_err(|e| RouteChoiceError::resource(path, e))?;
        Self::from_yaml_str(&text)
    }

    /// Name of the network in log paths.
    pub fn network_name(&self) -> String {
        self.network_name.clone().unwrap_or_else(|| {
            self.network
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "network".to_string())
        })
    }

    /// Expands the sweep into individual runs.
    ///
    /// Parameters the selected mode does not use collapse to their first
    /// value, so no two runs differ only in an ignored parameter.
    ///
    /// # Errors
    /// `Configuration` for an unknown experiment type, an empty parameter
    /// list, a missing interval in exchange mode or an invalid run.
    pub fn runs(&self) -> Result<Vec<RunConfig>> {
        if self.repetitions == 0 {
            return Err(RouteChoiceError::config("repetitions must be at least 1"));
        }
        let first_mode = HybridMode::from_experiment_type(
            self.experiment_type,
            self.intervals.first().copied().flatten().or(Some(1)),
        )?;

        let group_sizes = non_empty("group_sizes", &self.group_sizes)?;
        let ks = non_empty("ks", &self.ks)?;
        let alphas = used("alphas", &self.alphas, first_mode.uses_ql())?;
        let decays = used("decays", &self.decays, first_mode.uses_ql())?;
        let crossovers = used("crossovers", &self.crossovers, first_mode.uses_ga())?;
        let mutations = used("mutations", &self.mutations, first_mode.uses_ga())?;
        let exchange = matches!(first_mode, HybridMode::QlGaExchange { .. });
        if !exchange && self.intervals.iter().any(Option::is_some) {
            warn!(
                experiment_type = self.experiment_type,
                "intervals are ignored outside experiment type 4"
            );
        }
        let intervals = used("intervals", &self.intervals, exchange)?;

        let network_name = self.network_name();
        let mut runs = Vec::new();
        for &group_size in group_sizes {
            for &k in ks {
                for &alpha in alphas {
                    for &decay in decays {
                        for &crossover in crossovers {
                            for &mutation in mutations {
                                for &interval in intervals {
                                    let mode = HybridMode::from_experiment_type(
                                        self.experiment_type,
                                        interval,
                                    )?;
                                    for repetition in 0..self.repetitions {
                                        let seed = self
                                            .seed
                                            .map(|s| s.wrapping_add(runs.len() as u64));
                                        let run = RunConfig {
                                            network: self.network.clone(),
                                            network_name: network_name.clone(),
                                            mode,
                                            generations: self.generations,
                                            population: self.population,
                                            elite_size: self.elite_size,
                                            selection: self.selection,
                                            group_size,
                                            k,
                                            alpha,
                                            decay,
                                            crossover,
                                            mutation,
                                            repetition,
                                            epsilon: self.epsilon,
                                            action_selection: self.action_selection,
                                            table_init: self.table_init.clone(),
                                            report: self.report,
                                            output: self.output.clone(),
                                            seed,
                                            parallel_evaluation: self.parallel_evaluation,
                                        };
                                        run.validate()?;
                                        runs.push(run);
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
        Ok(runs)
    }
}

fn non_empty<'a, T>(name: &str, values: &'a [T]) -> Result<&'a [T]> {
    if values.is_empty() {
        Err(RouteChoiceError::config(format!("{name} must not be empty")))
    } else {
        Ok(values)
    }
}

/// All values when the mode uses the parameter, the first one otherwise.
fn used<'a, T>(name: &str, values: &'a [T], in_use: bool) -> Result<&'a [T]> {
    let values = non_empty(name, values)?;
    Ok(if in_use { values } else { &values[..1] })
}

/// One fully specified run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub network: PathBuf,
    pub network_name: String,
    pub mode: HybridMode,
    pub generations: usize,
    pub population: usize,
    pub elite_size: usize,
    pub selection: Selection,
    pub group_size: usize,
    pub k: usize,
    pub alpha: f64,
    pub decay: f64,
    pub crossover: f64,
    pub mutation: f64,
    pub repetition: usize,
    pub epsilon: f64,
    pub action_selection: ActionSelection,
    pub table_init: QTableInit,
    pub report: ReportFlags,
    pub output: PathBuf,
    pub seed: Option<u64>,
    pub parallel_evaluation: bool,
}

impl RunConfig {
    pub fn ga_config(&self) -> GaConfig {
        let config = GaConfig::default()
            .with_population_size(self.population)
            .with_max_generations(self.generations)
            .with_selection(self.selection)
            .with_elite_count(self.elite_size)
            .with_crossover_rate(self.crossover)
            .with_mutation_rate(self.mutation)
            .with_parallel(self.parallel_evaluation);
        match self.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }

    pub fn ql_config(&self) -> QLearningConfig {
        QLearningConfig::default()
            .with_alpha(self.alpha)
            .with_decay(self.decay)
            .with_epsilon(self.epsilon)
            .with_action_selection(self.action_selection)
            .with_table_init(self.table_init.clone())
    }

    /// Seed of the run's learner, distinct from the GA seed.
    pub fn learner_seed(&self) -> Option<u64> {
        self.seed.map(|s| s.wrapping_add(0x9E37_79B9_7F4A_7C15))
    }

    /// Checks everything that can be checked without the network.
    pub fn validate(&self) -> Result<()> {
        if self.generations == 0 {
            return Err(RouteChoiceError::config("generations must be at least 1"));
        }
        if self.group_size == 0 {
            return Err(RouteChoiceError::config("group size must be at least 1"));
        }
        if self.k == 0 {
            return Err(RouteChoiceError::config("k must be at least 1"));
        }
        if self.report.interval == 0 {
            return Err(RouteChoiceError::config("print interval must be at least 1"));
        }
        if self.mode.uses_ga() {
            self.mode.validate(self.population)?;
            self.ga_config()
                .validate()
                .map_err(RouteChoiceError::Configuration)?;
        }
        if self.mode.uses_ql() {
            self.ql_config()
                .validate()
                .map_err(RouteChoiceError::Configuration)?;
        }
        Ok(())
    }

    /// Directory of this run's log.
    pub fn log_dir(&self) -> PathBuf {
        let mut dir = self
            .output
            .join(format!("net_{}", self.network_name))
            .join(self.mode.label());
        match self.mode {
            HybridMode::QlOnly => {
                dir.push(format!("decay{:.3}", self.decay));
                dir.push(format!("alpha{:.3}", self.alpha));
            }
            HybridMode::GaOnly => {
                dir.push(format!("pm{:.4}", self.mutation));
                dir.push(format!("crossover_{:.2}", self.crossover));
            }
            HybridMode::QlSeedsGa | HybridMode::QlGaExchange { .. } => {
                dir.push(format!("pm{:.4}", self.mutation));
                dir.push(format!("crossover_{:.2}", self.crossover));
                dir.push(format!("decay{:.3}", self.decay));
                dir.push(format!("alpha{:.2}", self.alpha));
            }
        }
        dir
    }

    /// Log file name without the time tag.
    pub fn log_stem(&self) -> String {
        let name = &self.network_name;
        match self.mode {
            HybridMode::QlOnly => {
                format!("{name}_k{}_a{}_d{}", self.k, self.alpha, self.decay)
            }
            HybridMode::GaOnly => self.ga_stem(),
            HybridMode::QlSeedsGa => format!("{}_a{}_d{}", self.ga_stem(), self.alpha, self.decay),
            HybridMode::QlGaExchange { interval } => format!(
                "{}_a{}_d{}_interval{interval}",
                self.ga_stem(),
                self.alpha,
                self.decay
            ),
        }
    }

    fn ga_stem(&self) -> String {
        format!(
            "{}_pm{}_c{}_e{}_k{}",
            self.network_name, self.mutation, self.crossover, self.elite_size, self.k
        )
    }

    /// `(name, value)` pairs of the log header.
    pub fn parameters(&self, num_travelers: usize) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = Vec::new();
        let mut push = |name: &str, value: String| params.push((name.to_string(), value));

        if self.mode.uses_ga() {
            push("Population", self.population.to_string());
            push("Mutation", self.mutation.to_string());
            push("Crossover", self.crossover.to_string());
            push("Elite", self.elite_size.to_string());
            push("Selection", format!("{:?}", self.selection));
        }
        push("Group size", self.group_size.to_string());
        push("k", self.k.to_string());
        push("Number of drivers", num_travelers.to_string());
        if self.mode.uses_ql() {
            push("Alpha", self.alpha.to_string());
            push("Decay", self.decay.to_string());
            match self.action_selection {
                ActionSelection::EpsilonGreedy => push("Epsilon", self.epsilon.to_string()),
                ActionSelection::Boltzmann { temperature } => {
                    push("Temperature", temperature.to_string())
                }
            }
            push("QL table init", self.table_init.to_string());
        }
        if let HybridMode::QlGaExchange { interval } = self.mode {
            push("GA<->QL interval", interval.to_string());
        }
        if let Some(seed) = self.seed {
            push("Seed", seed.to_string());
        }
        params
    }
}
