//! routechoice: command-line driver for route-choice experiments.
//!
//! Reads an optional YAML experiment file, applies command-line overrides
//! and runs the resulting sweep. Log verbosity follows `RUST_LOG`
//! (default `info`).

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use u_routechoice::experiment::{run_sweep, ExperimentConfig};

#[derive(Parser, Debug)]
#[command(name = "routechoice")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Experiment file (YAML); command-line options override it.
    config: Option<PathBuf>,

    /// Network file.
    #[arg(long, value_name = "FILE")]
    network: Option<PathBuf>,

    /// Network name used in log paths (defaults to the file stem).
    #[arg(long)]
    network_name: Option<String>,

    /// 1 = QL, 2 = GA, 3 = QL builds solutions for the GA, 4 = GA and QL exchange.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=4))]
    experiment_type: Option<u8>,

    /// GA generations, or QL episodes for experiment type 1.
    #[arg(short, long)]
    generations: Option<usize>,

    /// GA population size.
    #[arg(short, long)]
    population: Option<usize>,

    /// Individuals kept unchanged between generations.
    #[arg(short, long)]
    elite_size: Option<usize>,

    /// Group sizes, one run per value.
    #[arg(long, num_args = 1..)]
    grouping: Option<Vec<usize>>,

    /// Learning rates.
    #[arg(short, long, num_args = 1..)]
    alphas: Option<Vec<f64>>,

    /// Epsilon decays.
    #[arg(long, num_args = 1..)]
    decays: Option<Vec<f64>>,

    /// Crossover rates.
    #[arg(short, long, num_args = 1..)]
    crossovers: Option<Vec<f64>>,

    /// Mutation rates.
    #[arg(short, long, num_args = 1..)]
    mutations: Option<Vec<f64>>,

    /// Number of shortest routes per OD pair.
    #[arg(long, num_args = 1..)]
    ks: Option<Vec<usize>>,

    /// GA/QL exchange intervals (experiment type 4).
    #[arg(long, num_args = 1..)]
    intervals: Option<Vec<usize>>,

    /// Repetitions of every configuration.
    #[arg(long)]
    repetitions: Option<usize>,

    /// Configurations run in parallel.
    #[arg(long)]
    number_of_processes: Option<usize>,

    /// Root directory of the logs.
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Base random seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Log the travel time of every edge.
    #[arg(long)]
    print_travel_time: bool,

    /// Log the number of drivers on every edge.
    #[arg(short = 'd', long)]
    print_drivers_per_link: bool,

    /// Log the average travel time of every OD pair.
    #[arg(long)]
    print_pair_od: bool,

    /// Log how many groups take each route.
    #[arg(long)]
    print_drivers_per_route: bool,

    /// Log every n-th step only.
    #[arg(short = 'i', long)]
    print_interval: Option<usize>,
}

impl Cli {
    fn experiment(&self) -> anyhow::Result<ExperimentConfig> {
        let mut config = match &self.config {
            Some(path) => ExperimentConfig::from_file(path)
                .with_context(|| format!("cannot load {}", path.display()))?,
            None => ExperimentConfig::default(),
        };

        macro_rules! apply {
            ($($field:ident => $target:ident),* $(,)?) => {
                $(if let Some(value) = self.$field.clone() {
                    config.$target = value;
                })*
            };
        }
        apply!(
            network => network,
            experiment_type => experiment_type,
            generations => generations,
            population => population,
            elite_size => elite_size,
            grouping => group_sizes,
            alphas => alphas,
            decays => decays,
            crossovers => crossovers,
            mutations => mutations,
            ks => ks,
            repetitions => repetitions,
            number_of_processes => number_of_processes,
            output => output,
        );
        if let Some(name) = &self.network_name {
            config.network_name = Some(name.clone());
        }
        if let Some(intervals) = &self.intervals {
            config.intervals = intervals.iter().copied().map(Some).collect();
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(interval) = self.print_interval {
            config.report.interval = interval;
        }
        config.report.edge_travel_times |= self.print_travel_time;
        config.report.edge_flows |= self.print_drivers_per_link;
        config.report.od_pairs |= self.print_pair_od;
        config.report.route_counts |= self.print_drivers_per_route;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.experiment()?;
    let outcomes = run_sweep(&config).context("experiment failed")?;
    for outcome in &outcomes {
        println!(
            "{}\tbest={:.4}\t{}",
            outcome.run.mode,
            outcome.best_score,
            outcome.log_path.display()
        );
    }
    Ok(())
}
