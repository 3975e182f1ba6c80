//! Per-generation injection of QL solutions into the GA population.

use super::types::{EpisodeKind, HybridEvent, HybridMode};
use crate::assignment::CandidateSolution;
use crate::error::{Result, RouteChoiceError};
use crate::evaluation::CostEvaluationEngine;
use crate::ga::GenerationHook;
use crate::learning::EpisodeRunner;
use crate::report::{report_step, StepReporter, StepScores};
use tracing::{debug, info};

/// Generation hook of GA-based runs.
///
/// In hybrid modes each generation asks the learner for an episode, writes
/// its assignment over the worst individual and, when the QL score is
/// strictly lower than the best fitness, over the second best as well.
/// The best individual itself is never overwritten. Every generation is
/// then reported.
#[derive(Debug)]
pub struct HybridCoordinator<L, R> {
    mode: HybridMode,
    engine: CostEvaluationEngine,
    learner: Option<L>,
    reporter: R,
    events: Vec<HybridEvent>,
}

impl<L: EpisodeRunner, R: StepReporter> HybridCoordinator<L, R> {
    /// # Errors
    /// `Configuration` if `mode` is QL-only, if a hybrid mode gets no
    /// learner or if the population is too small for injection.
    pub fn new(
        mode: HybridMode,
        engine: CostEvaluationEngine,
        learner: Option<L>,
        reporter: R,
        population_size: usize,
    ) -> Result<Self> {
        if !mode.uses_ga() {
            return Err(RouteChoiceError::config(
                "QL-only runs have no generations to hook into",
            ));
        }
        mode.validate(population_size)?;
        if mode.is_hybrid() && learner.is_none() {
            return Err(RouteChoiceError::config(format!("{mode} requires a learner")));
        }
        Ok(Self {
            mode,
            engine,
            learner,
            reporter,
            events: Vec::new(),
        })
    }

    pub fn mode(&self) -> HybridMode {
        self.mode
    }

    pub fn events(&self) -> &[HybridEvent] {
        &self.events
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn learner(&self) -> Option<&L> {
        self.learner.as_ref()
    }

    /// Returns the reporter and the events raised during the run.
    pub fn into_parts(self) -> (R, Vec<HybridEvent>) {
        (self.reporter, self.events)
    }

    /// Injects one QL episode into `population` (ranked best first).
    /// Returns the QL-reported score.
    fn inject(
        &mut self,
        generation: usize,
        kind: EpisodeKind,
        population: &mut [CandidateSolution],
    ) -> Result<f64> {
        let learner = self
            .learner
            .as_mut()
            .ok_or_else(|| RouteChoiceError::config("hybrid mode without learner"))?;
        let episode = match kind {
            EpisodeKind::Free => learner.run_free_episode()?,
            EpisodeKind::Guided => learner.run_guided_episode(&population[0].genes)?,
        };
        let ql_score = episode.average_travel_time;
        let best_score = population[0].fitness;

        let worst = population.len() - 1;
        population[worst].genes = episode.assignment;
        population[worst].reevaluate(&self.engine)?;

        if ql_score < best_score {
            population[1].genes = population[worst].genes.clone();
            population[1].reevaluate(&self.engine)?;
            self.events.push(HybridEvent::BestBeaten {
                generation,
                ql_score,
                best_score,
            });
            info!(generation, ql_score, best_score, "QL solution beat the GA best");
        }
        debug!(generation, ?kind, ql_score, "QL solution injected");
        Ok(ql_score)
    }
}

impl<L: EpisodeRunner, R: StepReporter> GenerationHook<CandidateSolution>
    for HybridCoordinator<L, R>
{
    type Error = RouteChoiceError;

    fn on_generation(
        &mut self,
        generation: usize,
        population: &mut [CandidateSolution],
    ) -> Result<()> {
        let ql_score = match self.mode.episode_kind(generation) {
            Some(kind) => Some(self.inject(generation, kind, population)?),
            None => None,
        };

        let best = population
            .iter()
            .min_by(|a, b| a.fitness.total_cmp(&b.fitness))
            .ok_or_else(|| RouteChoiceError::config("empty population"))?;
        let scores = match ql_score {
            Some(ql) => StepScores::Hybrid {
                ga: best.fitness,
                ql,
            },
            None => StepScores::GaOnly { ga: best.fitness },
        };
        report_step(&mut self.reporter, &self.engine, generation, scores, &best.genes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learning::Episode;
    use crate::network::fixtures::two_route_network;
    use crate::report::StepRecord;
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// Replays fixed episodes and records how it was called.
    #[derive(Default)]
    struct Scripted {
        episodes: VecDeque<Episode>,
        guided_seeds: Vec<Vec<usize>>,
        free_calls: usize,
    }

    impl Scripted {
        fn with(episodes: Vec<(Vec<usize>, f64)>) -> Self {
            Self {
                episodes: episodes
                    .into_iter()
                    .map(|(assignment, average_travel_time)| Episode {
                        assignment,
                        average_travel_time,
                    })
                    .collect(),
                ..Self::default()
            }
        }

        fn next(&mut self) -> Result<Episode> {
            self.episodes
                .pop_front()
                .ok_or_else(|| RouteChoiceError::config("script exhausted"))
        }
    }

    impl EpisodeRunner for Scripted {
        fn run_free_episode(&mut self) -> Result<Episode> {
            self.free_calls += 1;
            self.next()
        }

        fn run_guided_episode(&mut self, seed: &[usize]) -> Result<Episode> {
            self.guided_seeds.push(seed.to_vec());
            self.next()
        }
    }

    fn engine() -> CostEvaluationEngine {
        CostEvaluationEngine::new(Arc::new(two_route_network()))
    }

    /// Evaluated and ranked.
    fn population(assignments: &[[usize; 2]]) -> Vec<CandidateSolution> {
        let engine = engine();
        let mut pop: Vec<CandidateSolution> = assignments
            .iter()
            .map(|a| {
                let mut c = CandidateSolution::new(a.to_vec());
                c.reevaluate(&engine).unwrap();
                c
            })
            .collect();
        pop.sort_by(|a, b| a.fitness.total_cmp(&b.fitness));
        pop
    }

    fn coordinator(
        mode: HybridMode,
        learner: Scripted,
        size: usize,
    ) -> HybridCoordinator<Scripted, Vec<StepRecord>> {
        HybridCoordinator::new(mode, engine(), Some(learner), Vec::new(), size).unwrap()
    }

    #[test]
    fn test_better_ql_solution_replaces_worst_and_second_best() {
        let mut pop = population(&[[0, 1], [1, 0], [1, 1], [1, 1]]);
        let mut hook = coordinator(
            HybridMode::QlSeedsGa,
            Scripted::with(vec![(vec![0, 0], 2.0)]),
            pop.len(),
        );
        hook.on_generation(0, &mut pop).unwrap();

        assert_eq!(pop[0].genes, vec![0, 1]);
        assert_eq!(pop[1].genes, vec![0, 0]);
        assert_eq!(pop[1].fitness, 2.0);
        assert_eq!(pop[3].genes, vec![0, 0]);
        assert_eq!(pop[3].fitness, 2.0);
        assert_eq!(
            hook.events(),
            &[HybridEvent::BestBeaten {
                generation: 0,
                ql_score: 2.0,
                best_score: 2.75
            }]
        );
        assert_eq!(
            hook.reporter()[0].scores,
            StepScores::Hybrid { ga: 2.0, ql: 2.0 }
        );
    }

    #[test]
    fn test_worse_ql_solution_only_replaces_worst() {
        let mut pop = population(&[[0, 0], [0, 1], [1, 0], [0, 0]]);
        let before = pop.clone();
        let mut hook = coordinator(
            HybridMode::QlSeedsGa,
            Scripted::with(vec![(vec![1, 1], 4.0)]),
            pop.len(),
        );
        hook.on_generation(0, &mut pop).unwrap();

        assert_eq!(&pop[..3], &before[..3]);
        assert_eq!(pop[3].genes, vec![1, 1]);
        assert_eq!(pop[3].fitness, 4.0);
        assert!(hook.events().is_empty());
    }

    #[test]
    fn test_tie_is_not_better() {
        let mut pop = population(&[[0, 0], [0, 1], [1, 1]]);
        let second = pop[1].clone();
        let mut hook = coordinator(
            HybridMode::QlSeedsGa,
            Scripted::with(vec![(vec![0, 0], 2.0)]),
            pop.len(),
        );
        hook.on_generation(0, &mut pop).unwrap();

        assert_eq!(pop[1], second);
        assert_eq!(pop[2].genes, vec![0, 0]);
        assert!(hook.events().is_empty());
    }

    #[test]
    fn test_fitness_recomputed_not_trusted() {
        // The learner claims 1.0 for an assignment worth 4.0.
        let mut pop = population(&[[0, 0], [0, 1], [1, 0]]);
        let mut hook = coordinator(
            HybridMode::QlSeedsGa,
            Scripted::with(vec![(vec![1, 1], 1.0)]),
            pop.len(),
        );
        hook.on_generation(0, &mut pop).unwrap();

        assert_eq!(pop[2].fitness, 4.0);
        assert_eq!(pop[1].genes, vec![1, 1]);
        assert_eq!(pop[1].fitness, 4.0);
        assert_eq!(pop[0].genes, vec![0, 0]);
        assert_eq!(
            hook.reporter()[0].scores,
            StepScores::Hybrid { ga: 2.0, ql: 1.0 }
        );
    }

    #[test]
    fn test_exchange_guides_with_best_on_schedule() {
        let mut pop = population(&[[0, 0], [0, 1], [1, 1]]);
        let script = (0..6).map(|_| (vec![1, 1], 4.0)).collect();
        let mut hook = coordinator(
            HybridMode::QlGaExchange { interval: 2 },
            Scripted::with(script),
            pop.len(),
        );
        for g in 0..6 {
            hook.on_generation(g, &mut pop).unwrap();
            pop.sort_by(|a, b| a.fitness.total_cmp(&b.fitness));
        }
        let learner = hook.learner().unwrap();
        // Guided at generations 1, 3, 5.
        assert_eq!(learner.guided_seeds, vec![vec![0, 0]; 3]);
        assert_eq!(learner.free_calls, 3);
        assert_eq!(hook.reporter().len(), 6);
    }

    #[test]
    fn test_invalid_ql_assignment_propagates() {
        let mut pop = population(&[[0, 0], [0, 1], [1, 1]]);
        let mut hook = coordinator(
            HybridMode::QlSeedsGa,
            Scripted::with(vec![(vec![0, 5], 2.0)]),
            pop.len(),
        );
        let err = hook.on_generation(0, &mut pop).unwrap_err();
        assert!(matches!(err, RouteChoiceError::RouteIndex { .. }));
    }

    #[test]
    fn test_ga_only_records_best() {
        let mut pop = population(&[[0, 1], [1, 1]]);
        let mut hook: HybridCoordinator<Scripted, Vec<StepRecord>> =
            HybridCoordinator::new(HybridMode::GaOnly, engine(), None, Vec::new(), 2).unwrap();
        hook.on_generation(7, &mut pop).unwrap();
        let (records, events) = hook.into_parts();
        assert_eq!(records, vec![StepRecord::new(7, StepScores::GaOnly { ga: 2.75 })]);
        assert!(events.is_empty());
    }

    #[test]
    fn test_construction_errors() {
        let new = |mode, learner: Option<Scripted>, size| {
            HybridCoordinator::new(mode, engine(), learner, Vec::<StepRecord>::new(), size)
        };
        assert!(new(HybridMode::QlSeedsGa, Some(Scripted::default()), 2).is_err());
        assert!(new(HybridMode::QlSeedsGa, None, 10).is_err());
        assert!(new(HybridMode::QlOnly, Some(Scripted::default()), 10).is_err());
        assert!(new(HybridMode::GaOnly, None, 2).is_ok());
    }
}
