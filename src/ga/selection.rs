//! Parent selection for the GA.
//!
//! Both strategies minimize (lower fitness = better) and read only the
//! fitness of each individual, so they work on any population order.

use super::types::Individual;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Selection strategy for choosing parents.
///
/// ```
/// use u_routechoice::ga::Selection;
///
/// let greedy = Selection::Rank;
/// let tournament = Selection::Tournament(3);
/// assert_ne!(greedy, tournament);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// Pick `k` individuals at random and return the best of them.
    ///
    /// Higher `k` means stronger selection pressure; `k = 1` is uniform
    /// random selection.
    Tournament(usize),

    /// Pick uniformly among the individuals sharing the best fitness.
    ///
    /// With a unique best this always returns it, so offspring differ from
    /// the best only through crossover with tied individuals and mutation.
    Rank,
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Tournament(3)
    }
}

impl Selection {
    /// Select a parent index from the population.
    ///
    /// # Panics
    /// Panics if `population` is empty.
    pub fn select<I: Individual, R: Rng>(&self, population: &[I], rng: &mut R) -> usize {
        assert!(
            !population.is_empty(),
            "cannot select from empty population"
        );

        match self {
            Selection::Tournament(k) => tournament(population, *k, rng),
            Selection::Rank => best_tied(population, rng),
        }
    }
}

fn tournament<I: Individual, R: Rng>(population: &[I], k: usize, rng: &mut R) -> usize {
    let n = population.len();
    let mut best_idx = rng.random_range(0..n);
    for _ in 1..k.max(1) {
        let idx = rng.random_range(0..n);
        if population[idx].fitness() < population[best_idx].fitness() {
            best_idx = idx;
        }
    }
    best_idx
}

fn best_tied<I: Individual, R: Rng>(population: &[I], rng: &mut R) -> usize {
    let best = population
        .iter()
        .map(Individual::fitness)
        .fold(population[0].fitness(), |acc, f| if f < acc { f } else { acc });
    let tied = population.iter().filter(|ind| ind.fitness() == best).count();
    if tied == 0 {
        // NaN fitness at index 0
        return 0;
    }
    let pick = rng.random_range(0..tied);
    population
        .iter()
        .enumerate()
        .filter(|(_, ind)| ind.fitness() == best)
        .nth(pick)
        .map_or(0, |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::CandidateSolution;
    use crate::random::create_rng;

    fn population(fitness: &[f64]) -> Vec<CandidateSolution> {
        fitness
            .iter()
            .enumerate()
            .map(|(i, &f)| CandidateSolution {
                genes: vec![i],
                fitness: f,
            })
            .collect()
    }

    fn histogram(selection: Selection, pop: &[CandidateSolution], draws: usize) -> Vec<usize> {
        let mut rng = create_rng(42);
        let mut counts = vec![0; pop.len()];
        for _ in 0..draws {
            counts[selection.select(pop, &mut rng)] += 1;
        }
        counts
    }

    #[test]
    fn test_rank_returns_unique_best() {
        let pop = population(&[3.5, 2.0, 9.0, 2.5]);
        assert_eq!(histogram(Selection::Rank, &pop, 200), vec![0, 200, 0, 0]);
    }

    #[test]
    fn test_rank_spreads_over_tied_best() {
        let pop = population(&[2.0, 2.0, 2.0, 2.75, 4.0]);
        let counts = histogram(Selection::Rank, &pop, 3000);
        assert_eq!(&counts[3..], &[0, 0]);
        for &c in &counts[..3] {
            assert!((800..1200).contains(&c), "{counts:?}");
        }
    }

    #[test]
    fn test_rank_ignores_unevaluated() {
        let mut pop = population(&[f64::INFINITY, 4.0, f64::INFINITY]);
        assert_eq!(histogram(Selection::Rank, &pop, 50), vec![0, 50, 0]);
        pop[1].fitness = f64::INFINITY;
        let counts = histogram(Selection::Rank, &pop, 300);
        assert!(counts.iter().all(|&c| c > 0), "{counts:?}");
    }

    #[test]
    fn test_tournament_prefers_lower_travel_time() {
        let pop = population(&[5.0, 1.0, 4.0, 3.0, 2.0]);
        let counts = histogram(Selection::Tournament(3), &pop, 5000);
        assert!(counts[1] > counts[4]);
        assert!(counts[4] > counts[0]);
    }

    #[test]
    fn test_tournament_of_one_is_uniform() {
        let pop = population(&[5.0, 1.0, 4.0, 3.0]);
        for c in histogram(Selection::Tournament(1), &pop, 4000) {
            assert!((800..1200).contains(&c));
        }
    }

    #[test]
    fn test_single_individual() {
        let pop = population(&[7.0]);
        for selection in [Selection::Tournament(3), Selection::Rank] {
            assert_eq!(histogram(selection, &pop, 10), vec![10]);
        }
    }

    #[test]
    #[should_panic(expected = "cannot select from empty population")]
    fn test_empty_population_panics() {
        let pop: Vec<CandidateSolution> = Vec::new();
        Selection::Rank.select(&pop, &mut create_rng(1));
    }

    #[test]
    fn test_yaml_names() {
        let rank: Selection = serde_yaml::from_str("rank").unwrap();
        assert_eq!(rank, Selection::Rank);
        let tournament: Selection = serde_yaml::from_str("!tournament 4").unwrap();
        assert_eq!(tournament, Selection::Tournament(4));
    }
}
