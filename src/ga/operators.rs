//! Integer-vector genetic operators.
//!
//! Crossover and mutation for chromosomes where gene `i` takes values in
//! its own domain `0..domains[i]`. Crossover never moves a value to another
//! position, so children stay inside the domains of their parents.
//!
//! # Crossover Operators
//!
//! - [`single_point_crossover`]: swap tails after a random cut
//!
//! # Mutation Operators
//!
//! - [`random_reset_mutation`]: redraw genes from their domains at a
//!   per-gene rate
//!
//! # References
//!
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*

use rand::Rng;

// ============================================================================
// Crossover operators
// ============================================================================

/// Single-point crossover.
///
/// Picks a cut point `c` in `1..n` and returns `(p1[..c] ++ p2[c..],
/// p2[..c] ++ p1[c..])`. Chromosomes of length 1 are returned unchanged.
///
/// # Complexity
/// O(n) time, O(n) space
///
/// # Panics
/// Panics if parents have different lengths or are empty.
pub fn single_point_crossover<R: Rng>(
    parent1: &[usize],
    parent2: &[usize],
    rng: &mut R,
) -> (Vec<usize>, Vec<usize>) {
    let n = parent1.len();
    assert_eq!(n, parent2.len(), "parents must have equal length");
    assert!(n > 0, "parents must not be empty");

    if n == 1 {
        return (parent1.to_vec(), parent2.to_vec());
    }

    let cut = rng.random_range(1..n);
    let mut child1 = parent1[..cut].to_vec();
    child1.extend_from_slice(&parent2[cut..]);
    let mut child2 = parent2[..cut].to_vec();
    child2.extend_from_slice(&parent1[cut..]);
    (child1, child2)
}

// ============================================================================
// Mutation operators
// ============================================================================

/// Redraws genes uniformly from their domains at a per-gene `rate`.
///
/// When the expected number of mutations `rate * n` is below 1, every
/// gene is redrawn independently with probability `rate`. Otherwise
/// `round(rate * n)` positions are picked at random (with repetition) and
/// redrawn. A redrawn value may equal the old one. Genes whose domain has
/// a single value never change.
///
/// Returns the number of redraws.
///
/// # Panics
/// Panics if `genes` and `domains` have different lengths.
pub fn random_reset_mutation<R: Rng>(
    genes: &mut [usize],
    domains: &[usize],
    rate: f64,
    rng: &mut R,
) -> usize {
    assert_eq!(genes.len(), domains.len(), "one domain per gene required");
    if genes.is_empty() || rate <= 0.0 {
        return 0;
    }

    let expected = rate * genes.len() as f64;
    let mut redraws = 0;
    if expected < 1.0 {
        for (gene, &k) in genes.iter_mut().zip(domains) {
            if rng.random_bool(rate) {
                *gene = rng.random_range(0..k);
                redraws += 1;
            }
        }
    } else {
        for _ in 0..expected.round() as usize {
            let idx = rng.random_range(0..genes.len());
            genes[idx] = rng.random_range(0..domains[idx]);
            redraws += 1;
        }
    }
    redraws
}

/// Draws every gene uniformly from its domain.
///
/// # Panics
/// Panics if a domain is empty.
pub fn random_genes<R: Rng>(domains: &[usize], rng: &mut R) -> Vec<usize> {
    domains.iter().map(|&k| rng.random_range(0..k)).collect()
}
