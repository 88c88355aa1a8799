//! Survivor selection for population and single-point stochastic methods.

mod keep_best;
mod metropolis;
mod pairwise;
mod pareto;

pub use keep_best::{KeepBest, KeepSingleBest};
pub use metropolis::Metropolis;
pub use pairwise::RandomPairwiseCompare;
pub use pareto::{crowding_distances, non_dominated_fronts, ParetoSelector};

use crate::candidate::Candidate;

/// Chooses which evaluated candidates survive.
pub trait Selector {
    /// Reduces `candidates` to at most `target` survivors.
    fn select(&mut self, candidates: Vec<Candidate>, target: usize) -> Vec<Candidate>;
}
