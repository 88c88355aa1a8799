//! Candidate generators.
//!
//! Samplers produce fresh points over a design space, neighbor generators
//! propose local moves from a current point and the genetic operators breed
//! new candidates from a parent population. Every randomized generator owns a
//! [`rand_chacha::ChaCha8Rng`] and offers `new` (entropy seeded) and
//! `with_seed` constructors.

mod genetic;
mod neighbor;
mod sampling;

pub use genetic::{
    BitStringCodec, BitStringCrossover, Chromosome, Gene, GeneticCrossover, GeneticMutation,
};
pub use neighbor::{
    ExhaustiveNeighborGenerator, GaussianNeighborGenerator, NeighborGenerator,
    RandomNeighborGenerator, StochasticNeighborGenerator,
};
pub use sampling::{LatinHypercube, RandomSampling, SamplingGenerator};

use crate::design_space::VariableDescriptor;

/// Half-width of the interval sampled for a continuous variable with an
/// infinite bound.
pub const UNBOUNDED_HALF_RANGE: f64 = 1e4;

/// Finite interval used when sampling `variable`.
pub(crate) fn sampling_range(variable: &VariableDescriptor) -> (f64, f64) {
    let (lo, hi) = (variable.lower_bound(), variable.upper_bound());
    match (lo.is_finite(), hi.is_finite()) {
        (true, true) => (lo, hi),
        (true, false) => (lo, lo + 2.0 * UNBOUNDED_HALF_RANGE),
        (false, true) => (hi - 2.0 * UNBOUNDED_HALF_RANGE, hi),
        (false, false) => (-UNBOUNDED_HALF_RANGE, UNBOUNDED_HALF_RANGE),
    }
}

/// Maps `u` in `[0, 1)` onto the domain of `variable`. Discrete variables
/// land on one of their positions.
pub(crate) fn value_from_unit(variable: &VariableDescriptor, u: f64) -> f64 {
    if let Some(size) = variable.size() {
        let position = ((u * size as f64).floor() as u64).min(size.saturating_sub(1));
        return variable
            .value_at(position)
            .unwrap_or_else(|| variable.lower_bound());
    }
    let (lo, hi) = sampling_range(variable);
    lo + u * (hi - lo)
}
