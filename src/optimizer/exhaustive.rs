use log::info;

use crate::error::{Error, Result};
use crate::optimizer::{OptimizationMethod, OptimizerCore, Requirement};

/// Largest space [`ExhaustiveSearch`] enumerates unless told otherwise.
pub const DEFAULT_MAX_ENUMERATION: u64 = 1_000_000;

/// Evaluates every point of an all-discrete design space.
///
/// Positions are enumerated like an odometer, last variable fastest. Each
/// point is one iteration. Convergence criteria are optional and can stop the
/// enumeration early (for instance [`ToKnownBestF`](crate::convergence::ToKnownBestF));
/// otherwise the run ends converged once every point has been seen.
pub struct ExhaustiveSearch {
    core: OptimizerCore,
    pub max_enumeration: u64,
}

impl Default for ExhaustiveSearch {
    fn default() -> Self {
        Self {
            core: OptimizerCore::default(),
            max_enumeration: DEFAULT_MAX_ENUMERATION,
        }
    }
}

impl ExhaustiveSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_enumeration(mut self, max_enumeration: u64) -> Self {
        self.max_enumeration = max_enumeration;
        self
    }
}

/// Advances `positions` to the next combination; `false` after the last.
fn advance(positions: &mut [u64], sizes: &[u64]) -> bool {
    for (p, &size) in positions.iter_mut().zip(sizes).rev() {
        *p += 1;
        if *p < size {
            return true;
        }
        *p = 0;
    }
    false
}

impl OptimizationMethod for ExhaustiveSearch {
    fn core(&self) -> &OptimizerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut OptimizerCore {
        &mut self.core
    }

    fn requirements(&self) -> Vec<Requirement> {
        vec![Requirement::Objective, Requirement::DiscreteSpace]
    }

    fn search(&mut self, _x0: Vec<f64>) -> Result<()> {
        let core = &mut self.core;
        let space = core
            .space()
            .cloned()
            .ok_or(Error::MissingComponents(vec![Requirement::DiscreteSpace]))?;
        let total = space.size_of_space();
        if total > self.max_enumeration {
            return Err(Error::InvalidInput(format!(
                "design space has {total} points, more than the enumeration limit of {}",
                self.max_enumeration
            )));
        }
        let sizes = space
            .max_variable_sizes()
            .iter()
            .map(|s| s.ok_or(Error::MissingComponents(vec![Requirement::DiscreteSpace])))
            .collect::<Result<Vec<u64>>>()?;
        info!("enumerating {total} design points");

        let mut positions = vec![0u64; sizes.len()];
        loop {
            let x = space.values_at(&positions)?;
            let f = core.problem.evaluate(&x);
            core.record(&x, f);
            core.next_iteration();
            if core.converged(None, None)? {
                return Ok(());
            }
            if !advance(&mut positions, &sizes) {
                core.finish(vec!["Exhausted"]);
                return Ok(());
            }
        }
    }
}
