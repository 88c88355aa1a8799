//! Convergence criteria.
//!
//! Every criterion sees the same [`ConvergenceState`] snapshot: iteration
//! count, cumulative function evaluations, best objective value, best
//! decision vector, the current population and the current gradient. A
//! criterion ignores what it does not need. If something it does need is
//! absent it returns [`Error::MissingArgument`] instead of guessing.
//!
//! Criteria may keep private history (last x, last f, age counters). The
//! driver calls them once per iteration from a single thread.

mod composite;
mod criteria;

pub use composite::{Combine, CompositeConvergence};
pub use criteria::{
    DeltaF, DeltaGradF, DeltaX, MaxAge, MaxFunctionEvals, MaxIterations, MaxSpanInPopulation,
    MaxTime, ToKnownBestF, ToKnownBestX,
};

use crate::error::{Error, Result};

/// Snapshot of the driver state handed to each criterion.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvergenceState<'a> {
    pub iteration: Option<usize>,
    pub evaluations: Option<usize>,
    pub f_best: Option<f64>,
    pub x_best: Option<&'a [f64]>,
    pub population: Option<&'a [Vec<f64>]>,
    pub gradient: Option<&'a [f64]>,
}

impl<'a> ConvergenceState<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_iteration(mut self, iteration: usize) -> Self {
        self.iteration = Some(iteration);
        self
    }

    pub fn with_evaluations(mut self, evaluations: usize) -> Self {
        self.evaluations = Some(evaluations);
        self
    }

    pub fn with_f_best(mut self, f_best: f64) -> Self {
        self.f_best = Some(f_best);
        self
    }

    pub fn with_x_best(mut self, x_best: &'a [f64]) -> Self {
        self.x_best = Some(x_best);
        self
    }

    pub fn with_population(mut self, population: &'a [Vec<f64>]) -> Self {
        self.population = Some(population);
        self
    }

    pub fn with_gradient(mut self, gradient: &'a [f64]) -> Self {
        self.gradient = Some(gradient);
        self
    }

    pub(crate) fn require_iteration(&self, criterion: &'static str) -> Result<usize> {
        self.iteration.ok_or(Error::MissingArgument {
            criterion,
            argument: "iteration",
        })
    }

    pub(crate) fn require_evaluations(&self, criterion: &'static str) -> Result<usize> {
        self.evaluations.ok_or(Error::MissingArgument {
            criterion,
            argument: "evaluations",
        })
    }

    pub(crate) fn require_f_best(&self, criterion: &'static str) -> Result<f64> {
        self.f_best.ok_or(Error::MissingArgument {
            criterion,
            argument: "f_best",
        })
    }

    pub(crate) fn require_x_best(&self, criterion: &'static str) -> Result<&'a [f64]> {
        self.x_best.ok_or(Error::MissingArgument {
            criterion,
            argument: "x_best",
        })
    }

    pub(crate) fn require_population(&self, criterion: &'static str) -> Result<&'a [Vec<f64>]> {
        self.population.ok_or(Error::MissingArgument {
            criterion,
            argument: "population",
        })
    }

    pub(crate) fn require_gradient(&self, criterion: &'static str) -> Result<&'a [f64]> {
        self.gradient.ok_or(Error::MissingArgument {
            criterion,
            argument: "gradient",
        })
    }
}

/// A termination test evaluated once per driver iteration.
pub trait ConvergenceCriterion {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Whether the run should stop, given the current state.
    fn converged(&mut self, state: &ConvergenceState<'_>) -> Result<bool>;

    /// Clears any history so the criterion can be reused for a new run.
    fn reset(&mut self) {}
}
