use log::debug;

use crate::convergence::{
    ConvergenceCriterion, ConvergenceState, DeltaF, DeltaGradF, DeltaX, MaxAge, MaxIterations,
};
use crate::error::{Error, Result};

/// How the configured sub-criteria of a [`CompositeConvergence`] are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combine {
    /// Converged when every configured sub-criterion holds.
    All,
    /// Converged when any configured sub-criterion holds.
    Any,
}

/// Boolean combination of the common single-point criteria.
///
/// Only sub-criteria that were configured take part; an unset one is neither
/// true nor false. Every configured sub-criterion is evaluated on each call
/// so that the stateful ones keep their history current.
///
/// # Examples
///
/// ```
/// use optkit::convergence::{Combine, CompositeConvergence, ConvergenceCriterion, ConvergenceState};
///
/// let mut both = CompositeConvergence::new(Combine::All)
///     .with_delta_x(1e-6)
///     .with_max_iterations(3);
/// let x = [1.0, 2.0];
/// let state = |k| ConvergenceState::new().with_iteration(k).with_x_best(&x);
/// assert!(!both.converged(&state(1)).unwrap());
/// assert!(!both.converged(&state(2)).unwrap());
/// assert!(both.converged(&state(3)).unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct CompositeConvergence {
    combine: Combine,
    delta_x: Option<DeltaX>,
    delta_f: Option<DeltaF>,
    delta_grad_f: Option<DeltaGradF>,
    max_age: Option<MaxAge>,
    max_iterations: Option<MaxIterations>,
}

impl CompositeConvergence {
    pub fn new(combine: Combine) -> Self {
        Self {
            combine,
            delta_x: None,
            delta_f: None,
            delta_grad_f: None,
            max_age: None,
            max_iterations: None,
        }
    }

    pub fn with_delta_x(mut self, epsilon: f64) -> Self {
        self.delta_x = Some(DeltaX::new(epsilon));
        self
    }

    pub fn with_delta_f(mut self, epsilon: f64) -> Self {
        self.delta_f = Some(DeltaF::new(epsilon));
        self
    }

    pub fn with_delta_grad_f(mut self, epsilon: f64) -> Self {
        self.delta_grad_f = Some(DeltaGradF::new(epsilon));
        self
    }

    pub fn with_max_age(mut self, max_age: usize, same_tolerance: f64) -> Self {
        self.max_age = Some(MaxAge::new(max_age, same_tolerance));
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = Some(MaxIterations::new(max));
        self
    }

    pub fn combine(&self) -> Combine {
        self.combine
    }

    fn configured(&mut self) -> Vec<&mut dyn ConvergenceCriterion> {
        let mut set: Vec<&mut dyn ConvergenceCriterion> = Vec::new();
        if let Some(c) = self.delta_x.as_mut() {
            set.push(c);
        }
        if let Some(c) = self.delta_f.as_mut() {
            set.push(c);
        }
        if let Some(c) = self.delta_grad_f.as_mut() {
            set.push(c);
        }
        if let Some(c) = self.max_age.as_mut() {
            set.push(c);
        }
        if let Some(c) = self.max_iterations.as_mut() {
            set.push(c);
        }
        set
    }
}

impl ConvergenceCriterion for CompositeConvergence {
    fn name(&self) -> &'static str {
        match self.combine {
            Combine::All => "CompositeConvergence(All)",
            Combine::Any => "CompositeConvergence(Any)",
        }
    }

    fn converged(&mut self, state: &ConvergenceState<'_>) -> Result<bool> {
        let combine = self.combine;
        let mut outcomes = Vec::new();
        for criterion in self.configured() {
            let outcome = criterion.converged(state)?;
            debug!("{} -> {outcome}", criterion.name());
            outcomes.push(outcome);
        }
        if outcomes.is_empty() {
            return Err(Error::InvalidInput(
                "composite convergence has no sub-criteria configured".into(),
            ));
        }
        Ok(match combine {
            Combine::All => outcomes.iter().all(|&o| o),
            Combine::Any => outcomes.iter().any(|&o| o),
        })
    }

    fn reset(&mut self) {
        for criterion in self.configured() {
            criterion.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_with_unset_members() {
        let mut any = CompositeConvergence::new(Combine::Any).with_delta_f(1e-3);
        let s = ConvergenceState::new().with_f_best(2.0);
        assert!(!any.converged(&s).unwrap());
        assert!(any.converged(&s).unwrap());
    }

    #[test]
    fn test_all_requires_every_member() {
        let mut all = CompositeConvergence::new(Combine::All)
            .with_delta_grad_f(1e-3)
            .with_max_iterations(5);
        let grad = [0.0, 0.0];
        let early = ConvergenceState::new().with_iteration(1).with_gradient(&grad);
        let late = ConvergenceState::new().with_iteration(5).with_gradient(&grad);
        assert!(!all.converged(&early).unwrap());
        assert!(all.converged(&late).unwrap());
    }

    #[test]
    fn test_missing_argument_propagates() {
        let mut all = CompositeConvergence::new(Combine::Any)
            .with_max_iterations(5)
            .with_max_age(3, 1e-9);
        assert!(matches!(
            all.converged(&ConvergenceState::new().with_iteration(6)),
            Err(Error::MissingArgument { criterion: "MaxAge", .. })
        ));
    }

    #[test]
    fn test_empty_composite_is_an_error() {
        let mut none = CompositeConvergence::new(Combine::All);
        assert!(none.converged(&ConvergenceState::new()).is_err());
    }
}
