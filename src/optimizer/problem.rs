use std::sync::atomic::{AtomicUsize, Ordering};

use crate::candidate::OptimizeDirection;
use crate::design_space::DesignSpaceDescription;
use crate::error::{Error, Result};
use crate::function::{Constraint, DependentAnalysis, Differencing, ObjectiveFunction};
use crate::merit::{MeritFunction, SquaredExteriorPenalty};

/// Everything a driver evaluates: objectives, constraints, the design space
/// and how constraint violations are folded into the objective.
///
/// Two value conventions are used:
///
/// * [`Problem::evaluate`] returns the *merit* value in the caller's
///   orientation, `f(x) + sign · penalty(x)`, so a penalty always makes a
///   point look worse whether minimizing or maximizing.
/// * [`Problem::minimization_value`] returns `sign · evaluate(x)`, which every
///   direction-agnostic method (line searches, simplex, pattern search)
///   minimizes.
///
/// Evaluations are counted through an atomic so population methods can
/// evaluate candidates from several threads.
pub struct Problem {
    objectives: Vec<Box<dyn ObjectiveFunction>>,
    equalities: Vec<Constraint>,
    inequalities: Vec<Constraint>,
    space: Option<DesignSpaceDescription>,
    dependent_analysis: Option<Box<dyn DependentAnalysis>>,
    merit: Box<dyn MeritFunction>,
    differencing: Differencing,
    direction: OptimizeDirection,
    evaluations: AtomicUsize,
}

impl Default for Problem {
    fn default() -> Self {
        Self {
            objectives: Vec::new(),
            equalities: Vec::new(),
            inequalities: Vec::new(),
            space: None,
            dependent_analysis: None,
            merit: Box::new(SquaredExteriorPenalty::default()),
            differencing: Differencing::default(),
            direction: OptimizeDirection::Minimize,
            evaluations: AtomicUsize::new(0),
        }
    }
}

impl std::fmt::Debug for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Problem")
            .field("objectives", &self.objectives.len())
            .field("equalities", &self.equalities.len())
            .field("inequalities", &self.inequalities.len())
            .field("space", &self.space)
            .field("dependent_analysis", &self.dependent_analysis.is_some())
            .field("differencing", &self.differencing)
            .field("direction", &self.direction)
            .field("evaluations", &self.evaluations())
            .finish()
    }
}

impl Problem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_objective(&mut self, objective: impl ObjectiveFunction + 'static) {
        self.objectives.push(Box::new(objective));
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        if constraint.is_equality() {
            self.equalities.push(constraint);
        } else {
            self.inequalities.push(constraint);
        }
    }

    pub fn set_space(&mut self, space: DesignSpaceDescription) {
        self.space = Some(space);
    }

    pub fn set_dependent_analysis(&mut self, analysis: impl DependentAnalysis + 'static) {
        self.dependent_analysis = Some(Box::new(analysis));
    }

    pub fn set_merit(&mut self, merit: impl MeritFunction + 'static) {
        self.merit = Box::new(merit);
    }

    pub fn set_differencing(&mut self, differencing: Differencing) {
        self.differencing = differencing;
    }

    pub fn set_direction(&mut self, direction: OptimizeDirection) {
        self.direction = direction;
    }

    pub fn space(&self) -> Option<&DesignSpaceDescription> {
        self.space.as_ref()
    }

    pub fn direction(&self) -> OptimizeDirection {
        self.direction
    }

    pub fn differencing(&self) -> Differencing {
        self.differencing
    }

    pub fn num_objectives(&self) -> usize {
        self.objectives.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.equalities.len() + self.inequalities.len()
    }

    pub fn has_dependent_analysis(&self) -> bool {
        self.dependent_analysis.is_some()
    }

    /// Function evaluations since construction or the last reset.
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }

    pub fn reset_evaluations(&self) {
        self.evaluations.store(0, Ordering::Relaxed);
    }

    /// Fails unless `x` matches the design space, when there is one.
    pub fn check_point(&self, x: &[f64]) -> Result<()> {
        match &self.space {
            Some(space) => space.check_dimension(x.len()),
            None if x.is_empty() => Err(Error::InvalidInput("empty decision vector".into())),
            None => Ok(()),
        }
    }

    fn prepare(&self, x: &[f64]) {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        if let Some(analysis) = &self.dependent_analysis {
            analysis.calculate(x);
        }
    }

    fn penalty(&self, x: &[f64]) -> f64 {
        if self.num_constraints() == 0 {
            return 0.0;
        }
        let g: Vec<f64> = self.inequalities.iter().map(|c| c.value(x)).collect();
        let h: Vec<f64> = self.equalities.iter().map(|c| c.value(x)).collect();
        self.merit.penalty(&g, &h)
    }

    /// Merit value of the first objective, in the caller's orientation.
    /// Counts as one evaluation.
    pub fn evaluate(&self, x: &[f64]) -> f64 {
        self.prepare(x);
        let f = self.objectives.first().map_or(f64::NAN, |o| o.evaluate(x));
        f + self.direction.sign() * self.penalty(x)
    }

    /// Merit values of every objective. Counts as one evaluation.
    pub fn evaluate_all(&self, x: &[f64]) -> Vec<f64> {
        self.prepare(x);
        let penalty = self.direction.sign() * self.penalty(x);
        self.objectives
            .iter()
            .map(|o| o.evaluate(x) + penalty)
            .collect()
    }

    /// `sign · evaluate(x)`: the value direction-agnostic methods minimize.
    pub fn minimization_value(&self, x: &[f64]) -> f64 {
        self.direction.sign() * self.evaluate(x)
    }

    /// Gradient of [`minimization_value`](Self::minimization_value) at `x`.
    ///
    /// Analytic when the objective and every constraint supply derivatives,
    /// otherwise by finite differences using the configured scheme. `fx` is
    /// the minimization value at `x` when already known.
    pub fn gradient(&self, x: &[f64], fx: Option<f64>) -> Vec<f64> {
        if let Some(gradient) = self.analytic_gradient(x) {
            return gradient;
        }
        let mut f = |p: &[f64]| self.minimization_value(p);
        self.differencing.gradient(&mut f, x, fx)
    }

    fn analytic_gradient(&self, x: &[f64]) -> Option<Vec<f64>> {
        let objective = self.objectives.first()?;
        if let Some(analysis) = &self.dependent_analysis {
            analysis.calculate(x);
        }
        let sign = self.direction.sign();
        let mut gradient: Vec<f64> = objective
            .gradient(x)?
            .into_iter()
            .map(|d| sign * d)
            .collect();
        if self.num_constraints() == 0 {
            return Some(gradient);
        }
        let g_gradients = self
            .inequalities
            .iter()
            .map(|c| c.function().gradient(x))
            .collect::<Option<Vec<_>>>()?;
        let h_gradients = self
            .equalities
            .iter()
            .map(|c| c.function().gradient(x))
            .collect::<Option<Vec<_>>>()?;
        let g: Vec<f64> = self.inequalities.iter().map(|c| c.value(x)).collect();
        let h: Vec<f64> = self.equalities.iter().map(|c| c.value(x)).collect();
        let penalty = self.merit.penalty_gradient(&g, &g_gradients, &h, &h_gradients);
        for (gi, pi) in gradient.iter_mut().zip(penalty) {
            *gi += pi;
        }
        Some(gradient)
    }

    /// Whether `x` satisfies every constraint.
    pub fn is_feasible(&self, x: &[f64]) -> bool {
        self.equalities
            .iter()
            .chain(self.inequalities.iter())
            .all(|c| c.is_feasible(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    struct Paraboloid;

    impl ObjectiveFunction for Paraboloid {
        fn evaluate(&self, x: &[f64]) -> f64 {
            x.iter().map(|v| v * v).sum()
        }

        fn derivative_wrt(&self, x: &[f64], i: usize) -> Option<f64> {
            Some(2.0 * x[i])
        }
    }

    #[test]
    fn test_evaluations_are_counted() {
        let mut problem = Problem::new();
        problem.add_objective(|x: &[f64]| x[0]);
        problem.evaluate(&[1.0]);
        problem.evaluate_all(&[2.0]);
        assert_eq!(problem.evaluations(), 2);
        problem.reset_evaluations();
        assert_eq!(problem.evaluations(), 0);
    }

    #[test]
    fn test_penalty_direction() {
        let mut problem = Problem::new();
        problem.add_objective(|x: &[f64]| x[0]);
        problem.add_constraint(Constraint::inequality(|x: &[f64]| x[0] - 10.0));
        problem.set_merit(SquaredExteriorPenalty::new(1.0));
        assert_eq!(problem.evaluate(&[5.0]), 5.0);
        assert_eq!(problem.evaluate(&[12.0]), 16.0);
        assert!(problem.is_feasible(&[5.0]));
        assert!(!problem.is_feasible(&[15.0]));

        problem.set_direction(OptimizeDirection::Maximize);
        assert_eq!(problem.evaluate(&[12.0]), 8.0);
        assert_eq!(problem.minimization_value(&[12.0]), -8.0);
    }

    #[test]
    fn test_analytic_gradient_with_penalty() {
        struct Linear;
        impl ObjectiveFunction for Linear {
            fn evaluate(&self, x: &[f64]) -> f64 {
                x[0] - 1.0
            }
            fn derivative_wrt(&self, _x: &[f64], i: usize) -> Option<f64> {
                Some(if i == 0 { 1.0 } else { 0.0 })
            }
        }
        let mut problem = Problem::new();
        problem.add_objective(Paraboloid);
        problem.add_constraint(Constraint::inequality(Linear));
        problem.set_merit(SquaredExteriorPenalty::new(1.0));
        // g = 2 at x = (3, 1): penalty gradient 2·1·2 along x0.
        let gradient = problem.gradient(&[3.0, 1.0], None);
        assert_eq!(gradient, vec![10.0, 2.0]);
        assert_eq!(problem.evaluations(), 0);
    }

    #[test]
    fn test_numeric_gradient_fallback() {
        let mut problem = Problem::new();
        problem.add_objective(|x: &[f64]| x[0] * x[0] + 3.0 * x[1]);
        problem.set_direction(OptimizeDirection::Maximize);
        let gradient = problem.gradient(&[1.0, 0.0], None);
        assert_abs_diff_eq!(gradient[0], -2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(gradient[1], -3.0, epsilon = 1e-6);
        assert_eq!(problem.evaluations(), 4);
    }

    #[test]
    fn test_check_point_against_space() {
        let mut problem = Problem::new();
        problem.set_space(DesignSpaceDescription::unbounded(2));
        assert!(problem.check_point(&[0.0, 0.0]).is_ok());
        assert_eq!(
            problem.check_point(&[0.0]),
            Err(Error::DimensionMismatch {
                expected: 2,
                found: 1
            })
        );
    }
}
