use log::{debug, trace};

use crate::error::{Error, Result};
use crate::line_search::LineSearch;
use crate::linalg::{axpy, negate};
use crate::optimizer::{OptimizationMethod, OptimizerCore, Requirement};
use crate::search_direction::SearchDirection;

/// Configuration for [`GradientBased`].
#[derive(Debug, Clone, Copy)]
pub struct GradientConfig {
    /// Search along `-d` when the line search finds no progress along `d`.
    pub allow_negative_alpha: bool,
    /// Step lengths below this count as no progress. Defaults to the line
    /// search's own epsilon.
    pub alpha_epsilon: Option<f64>,
}

impl Default for GradientConfig {
    fn default() -> Self {
        Self {
            allow_negative_alpha: true,
            alpha_epsilon: None,
        }
    }
}

/// Line-search descent: each iteration asks the search direction for `d`,
/// minimizes along `x + α·d` and moves to the result if it is no worse.
///
/// The direction strategy decides the flavor: steepest descent,
/// Fletcher-Reeves, BFGS, Powell or cyclic coordinates.
pub struct GradientBased {
    core: OptimizerCore,
    direction: Option<Box<dyn SearchDirection>>,
    line_search: Option<Box<dyn LineSearch>>,
    pub config: GradientConfig,
}

impl Default for GradientBased {
    fn default() -> Self {
        Self {
            core: OptimizerCore::default(),
            direction: None,
            line_search: None,
            config: GradientConfig::default(),
        }
    }
}

impl GradientBased {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_direction(mut self, direction: impl SearchDirection + 'static) -> Self {
        self.direction = Some(Box::new(direction));
        self
    }

    pub fn with_line_search(mut self, line_search: impl LineSearch + 'static) -> Self {
        self.line_search = Some(Box::new(line_search));
        self
    }

    pub fn with_config(mut self, config: GradientConfig) -> Self {
        self.config = config;
        self
    }
}

impl OptimizationMethod for GradientBased {
    fn core(&self) -> &OptimizerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut OptimizerCore {
        &mut self.core
    }

    fn requirements(&self) -> Vec<Requirement> {
        vec![
            Requirement::Objective,
            Requirement::ConvergenceCriterion,
            Requirement::StartingPoint,
            Requirement::SearchDirection,
            Requirement::LineSearch,
        ]
    }

    fn provides(&self, requirement: Requirement) -> bool {
        match requirement {
            Requirement::SearchDirection => self.direction.is_some(),
            Requirement::LineSearch => self.line_search.is_some(),
            _ => false,
        }
    }

    fn search(&mut self, x0: Vec<f64>) -> Result<()> {
        let GradientConfig {
            allow_negative_alpha,
            alpha_epsilon,
        } = self.config;
        let core = &mut self.core;
        let (Some(direction), Some(line_search)) =
            (self.direction.as_mut(), self.line_search.as_mut())
        else {
            return Err(Error::MissingComponents(vec![
                Requirement::SearchDirection,
                Requirement::LineSearch,
            ]));
        };

        let wants_gradient = direction.requires_gradient();
        let mut x = x0;
        let mut fx = core.problem.minimization_value(&x);
        core.record_minimization(&x, fx);
        let mut gradient = if wants_gradient {
            core.problem.gradient(&x, Some(fx))
        } else {
            Vec::new()
        };
        let mut first = true;

        loop {
            let d = direction.find(&x, &gradient, fx, first);
            first = false;

            let problem = &core.problem;
            let mut f = |p: &[f64]| problem.minimization_value(p);
            let mut step = line_search.find_alpha_star(&mut f, &x, &d);
            let epsilon = alpha_epsilon.unwrap_or_else(|| line_search.epsilon());
            if allow_negative_alpha && step.alpha.abs() < epsilon {
                let back = line_search.find_alpha_star(&mut f, &x, &negate(&d));
                trace!("no progress along d, tried -d: alpha = {}", back.alpha);
                if back.value < step.value {
                    step.alpha = -back.alpha;
                    step.value = back.value;
                }
            }
            direction.observe_step(step.alpha);

            if step.value <= fx {
                x = axpy(&x, step.alpha, &d);
                fx = step.value;
            } else {
                debug!("line search did not improve on {fx}, staying put");
            }

            core.next_iteration();
            core.record_minimization(&x, fx);
            if wants_gradient {
                gradient = core.problem.gradient(&x, Some(fx));
            }
            let g = wants_gradient.then_some(gradient.as_slice());
            if core.converged(None, g)? {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convergence::{DeltaGradF, DeltaX, MaxIterations};
    use crate::line_search::{Backtracking, GoldenSection};
    use crate::search_direction::{Bfgs, SteepestDescent};
    use approx::assert_abs_diff_eq;

    fn bowl(x: &[f64]) -> f64 {
        (x[0] - 1.0).powi(2) + 10.0 * (x[1] + 0.5).powi(2)
    }

    #[test]
    fn test_bfgs_with_golden_section() {
        let mut method = GradientBased::new()
            .with_objective(bowl)
            .with_search_direction(Bfgs::new())
            .with_line_search(GoldenSection::new(1e-10, 1.0))
            .with_convergence(DeltaGradF::new(1e-6))
            .with_convergence(MaxIterations::new(200));
        let result = method.run(Some(&[4.0, 3.0])).unwrap();
        assert!(result.converged);
        assert_abs_diff_eq!(result.optimal_point[0], 1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(result.optimal_point[1], -0.5, epsilon = 1e-4);
        assert!(result.iterations < 200);
    }

    #[test]
    fn test_negative_alpha_recovers_from_ascent_direction() {
        // Backtracking only searches forward, so an uphill direction yields
        // alpha = 0 until the driver retries along -d.
        struct Uphill;
        impl SearchDirection for Uphill {
            fn find(&mut self, _x: &[f64], gradient: &[f64], _f: f64, _reset: bool) -> Vec<f64> {
                gradient.to_vec()
            }
        }
        let mut method = GradientBased::new()
            .with_objective(|x: &[f64]| x[0] * x[0])
            .with_search_direction(Uphill)
            .with_line_search(Backtracking::new(1.0, 1e-4, 30))
            .with_convergence(DeltaX::new(1e-9))
            .with_convergence(MaxIterations::new(50));
        let result = method.run(Some(&[2.0])).unwrap();
        assert!(result.optimal_value < 4.0);

        let mut stuck = GradientBased::new()
            .with_objective(|x: &[f64]| x[0] * x[0])
            .with_search_direction(Uphill)
            .with_line_search(Backtracking::new(1.0, 1e-4, 30))
            .with_config(GradientConfig {
                allow_negative_alpha: false,
                ..GradientConfig::default()
            })
            .with_convergence(DeltaX::new(1e-9))
            .with_convergence(MaxIterations::new(50));
        let result = stuck.run(Some(&[2.0])).unwrap();
        assert_eq!(result.optimal_point, vec![2.0]);
    }

    #[test]
    fn test_steepest_descent_counts_evaluations() {
        let mut method = GradientBased::new()
            .with_objective(bowl)
            .with_search_direction(SteepestDescent::new())
            .with_line_search(GoldenSection::new(1e-8, 1.0))
            .with_convergence(MaxIterations::new(3));
        let result = method.run(Some(&[0.0, 0.0])).unwrap();
        assert_eq!(result.iterations, 3);
        assert_eq!(result.converged_by, vec!["MaxIterations"]);
        assert_eq!(result.evaluations, method.evaluations());
        assert!(result.evaluations > 3);
    }
}
