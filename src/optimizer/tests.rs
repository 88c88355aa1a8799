use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use approx::assert_abs_diff_eq;

use super::*;
use crate::convergence::{DeltaGradF, DeltaX, MaxIterations, MaxSpanInPopulation};
use crate::function::Memoized;
use crate::line_search::{ArithmeticMean, DscPowell, GoldenSection};
use crate::merit::SquaredExteriorPenalty;
use crate::search_direction::{
    CyclicCoordinates, FletcherReeves, PowellDirections, SteepestDescent,
};

fn paraboloid(x: &[f64]) -> f64 {
    (x[0] - 1.0).powi(2) + (x[1] - 1.0).powi(2)
}

/// Positive definite, with the axes coupled.
fn tilted(x: &[f64]) -> f64 {
    let (a, b) = (x[0] - 1.0, x[1] + 2.0);
    a * a + 4.0 * b * b + a * b
}

#[test]
fn test_steepest_descent_golden_section_reaches_paraboloid_minimum() {
    let mut method = GradientBased::new()
        .with_objective(paraboloid)
        .with_search_direction(SteepestDescent::new())
        .with_line_search(GoldenSection::new(1e-8, 1.0))
        .with_convergence(DeltaX::new(1e-6))
        .with_convergence(MaxIterations::new(100));
    let result = method.run(Some(&[0.0, 0.0])).unwrap();
    assert!(result.converged);
    assert_eq!(result.converged_by, vec!["DeltaX"]);
    assert_abs_diff_eq!(result.optimal_point[0], 1.0, epsilon = 1e-5);
    assert_abs_diff_eq!(result.optimal_point[1], 1.0, epsilon = 1e-5);
    assert_abs_diff_eq!(result.optimal_value, 0.0, epsilon = 1e-9);
}

#[test]
fn test_direction_and_line_search_combinations() {
    let runs: Vec<GradientBased> = vec![
        GradientBased::new()
            .with_search_direction(FletcherReeves::new())
            .with_line_search(DscPowell::default()),
        GradientBased::new()
            .with_search_direction(PowellDirections::default())
            .with_line_search(GoldenSection::new(1e-9, 1.0)),
        GradientBased::new()
            .with_search_direction(CyclicCoordinates::new())
            .with_line_search(GoldenSection::new(1e-9, 1.0)),
        GradientBased::new()
            .with_search_direction(SteepestDescent::new())
            .with_line_search(ArithmeticMean::default()),
    ];
    for method in runs {
        let mut method = method
            .with_objective(tilted)
            .with_convergence(MaxIterations::new(300));
        let result = method.run(Some(&[4.0, 1.0])).unwrap();
        assert_abs_diff_eq!(result.optimal_point[0], 1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(result.optimal_point[1], -2.0, epsilon = 1e-4);
    }
}

#[test]
fn test_missing_components_reported_together() {
    let mut method = GradientBased::new();
    assert_eq!(
        method.run(None),
        Err(Error::MissingComponents(vec![
            Requirement::Objective,
            Requirement::ConvergenceCriterion,
            Requirement::StartingPoint,
            Requirement::SearchDirection,
            Requirement::LineSearch,
        ]))
    );
}

#[test]
fn test_start_point_drawn_from_space() {
    let space = DesignSpaceDescription::new(vec![
        crate::design_space::VariableDescriptor::continuous(-3.0, 3.0).unwrap(),
        crate::design_space::VariableDescriptor::continuous(-3.0, 3.0).unwrap(),
    ])
    .unwrap();
    let mut method = NelderMead::new()
        .with_objective(paraboloid)
        .with_space(space)
        .with_seed(8)
        .with_convergence(MaxSpanInPopulation::new(1e-8))
        .with_convergence(MaxIterations::new(1000));
    let result = method.run(None).unwrap();
    assert_abs_diff_eq!(result.optimal_point[0], 1.0, epsilon = 1e-4);
    assert_abs_diff_eq!(result.optimal_point[1], 1.0, epsilon = 1e-4);
}

#[test]
fn test_start_point_dimension_checked() {
    let mut method = NelderMead::new()
        .with_objective(paraboloid)
        .with_space(DesignSpaceDescription::unbounded(2))
        .with_convergence(MaxIterations::new(10));
    assert_eq!(
        method.run(Some(&[0.0])),
        Err(Error::DimensionMismatch {
            expected: 2,
            found: 1
        })
    );
}

#[test]
fn test_criterion_missing_its_argument_is_fatal() {
    let mut method = NelderMead::new()
        .with_objective(paraboloid)
        .with_convergence(DeltaGradF::new(1e-6));
    assert_eq!(
        method.run(Some(&[0.0, 0.0])),
        Err(Error::MissingArgument {
            criterion: "DeltaGradF",
            argument: "gradient"
        })
    );
}

#[test]
fn test_quorum_waits_for_enough_criteria() {
    let mut method = NelderMead::new()
        .with_objective(paraboloid)
        .with_convergence(MaxIterations::new(3))
        .with_convergence(MaxIterations::new(5))
        .with_converge_criteria_needed(2);
    let result = method.run(Some(&[0.0, 0.0])).unwrap();
    assert_eq!(result.iterations, 5);
    assert_eq!(result.converged_by, vec!["MaxIterations", "MaxIterations"]);

    let mut impossible = NelderMead::new()
        .with_objective(paraboloid)
        .with_convergence(MaxIterations::new(3))
        .with_converge_criteria_needed(2);
    assert!(matches!(
        impossible.run(Some(&[0.0, 0.0])),
        Err(Error::InvalidInput(_))
    ));
}

#[test]
fn test_single_objective_methods_refuse_several() {
    let mut method = NelderMead::new()
        .with_objective(paraboloid)
        .with_objective(|x: &[f64]| x[0])
        .with_convergence(MaxIterations::new(3));
    assert!(matches!(
        method.run(Some(&[0.0, 0.0])),
        Err(Error::InvalidInput(_))
    ));
}

#[test]
fn test_rerun_starts_from_clean_state() {
    let mut method = NelderMead::new()
        .with_objective(paraboloid)
        .with_convergence(DeltaX::new(0.0))
        .with_convergence(MaxIterations::new(40));
    let first = method.run(Some(&[3.0, -2.0])).unwrap();
    let second = method.run(Some(&[3.0, -2.0])).unwrap();
    assert_eq!(first, second);
    assert_eq!(method.evaluations(), second.evaluations);

    method.reset_function_evaluation_database();
    assert_eq!(method.evaluations(), 0);
    assert_eq!(method.iterations(), 0);
    assert!(method.x_best().is_empty());
}

#[test]
fn test_inequality_constraint_through_penalty() {
    let mut method = NelderMead::new()
        .with_objective(|x: &[f64]| (x[0] - 3.0).powi(2) + (x[1] - 3.0).powi(2))
        .with_constraint(Constraint::inequality(|x: &[f64]| x[0] + x[1] - 2.0))
        .with_merit(SquaredExteriorPenalty::new(1e3))
        .with_convergence(MaxSpanInPopulation::new(1e-9))
        .with_convergence(MaxIterations::new(2000));
    let result = method.run(Some(&[0.0, 0.0])).unwrap();
    // Exterior penalties stop just outside the boundary: t = (3 + 2w)/(1 + 2w).
    let t = 2003.0 / 2001.0;
    assert_abs_diff_eq!(result.optimal_point[0], t, epsilon = 1e-4);
    assert_abs_diff_eq!(result.optimal_point[1], t, epsilon = 1e-4);
}

#[test]
fn test_maximization_reports_caller_orientation() {
    let mut method = HookeJeeves::new()
        .with_objective(|x: &[f64]| 5.0 - paraboloid(x))
        .with_direction(OptimizeDirection::Maximize)
        .with_convergence(MaxIterations::new(100));
    let result = method.run(Some(&[0.0, 0.0])).unwrap();
    assert_eq!(result.optimal_point, vec![1.0, 1.0]);
    assert_eq!(result.optimal_value, 5.0);
    assert_eq!(method.f_best(), 5.0);
}

struct Squares {
    shared: Arc<Mutex<Vec<f64>>>,
    calls: Arc<AtomicUsize>,
}

impl DependentAnalysis for Squares {
    fn calculate(&self, x: &[f64]) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut shared) = self.shared.lock() {
            *shared = x.iter().map(|v| (v - 2.0).powi(2)).collect();
        }
    }
}

#[test]
fn test_dependent_analysis_runs_before_each_evaluation() {
    let shared = Arc::new(Mutex::new(Vec::new()));
    let calls = Arc::new(AtomicUsize::new(0));
    let reader = Arc::clone(&shared);
    let mut method = HookeJeeves::new()
        .with_dependent_analysis(Squares {
            shared: Arc::clone(&shared),
            calls: Arc::clone(&calls),
        })
        .with_objective(move |_: &[f64]| reader.lock().map(|s| s.iter().sum::<f64>()).unwrap_or(f64::NAN))
        .with_convergence(MaxIterations::new(50));
    let result = method.run(Some(&[0.0, 0.0])).unwrap();
    assert_eq!(result.optimal_point, vec![2.0, 2.0]);
    assert_eq!(calls.load(Ordering::Relaxed), result.evaluations);
}

#[test]
fn test_memoized_objective_serves_repeats() {
    let memo = Arc::new(Memoized::exact(paraboloid));
    let shared = Arc::clone(&memo);
    let mut method = HookeJeeves::new()
        .with_objective(move |x: &[f64]| shared.evaluate(x))
        .with_convergence(MaxIterations::new(30));
    let result = method.run(Some(&[0.0, 0.0])).unwrap();
    assert_eq!(memo.hits() + memo.misses(), result.evaluations);
}
