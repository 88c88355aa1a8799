//! Optimization drivers.
//!
//! Every driver shares the same life cycle: validate the configuration,
//! resolve a starting point, then iterate and check convergence once per
//! iteration until the configured quorum of criteria agrees. The shared state
//! (problem, criteria, best point, counters) lives in an [`OptimizerCore`];
//! the [`OptimizationMethod`] trait provides the configuration surface and the
//! `run` entry point on top of each driver's own `search` loop.

mod exhaustive;
mod genetic_algorithm;
mod gradient_based;
mod hill_climbing;
mod hooke_jeeves;
mod problem;
mod simplex;
mod simulated_annealing;

#[cfg(test)]
mod tests;

pub use exhaustive::{ExhaustiveSearch, DEFAULT_MAX_ENUMERATION};
pub use genetic_algorithm::{GeneticAlgorithm, GeneticConfig};
pub use gradient_based::{GradientBased, GradientConfig};
pub use hill_climbing::HillClimbing;
pub use hooke_jeeves::{HookeJeeves, HookeJeevesConfig};
pub use problem::Problem;
pub use simplex::{NelderMead, SimplexConfig, SphericalSearch};
pub use simulated_annealing::{AnnealingConfig, SimulatedAnnealing};

use log::{debug, info};

use crate::candidate::{Candidate, OptimizeDirection};
use crate::convergence::{ConvergenceCriterion, ConvergenceState};
use crate::design_space::DesignSpaceDescription;
use crate::error::{Error, Result};
use crate::function::{Constraint, DependentAnalysis, Differencing, ObjectiveFunction};
use crate::generator::RandomSampling;
use crate::merit::MeritFunction;

/// A component an optimization method needs before it can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Requirement {
    Objective,
    ConvergenceCriterion,
    DesignSpace,
    /// A design space whose variables are all discrete.
    DiscreteSpace,
    /// An explicit starting point, or a design space to draw one from.
    StartingPoint,
    SearchDirection,
    LineSearch,
    NeighborGenerator,
    Crossover,
    Mutation,
    Selector,
    CoolingSchedule,
}

/// Outcome of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    /// Best decision vector found.
    pub optimal_point: Vec<f64>,
    /// Merit value at `optimal_point` (objective plus any penalty).
    pub optimal_value: f64,
    pub iterations: usize,
    pub evaluations: usize,
    /// Whether the run stopped because its stopping rule was met.
    pub converged: bool,
    /// Names of the criteria (or stopping rules) that held on the last check.
    pub converged_by: Vec<&'static str>,
    /// Non-dominated candidates, for multi-objective runs.
    pub pareto_front: Vec<Candidate>,
}

/// Registered convergence criteria with their quorum.
pub struct ConvergenceSet {
    criteria: Vec<Box<dyn ConvergenceCriterion>>,
    needed: usize,
}

impl ConvergenceSet {
    fn new() -> Self {
        Self {
            criteria: Vec::new(),
            needed: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// How many criteria must hold on the same check.
    pub fn needed(&self) -> usize {
        self.needed
    }

    /// Runs every criterion so stateful ones see every iteration, and returns
    /// the names of those that hold.
    pub fn check(&mut self, state: &ConvergenceState<'_>) -> Result<Vec<&'static str>> {
        let mut fired = Vec::new();
        for criterion in self.criteria.iter_mut() {
            if criterion.converged(state)? {
                fired.push(criterion.name());
            }
        }
        Ok(fired)
    }

    fn reset(&mut self) {
        for criterion in self.criteria.iter_mut() {
            criterion.reset();
        }
    }
}

/// State shared by every driver.
pub struct OptimizerCore {
    pub(crate) problem: Problem,
    pub(crate) convergence: ConvergenceSet,
    seed: Option<u64>,
    x_best: Vec<f64>,
    f_best: f64,
    iteration: usize,
    converged: bool,
    converged_by: Vec<&'static str>,
    pareto_front: Vec<Candidate>,
}

impl Default for OptimizerCore {
    fn default() -> Self {
        Self {
            problem: Problem::new(),
            convergence: ConvergenceSet::new(),
            seed: None,
            x_best: Vec::new(),
            f_best: f64::NAN,
            iteration: 0,
            converged: false,
            converged_by: Vec::new(),
            pareto_front: Vec::new(),
        }
    }
}

impl OptimizerCore {
    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    pub fn convergence(&self) -> &ConvergenceSet {
        &self.convergence
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn x_best(&self) -> &[f64] {
        &self.x_best
    }

    /// Best merit value, in the caller's orientation.
    pub fn f_best(&self) -> f64 {
        self.f_best
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub(crate) fn space(&self) -> Option<&DesignSpaceDescription> {
        self.problem.space()
    }

    pub(crate) fn direction(&self) -> OptimizeDirection {
        self.problem.direction()
    }

    /// Whether a shared component is present.
    fn provides(&self, requirement: Requirement, has_start: bool) -> bool {
        match requirement {
            Requirement::Objective => self.problem.num_objectives() > 0,
            Requirement::ConvergenceCriterion => !self.convergence.is_empty(),
            Requirement::DesignSpace => self.space().is_some(),
            Requirement::DiscreteSpace => self
                .space()
                .is_some_and(|s| !s.is_empty() && s.all_discrete()),
            Requirement::StartingPoint => has_start || self.space().is_some(),
            _ => false,
        }
    }

    /// Clears the best point, the counters and every criterion's history.
    pub(crate) fn reset(&mut self) {
        self.problem.reset_evaluations();
        self.convergence.reset();
        self.x_best.clear();
        self.f_best = f64::NAN;
        self.iteration = 0;
        self.converged = false;
        self.converged_by.clear();
        self.pareto_front.clear();
    }

    /// Uses `x0`, or draws a point from the design space.
    fn starting_point(&self, x0: Option<&[f64]>) -> Result<Vec<f64>> {
        match (x0, self.space()) {
            (Some(x0), _) => {
                self.problem.check_point(x0)?;
                Ok(x0.to_vec())
            }
            (None, Some(space)) => {
                let mut sampler = match self.seed {
                    Some(seed) => RandomSampling::with_seed(space.clone(), seed),
                    None => RandomSampling::new(space.clone()),
                };
                Ok(sampler.sample())
            }
            (None, None) => Err(Error::MissingComponents(vec![Requirement::StartingPoint])),
        }
    }

    /// Records `(x, f)` if it beats the best so far. `f` is a merit value in
    /// the caller's orientation.
    pub(crate) fn record(&mut self, x: &[f64], f: f64) -> bool {
        let better = self.x_best.is_empty()
            || self.f_best.is_nan()
            || self.direction().is_better(f, self.f_best);
        if better {
            self.x_best = x.to_vec();
            self.f_best = f;
        }
        better
    }

    /// Same as [`record`](Self::record) for a minimization value.
    pub(crate) fn record_minimization(&mut self, x: &[f64], v: f64) -> bool {
        let f = self.direction().sign() * v;
        self.record(x, f)
    }

    pub(crate) fn next_iteration(&mut self) {
        self.iteration += 1;
        debug!(
            "iteration {}: {} evaluations, best f = {}",
            self.iteration,
            self.problem.evaluations(),
            self.f_best
        );
    }

    /// Checks the criteria against the current state.
    pub(crate) fn converged(
        &mut self,
        population: Option<&[Vec<f64>]>,
        gradient: Option<&[f64]>,
    ) -> Result<bool> {
        if self.convergence.is_empty() {
            return Ok(false);
        }
        let state = ConvergenceState {
            iteration: Some(self.iteration),
            evaluations: Some(self.problem.evaluations()),
            f_best: Some(self.f_best),
            x_best: Some(&self.x_best),
            population,
            gradient,
        };
        let fired = self.convergence.check(&state)?;
        if fired.len() >= self.convergence.needed {
            self.finish(fired);
            return Ok(true);
        }
        Ok(false)
    }

    /// Marks the run as converged by the given rules.
    pub(crate) fn finish(&mut self, by: Vec<&'static str>) {
        info!(
            "converged after {} iterations and {} evaluations: {:?}",
            self.iteration,
            self.problem.evaluations(),
            by
        );
        self.converged = true;
        self.converged_by = by;
    }

    pub(crate) fn set_pareto_front(&mut self, front: Vec<Candidate>) {
        self.pareto_front = front;
    }

    fn result(&self) -> OptimizationResult {
        OptimizationResult {
            optimal_point: self.x_best.clone(),
            optimal_value: self.f_best,
            iterations: self.iteration,
            evaluations: self.problem.evaluations(),
            converged: self.converged,
            converged_by: self.converged_by.clone(),
            pareto_front: self.pareto_front.clone(),
        }
    }
}

/// Configuration surface and run loop shared by every driver.
///
/// Drivers implement [`core`](Self::core), [`requirements`](Self::requirements),
/// [`provides`](Self::provides) for their own collaborators, and
/// [`search`](Self::search). Everything else is provided.
///
/// # Examples
///
/// ```
/// use optkit::convergence::{DeltaX, MaxIterations};
/// use optkit::line_search::GoldenSection;
/// use optkit::optimizer::{GradientBased, OptimizationMethod};
/// use optkit::search_direction::SteepestDescent;
///
/// let mut method = GradientBased::new()
///     .with_objective(|x: &[f64]| (x[0] - 1.0).powi(2) + (x[1] + 2.0).powi(2))
///     .with_search_direction(SteepestDescent::new())
///     .with_line_search(GoldenSection::new(1e-8, 1.0))
///     .with_convergence(DeltaX::new(1e-6))
///     .with_convergence(MaxIterations::new(100));
/// let result = method.run(Some(&[0.0, 0.0])).unwrap();
/// assert!((result.optimal_point[0] - 1.0).abs() < 1e-4);
/// assert!((result.optimal_point[1] + 2.0).abs() < 1e-4);
/// ```
pub trait OptimizationMethod {
    fn core(&self) -> &OptimizerCore;

    fn core_mut(&mut self) -> &mut OptimizerCore;

    /// Components this method cannot run without.
    fn requirements(&self) -> Vec<Requirement>;

    /// Whether a method-specific component has been supplied.
    fn provides(&self, _requirement: Requirement) -> bool {
        false
    }

    fn supports_multiple_objectives(&self) -> bool {
        false
    }

    /// Iterates from `x0` until convergence. Called by [`run`](Self::run)
    /// after validation, with freshly reset state.
    fn search(&mut self, x0: Vec<f64>) -> Result<()>;

    /// Every missing requirement, given whether a start point was supplied.
    fn missing_components(&self, has_start: bool) -> Vec<Requirement> {
        let mut missing: Vec<Requirement> = self
            .requirements()
            .into_iter()
            .filter(|&r| !self.core().provides(r, has_start) && !self.provides(r))
            .collect();
        missing.dedup();
        missing
    }

    /// Validates the configuration and runs the method.
    ///
    /// Without `x0` the start point is drawn from the design space. All
    /// missing components are reported together in one
    /// [`Error::MissingComponents`].
    fn run(&mut self, x0: Option<&[f64]>) -> Result<OptimizationResult> {
        let missing = self.missing_components(x0.is_some());
        if !missing.is_empty() {
            return Err(Error::MissingComponents(missing));
        }
        let core = self.core();
        if core.problem.num_objectives() > 1 && !self.supports_multiple_objectives() {
            return Err(Error::InvalidInput(
                "this method optimizes a single objective".into(),
            ));
        }
        let (criteria, needed) = (core.convergence.len(), core.convergence.needed);
        if criteria > 0 && (needed == 0 || needed > criteria) {
            return Err(Error::InvalidInput(format!(
                "{needed} criteria needed to converge but {criteria} registered"
            )));
        }
        self.core_mut().reset();
        let start = self.core().starting_point(x0)?;
        self.search(start)?;
        Ok(self.core().result())
    }

    /// Clears counters, best point and criterion histories so the same
    /// configuration can run again.
    fn reset_function_evaluation_database(&mut self) {
        self.core_mut().reset();
    }

    fn x_best(&self) -> &[f64] {
        self.core().x_best()
    }

    fn f_best(&self) -> f64 {
        self.core().f_best()
    }

    fn iterations(&self) -> usize {
        self.core().iteration()
    }

    fn evaluations(&self) -> usize {
        self.core().problem.evaluations()
    }

    fn with_objective(mut self, objective: impl ObjectiveFunction + 'static) -> Self
    where
        Self: Sized,
    {
        self.core_mut().problem.add_objective(objective);
        self
    }

    fn with_constraint(mut self, constraint: Constraint) -> Self
    where
        Self: Sized,
    {
        self.core_mut().problem.add_constraint(constraint);
        self
    }

    fn with_space(mut self, space: DesignSpaceDescription) -> Self
    where
        Self: Sized,
    {
        self.core_mut().problem.set_space(space);
        self
    }

    fn with_convergence(mut self, criterion: impl ConvergenceCriterion + 'static) -> Self
    where
        Self: Sized,
    {
        self.core_mut().convergence.criteria.push(Box::new(criterion));
        self
    }

    /// Number of criteria that must hold on the same check (default 1).
    fn with_converge_criteria_needed(mut self, needed: usize) -> Self
    where
        Self: Sized,
    {
        self.core_mut().convergence.needed = needed;
        self
    }

    fn with_direction(mut self, direction: OptimizeDirection) -> Self
    where
        Self: Sized,
    {
        self.core_mut().problem.set_direction(direction);
        self
    }

    fn with_merit(mut self, merit: impl MeritFunction + 'static) -> Self
    where
        Self: Sized,
    {
        self.core_mut().problem.set_merit(merit);
        self
    }

    fn with_differencing(mut self, differencing: Differencing) -> Self
    where
        Self: Sized,
    {
        self.core_mut().problem.set_differencing(differencing);
        self
    }

    fn with_dependent_analysis(mut self, analysis: impl DependentAnalysis + 'static) -> Self
    where
        Self: Sized,
    {
        self.core_mut().problem.set_dependent_analysis(analysis);
        self
    }

    /// Seeds the randomness owned by the driver itself (start point
    /// sampling, initial populations). Collaborators keep their own seeds.
    fn with_seed(mut self, seed: u64) -> Self
    where
        Self: Sized,
    {
        self.core_mut().seed = Some(seed);
        self
    }
}
