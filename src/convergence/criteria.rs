use std::time::{Duration, Instant};

use crate::convergence::{ConvergenceCriterion, ConvergenceState};
use crate::error::{Error, Result};
use crate::linalg::{distance1, distance2, norm2};

/// Stops once `iteration ≥ max`.
#[derive(Debug, Clone)]
pub struct MaxIterations {
    pub max: usize,
}

impl MaxIterations {
    pub fn new(max: usize) -> Self {
        Self { max }
    }
}

impl ConvergenceCriterion for MaxIterations {
    fn name(&self) -> &'static str {
        "MaxIterations"
    }

    fn converged(&mut self, state: &ConvergenceState<'_>) -> Result<bool> {
        Ok(state.require_iteration(self.name())? >= self.max)
    }
}

/// Stops once the cumulative number of function evaluations reaches `max`.
#[derive(Debug, Clone)]
pub struct MaxFunctionEvals {
    pub max: usize,
}

impl MaxFunctionEvals {
    pub fn new(max: usize) -> Self {
        Self { max }
    }
}

impl ConvergenceCriterion for MaxFunctionEvals {
    fn name(&self) -> &'static str {
        "MaxFunctionEvals"
    }

    fn converged(&mut self, state: &ConvergenceState<'_>) -> Result<bool> {
        Ok(state.require_evaluations(self.name())? >= self.max)
    }
}

/// Stops when the best x moved by at most `epsilon` (L1) since the previous
/// call. The first call only records x.
#[derive(Debug, Clone)]
pub struct DeltaX {
    pub epsilon: f64,
    last: Option<Vec<f64>>,
}

impl DeltaX {
    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon,
            last: None,
        }
    }
}

impl ConvergenceCriterion for DeltaX {
    fn name(&self) -> &'static str {
        "DeltaX"
    }

    fn converged(&mut self, state: &ConvergenceState<'_>) -> Result<bool> {
        let x = state.require_x_best(self.name())?;
        let converged = match &self.last {
            Some(last) => {
                check_same_length(last, x)?;
                distance1(last, x) <= self.epsilon
            }
            None => false,
        };
        self.last = Some(x.to_vec());
        Ok(converged)
    }

    fn reset(&mut self) {
        self.last = None;
    }
}

/// Stops when the best f changed by at most `epsilon` since the previous
/// call. The first call only records f.
#[derive(Debug, Clone)]
pub struct DeltaF {
    pub epsilon: f64,
    last: Option<f64>,
}

impl DeltaF {
    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon,
            last: None,
        }
    }
}

impl ConvergenceCriterion for DeltaF {
    fn name(&self) -> &'static str {
        "DeltaF"
    }

    fn converged(&mut self, state: &ConvergenceState<'_>) -> Result<bool> {
        let f = state.require_f_best(self.name())?;
        let converged = self
            .last
            .is_some_and(|last| (f - last).abs() <= self.epsilon);
        self.last = Some(f);
        Ok(converged)
    }

    fn reset(&mut self) {
        self.last = None;
    }
}

/// Stops when the Euclidean norm of the gradient is at most `epsilon`.
#[derive(Debug, Clone)]
pub struct DeltaGradF {
    pub epsilon: f64,
}

impl DeltaGradF {
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }
}

impl ConvergenceCriterion for DeltaGradF {
    fn name(&self) -> &'static str {
        "DeltaGradF"
    }

    fn converged(&mut self, state: &ConvergenceState<'_>) -> Result<bool> {
        Ok(norm2(state.require_gradient(self.name())?) <= self.epsilon)
    }
}

/// Stops when the best x has stayed put (within `same_tolerance`, L1) for
/// `max_age` consecutive calls.
#[derive(Debug, Clone)]
pub struct MaxAge {
    pub max_age: usize,
    pub same_tolerance: f64,
    age: usize,
    last: Option<Vec<f64>>,
}

impl MaxAge {
    pub fn new(max_age: usize, same_tolerance: f64) -> Self {
        Self {
            max_age,
            same_tolerance,
            age: 0,
            last: None,
        }
    }

    /// Consecutive calls without movement so far.
    pub fn age(&self) -> usize {
        self.age
    }
}

impl ConvergenceCriterion for MaxAge {
    fn name(&self) -> &'static str {
        "MaxAge"
    }

    fn converged(&mut self, state: &ConvergenceState<'_>) -> Result<bool> {
        let x = state.require_x_best(self.name())?;
        match &self.last {
            Some(last) => {
                check_same_length(last, x)?;
                if distance1(last, x) <= self.same_tolerance {
                    self.age += 1;
                } else {
                    self.age = 0;
                }
            }
            None => self.age = 0,
        }
        self.last = Some(x.to_vec());
        Ok(self.age >= self.max_age)
    }

    fn reset(&mut self) {
        self.age = 0;
        self.last = None;
    }
}

/// Stops when every pair of population members is within `min_span`
/// (Euclidean). An empty population never converges.
#[derive(Debug, Clone)]
pub struct MaxSpanInPopulation {
    pub min_span: f64,
}

impl MaxSpanInPopulation {
    pub fn new(min_span: f64) -> Self {
        Self { min_span }
    }

    /// Largest pairwise distance in the population.
    pub fn span(population: &[Vec<f64>]) -> f64 {
        let mut span: f64 = 0.0;
        for (i, a) in population.iter().enumerate() {
            for b in &population[i + 1..] {
                span = span.max(distance2(a, b));
            }
        }
        span
    }
}

impl ConvergenceCriterion for MaxSpanInPopulation {
    fn name(&self) -> &'static str {
        "MaxSpanInPopulation"
    }

    fn converged(&mut self, state: &ConvergenceState<'_>) -> Result<bool> {
        let population = state.require_population(self.name())?;
        if population.is_empty() {
            return Ok(false);
        }
        Ok(Self::span(population) <= self.min_span)
    }
}

/// Stops when `f_known − negative_tolerance < f < f_known + positive_tolerance`.
#[derive(Debug, Clone)]
pub struct ToKnownBestF {
    pub f_known: f64,
    pub positive_tolerance: f64,
    pub negative_tolerance: f64,
}

impl ToKnownBestF {
    pub fn new(f_known: f64, positive_tolerance: f64, negative_tolerance: f64) -> Self {
        Self {
            f_known,
            positive_tolerance,
            negative_tolerance,
        }
    }
}

impl ConvergenceCriterion for ToKnownBestF {
    fn name(&self) -> &'static str {
        "ToKnownBestF"
    }

    fn converged(&mut self, state: &ConvergenceState<'_>) -> Result<bool> {
        let f = state.require_f_best(self.name())?;
        Ok(f > self.f_known - self.negative_tolerance && f < self.f_known + self.positive_tolerance)
    }
}

/// Stops when the best x is within `tolerance` (Euclidean) of a known optimum.
#[derive(Debug, Clone)]
pub struct ToKnownBestX {
    pub x_known: Vec<f64>,
    pub tolerance: f64,
}

impl ToKnownBestX {
    pub fn new(x_known: Vec<f64>, tolerance: f64) -> Self {
        Self { x_known, tolerance }
    }
}

impl ConvergenceCriterion for ToKnownBestX {
    fn name(&self) -> &'static str {
        "ToKnownBestX"
    }

    fn converged(&mut self, state: &ConvergenceState<'_>) -> Result<bool> {
        let x = state.require_x_best(self.name())?;
        check_same_length(&self.x_known, x)?;
        Ok(distance2(&self.x_known, x) <= self.tolerance)
    }
}

/// Stops once `duration` of wall-clock time has passed.
///
/// The clock restarts on [`reset`](ConvergenceCriterion::reset), which every
/// driver calls at the start of `run`, so the budget covers one run and
/// excludes time spent between building the criterion and running it.
#[derive(Debug, Clone)]
pub struct MaxTime {
    pub duration: Duration,
    started: Instant,
}

impl MaxTime {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            started: Instant::now(),
        }
    }
}

impl ConvergenceCriterion for MaxTime {
    fn name(&self) -> &'static str {
        "MaxTime"
    }

    fn converged(&mut self, _state: &ConvergenceState<'_>) -> Result<bool> {
        Ok(self.started.elapsed() >= self.duration)
    }

    fn reset(&mut self) {
        self.started = Instant::now();
    }
}

fn check_same_length(expected: &[f64], found: &[f64]) -> Result<()> {
    if expected.len() != found.len() {
        return Err(Error::DimensionMismatch {
            expected: expected.len(),
            found: found.len(),
        });
    }
    Ok(())
}
