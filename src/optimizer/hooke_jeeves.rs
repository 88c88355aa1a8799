use log::trace;

use crate::error::Result;
use crate::optimizer::{OptimizationMethod, OptimizerCore, Requirement};

/// Step control for [`HookeJeeves`].
#[derive(Debug, Clone, Copy)]
pub struct HookeJeevesConfig {
    pub initial_step: f64,
    /// Factor applied to the step after an exploration that finds nothing.
    pub step_reduction: f64,
}

impl Default for HookeJeevesConfig {
    fn default() -> Self {
        Self {
            initial_step: 0.5,
            step_reduction: 0.5,
        }
    }
}

/// Hooke-Jeeves pattern search.
///
/// An exploratory pass tries `±step` along each coordinate in turn, keeping
/// every improvement. If the pass improves on the base point, a pattern move
/// jumps by the same displacement again and explores from there; otherwise
/// the step shrinks. Points are snapped into the design space when one is
/// set.
#[derive(Default)]
pub struct HookeJeeves {
    core: OptimizerCore,
    pub config: HookeJeevesConfig,
    step: f64,
}

impl HookeJeeves {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: HookeJeevesConfig) -> Self {
        self.config = config;
        self
    }

    /// Exploration step at the end of the last run.
    pub fn step(&self) -> f64 {
        self.step
    }
}

fn evaluate(core: &mut OptimizerCore, x: Vec<f64>) -> Result<(Vec<f64>, f64)> {
    let x = match core.space() {
        Some(space) => space.snap(&x)?,
        None => x,
    };
    let v = core.problem.minimization_value(&x);
    core.record_minimization(&x, v);
    Ok((x, v))
}

fn explore(
    core: &mut OptimizerCore,
    mut x: Vec<f64>,
    mut fx: f64,
    step: f64,
) -> Result<(Vec<f64>, f64)> {
    for i in 0..x.len() {
        for delta in [step, -step] {
            let mut trial = x.clone();
            trial[i] += delta;
            let (trial, ft) = evaluate(core, trial)?;
            if ft < fx {
                x = trial;
                fx = ft;
                break;
            }
        }
    }
    Ok((x, fx))
}

impl OptimizationMethod for HookeJeeves {
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
        ]
    }

    fn search(&mut self, x0: Vec<f64>) -> Result<()> {
        let core = &mut self.core;
        self.step = self.config.initial_step;
        let (mut base, mut f_base) = evaluate(core, x0)?;

        loop {
            let (explored, f_explored) = explore(core, base.clone(), f_base, self.step)?;
            if f_explored < f_base {
                let jump: Vec<f64> = explored
                    .iter()
                    .zip(&base)
                    .map(|(e, b)| 2.0 * e - b)
                    .collect();
                base = explored;
                f_base = f_explored;
                let (pattern, f_pattern) = evaluate(core, jump)?;
                let (moved, f_moved) = explore(core, pattern, f_pattern, self.step)?;
                if f_moved < f_base {
                    trace!("pattern move accepted, f = {f_moved}");
                    base = moved;
                    f_base = f_moved;
                }
            } else {
                self.step *= self.config.step_reduction;
                trace!("no improvement, step now {}", self.step);
            }

            core.next_iteration();
            if core.converged(None, None)? {
                return Ok(());
            }
        }
    }
}
