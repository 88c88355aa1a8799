use log::{debug, info};

use crate::cooling::CoolingSchedule;
use crate::error::{Error, Result};
use crate::generator::NeighborGenerator;
use crate::optimizer::{OptimizationMethod, OptimizerCore, Requirement};
use crate::selector::Metropolis;

/// Configuration for [`SimulatedAnnealing`].
#[derive(Debug, Clone, Copy)]
pub struct AnnealingConfig {
    /// Neighbors of the start point evaluated to set the initial
    /// temperature.
    pub initial_samples: usize,
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        Self {
            initial_samples: 20,
        }
    }
}

/// Simulated annealing.
///
/// The cooling schedule picks the initial temperature from a sample of
/// neighbor values around the start point. At each temperature the driver
/// proposes `samples_per_temperature` neighbors and moves to each one the
/// Metropolis test accepts; one temperature step is one iteration.
pub struct SimulatedAnnealing {
    core: OptimizerCore,
    pub config: AnnealingConfig,
    neighbors: Option<Box<dyn NeighborGenerator>>,
    cooling: Option<Box<dyn CoolingSchedule>>,
    temperature: f64,
}

impl Default for SimulatedAnnealing {
    fn default() -> Self {
        Self {
            core: OptimizerCore::default(),
            config: AnnealingConfig::default(),
            neighbors: None,
            cooling: None,
            temperature: f64::NAN,
        }
    }
}

impl SimulatedAnnealing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: AnnealingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_neighbor_generator(mut self, neighbors: impl NeighborGenerator + 'static) -> Self {
        self.neighbors = Some(Box::new(neighbors));
        self
    }

    pub fn with_cooling_schedule(mut self, cooling: impl CoolingSchedule + 'static) -> Self {
        self.cooling = Some(Box::new(cooling));
        self
    }

    /// Temperature at the end of the last run.
    pub fn temperature(&self) -> f64 {
        self.temperature
    }
}

impl OptimizationMethod for SimulatedAnnealing {
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
            Requirement::NeighborGenerator,
            Requirement::CoolingSchedule,
        ]
    }

    fn provides(&self, requirement: Requirement) -> bool {
        match requirement {
            Requirement::NeighborGenerator => self.neighbors.is_some(),
            Requirement::CoolingSchedule => self.cooling.is_some(),
            _ => false,
        }
    }

    fn search(&mut self, x0: Vec<f64>) -> Result<()> {
        let core = &mut self.core;
        let (Some(neighbors), Some(cooling)) = (self.neighbors.as_mut(), self.cooling.as_mut())
        else {
            return Err(Error::MissingComponents(vec![
                Requirement::NeighborGenerator,
                Requirement::CoolingSchedule,
            ]));
        };
        let direction = core.direction();
        let mut metropolis = match core.seed() {
            Some(seed) => Metropolis::with_seed(direction, seed.wrapping_add(4)),
            None => Metropolis::new(direction),
        };

        let mut x = x0;
        let mut fx = core.problem.evaluate(&x);
        core.record(&x, fx);

        let mut samples = vec![fx];
        for _ in 0..self.config.initial_samples {
            let Some(neighbor) = neighbors.generate(&x)?.into_iter().next() else {
                break;
            };
            let f = core.problem.evaluate(&neighbor);
            core.record(&neighbor, f);
            samples.push(f);
        }
        let mut temperature = cooling.initial_temperature(&samples);
        info!("annealing from T = {temperature} with f = {fx}");

        loop {
            let mut seen = Vec::with_capacity(cooling.samples_per_temperature());
            let mut accepted = 0usize;
            for _ in 0..cooling.samples_per_temperature() {
                let Some(candidate) = neighbors.generate(&x)?.into_iter().next() else {
                    break;
                };
                let fc = core.problem.evaluate(&candidate);
                core.record(&candidate, fc);
                seen.push(fc);
                neighbors.feedback(direction.sign() * (fx - fc));
                if metropolis.accept(fx, fc, temperature) {
                    x = candidate;
                    fx = fc;
                    accepted += 1;
                }
            }
            debug!(
                "T = {temperature}: accepted {accepted} of {} moves, f = {fx}",
                seen.len()
            );

            core.next_iteration();
            temperature = cooling.update(temperature, &seen);
            self.temperature = temperature;
            if core.converged(None, None)? {
                return Ok(());
            }
        }
    }
}
