use log::{debug, info};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::candidate::Candidate;
use crate::error::{Error, Result};
use crate::generator::{
    BitStringCrossover, GeneticCrossover, GeneticMutation, RandomSampling, SamplingGenerator,
};
use crate::optimizer::{OptimizationMethod, OptimizerCore, Problem, Requirement};
use crate::selector::{non_dominated_fronts, ParetoSelector, RandomPairwiseCompare, Selector};

/// Configuration for [`GeneticAlgorithm`].
#[derive(Debug, Clone, Copy)]
pub struct GeneticConfig {
    /// Survivors kept after each generation.
    pub population_size: usize,
    /// Expected crossover events per parent pair, used by the standard
    /// operators.
    pub crossover_rate: f64,
    /// Expected bit flips per chromosome, used by the standard operators.
    pub mutation_rate: f64,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population_size: 40,
            crossover_rate: 1.0,
            mutation_rate: 1.0,
        }
    }
}

/// Generational genetic algorithm over a design space.
///
/// Each generation breeds children by crossover followed by mutation, adds a
/// mutated copy of every parent, evaluates the offspring and lets the
/// selector cut parents plus offspring back to `population_size`. Supports
/// several objectives when the selector does (see [`ParetoSelector`]); the
/// final non-dominated set is returned in
/// [`OptimizationResult::pareto_front`](crate::optimizer::OptimizationResult::pareto_front).
pub struct GeneticAlgorithm {
    core: OptimizerCore,
    pub config: GeneticConfig,
    crossover: Option<GeneticCrossover>,
    mutation: Option<GeneticMutation>,
    selector: Option<Box<dyn Selector>>,
    standard_operators: bool,
}

impl Default for GeneticAlgorithm {
    fn default() -> Self {
        Self {
            core: OptimizerCore::default(),
            config: GeneticConfig::default(),
            crossover: None,
            mutation: None,
            selector: None,
            standard_operators: false,
        }
    }
}

impl GeneticAlgorithm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: GeneticConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_crossover(mut self, crossover: GeneticCrossover) -> Self {
        self.crossover = Some(crossover);
        self
    }

    pub fn with_mutation(mut self, mutation: GeneticMutation) -> Self {
        self.mutation = Some(mutation);
        self
    }

    pub fn with_selector(mut self, selector: impl Selector + 'static) -> Self {
        self.selector = Some(Box::new(selector));
        self
    }

    /// Fills any operator left unset when the run starts: bit-string
    /// crossover and mutation over the design space at the configured
    /// rates, and pairwise tournament selection (Pareto selection for
    /// several objectives). Operators are seeded from the driver seed.
    pub fn with_standard_operators(mut self) -> Self {
        self.standard_operators = true;
        self
    }

    fn fill_standard_operators(&mut self) -> Result<()> {
        if !self.standard_operators {
            return Ok(());
        }
        let space = self
            .core
            .space()
            .cloned()
            .ok_or(Error::MissingComponents(vec![Requirement::DesignSpace]))?;
        let seed = self.core.seed();
        let direction = self.core.direction();
        let config = self.config;
        if self.crossover.is_none() {
            let crossover = match seed {
                Some(s) => BitStringCrossover::with_seed(space.clone(), config.crossover_rate, s),
                None => BitStringCrossover::new(space.clone(), config.crossover_rate),
            };
            self.crossover = Some(GeneticCrossover::BitString(crossover));
        }
        if self.mutation.is_none() {
            self.mutation = Some(match seed {
                Some(s) => GeneticMutation::with_seed(space, config.mutation_rate, s.wrapping_add(1)),
                None => GeneticMutation::new(space, config.mutation_rate),
            });
        }
        if self.selector.is_none() {
            let selector: Box<dyn Selector> = if self.core.problem.num_objectives() > 1 {
                Box::new(ParetoSelector::new(direction))
            } else {
                match seed {
                    Some(s) => Box::new(RandomPairwiseCompare::with_seed(direction, s.wrapping_add(2))),
                    None => Box::new(RandomPairwiseCompare::new(direction)),
                }
            };
            self.selector = Some(selector);
        }
        Ok(())
    }
}

/// Evaluates every point; in parallel unless a dependent analysis holds
/// shared state between objective calls.
#[cfg(feature = "parallel")]
fn evaluate_population(problem: &Problem, points: Vec<Vec<f64>>) -> Vec<Candidate> {
    if problem.has_dependent_analysis() {
        return points.into_iter().map(|x| evaluate_one(problem, x)).collect();
    }
    points
        .into_par_iter()
        .map(|x| evaluate_one(problem, x))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn evaluate_population(problem: &Problem, points: Vec<Vec<f64>>) -> Vec<Candidate> {
    points.into_iter().map(|x| evaluate_one(problem, x)).collect()
}

fn evaluate_one(problem: &Problem, x: Vec<f64>) -> Candidate {
    let objectives = problem.evaluate_all(&x);
    Candidate::new(x, objectives)
}

impl OptimizationMethod for GeneticAlgorithm {
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
            Requirement::DesignSpace,
            Requirement::Crossover,
            Requirement::Mutation,
            Requirement::Selector,
        ]
    }

    fn provides(&self, requirement: Requirement) -> bool {
        match requirement {
            Requirement::Crossover => self.standard_operators || self.crossover.is_some(),
            Requirement::Mutation => self.standard_operators || self.mutation.is_some(),
            Requirement::Selector => self.standard_operators || self.selector.is_some(),
            _ => false,
        }
    }

    fn supports_multiple_objectives(&self) -> bool {
        true
    }

    fn search(&mut self, x0: Vec<f64>) -> Result<()> {
        self.fill_standard_operators()?;
        let size = self.config.population_size.max(2);
        let core = &mut self.core;
        let (Some(crossover), Some(mutation), Some(selector)) = (
            self.crossover.as_mut(),
            self.mutation.as_mut(),
            self.selector.as_mut(),
        ) else {
            return Err(Error::MissingComponents(vec![
                Requirement::Crossover,
                Requirement::Mutation,
                Requirement::Selector,
            ]));
        };
        let space = core
            .space()
            .cloned()
            .ok_or(Error::MissingComponents(vec![Requirement::DesignSpace]))?;

        let mut sampler = match core.seed() {
            Some(seed) => RandomSampling::with_seed(space.clone(), seed.wrapping_add(3)),
            None => RandomSampling::new(space.clone()),
        };
        let mut initial = vec![space.snap(&x0)?];
        initial.extend(sampler.generate(size - 1));
        let mut population = evaluate_population(&core.problem, initial);
        for candidate in &population {
            core.record(&candidate.x, candidate.f());
        }
        info!(
            "genetic algorithm started with {} candidates, best f = {}",
            population.len(),
            core.f_best()
        );

        loop {
            let parents: Vec<Vec<f64>> = population.iter().map(|c| c.x.clone()).collect();
            let children = crossover.generate(&parents)?;
            let mut offspring = mutation.generate(&children)?;
            offspring.extend(mutation.generate(&parents)?);
            debug!(
                "generation {}: {} children from {} parents",
                core.iteration() + 1,
                offspring.len(),
                parents.len()
            );

            let evaluated = evaluate_population(&core.problem, offspring);
            for candidate in &evaluated {
                core.record(&candidate.x, candidate.f());
            }
            population.extend(evaluated);
            population = selector.select(population, size);

            core.next_iteration();
            let members: Vec<Vec<f64>> = population.iter().map(|c| c.x.clone()).collect();
            if core.converged(Some(&members), None)? {
                break;
            }
        }

        if core.problem.num_objectives() > 1 {
            let direction = core.direction();
            let front = non_dominated_fronts(&population, direction)
                .into_iter()
                .next()
                .unwrap_or_default();
            let front = front.into_iter().map(|i| population[i].clone()).collect();
            core.set_pareto_front(front);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::OptimizeDirection;
    use crate::convergence::MaxIterations;
    use crate::design_space::{DesignSpaceDescription, VariableDescriptor};
    use crate::selector::KeepBest;

    fn grid() -> DesignSpaceDescription {
        DesignSpaceDescription::new(vec![
            VariableDescriptor::stepped(-5.0, 5.0, 0.5).unwrap(),
            VariableDescriptor::stepped(-5.0, 5.0, 0.5).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_finds_grid_minimum() {
        let mut ga = GeneticAlgorithm::new()
            .with_objective(|x: &[f64]| (x[0] - 1.5).powi(2) + (x[1] + 2.0).powi(2))
            .with_space(grid())
            .with_standard_operators()
            .with_config(GeneticConfig {
                population_size: 30,
                ..GeneticConfig::default()
            })
            .with_convergence(MaxIterations::new(60))
            .with_seed(11);
        let result = ga.run(Some(&[-5.0, 5.0])).unwrap();
        assert!(result.optimal_value <= 0.25);
        assert!((result.optimal_point[0] - 1.5).abs() <= 0.5);
        assert!((result.optimal_point[1] + 2.0).abs() <= 0.5);
        assert!(result.pareto_front.is_empty());
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let build = || {
            GeneticAlgorithm::new()
                .with_objective(|x: &[f64]| x[0].abs() + x[1].abs())
                .with_space(grid())
                .with_standard_operators()
                .with_convergence(MaxIterations::new(5))
                .with_seed(3)
        };
        let a = build().run(None).unwrap();
        let b = build().run(None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_maximize_with_explicit_operators() {
        let space = grid();
        let mut ga = GeneticAlgorithm::new()
            .with_objective(|x: &[f64]| -(x[0] * x[0]) - x[1] * x[1])
            .with_space(space.clone())
            .with_direction(OptimizeDirection::Maximize)
            .with_crossover(GeneticCrossover::BitString(BitStringCrossover::with_seed(
                space.clone(),
                1.0,
                1,
            )))
            .with_mutation(GeneticMutation::with_seed(space, 1.0, 2))
            .with_selector(KeepBest::new(OptimizeDirection::Maximize))
            .with_convergence(MaxIterations::new(80))
            .with_seed(5);
        let result = ga.run(None).unwrap();
        assert!(result.optimal_value >= -0.5);
        assert!(result.optimal_value <= 0.0);
    }

    #[test]
    fn test_pareto_front_for_two_objectives() {
        let space = DesignSpaceDescription::new(vec![
            VariableDescriptor::stepped(0.0, 2.0, 0.125).unwrap(),
        ])
        .unwrap();
        let mut ga = GeneticAlgorithm::new()
            .with_objective(|x: &[f64]| x[0] * x[0])
            .with_objective(|x: &[f64]| (x[0] - 2.0).powi(2))
            .with_space(space)
            .with_standard_operators()
            .with_convergence(MaxIterations::new(30))
            .with_seed(9);
        let result = ga.run(None).unwrap();
        assert!(!result.pareto_front.is_empty());
        for member in &result.pareto_front {
            assert_eq!(member.objectives.len(), 2);
            assert!((0.0..=2.0).contains(&member.x[0]));
        }
    }

    #[test]
    fn test_missing_operators_reported_together() {
        let mut ga = GeneticAlgorithm::new()
            .with_objective(|x: &[f64]| x[0])
            .with_space(grid());
        let err = ga.run(None).unwrap_err();
        assert_eq!(
            err,
            Error::MissingComponents(vec![
                Requirement::ConvergenceCriterion,
                Requirement::Crossover,
                Requirement::Mutation,
                Requirement::Selector,
            ])
        );
    }
}
