use log::debug;

use crate::candidate::Candidate;
use crate::error::{Error, Result};
use crate::generator::NeighborGenerator;
use crate::optimizer::{OptimizationMethod, OptimizerCore, Requirement};
use crate::selector::{KeepSingleBest, Selector};

/// Discrete hill climbing.
///
/// Each iteration evaluates the neighbors proposed around the current point
/// and moves to the one the selector keeps, if it improves. With
/// `first_improvement` the move happens as soon as an improving neighbor is
/// seen. When an exhaustive neighbor generator offers no improvement the
/// point is a local optimum and the run stops on its own.
pub struct HillClimbing {
    core: OptimizerCore,
    neighbors: Option<Box<dyn NeighborGenerator>>,
    selector: Option<Box<dyn Selector>>,
    pub first_improvement: bool,
}

impl Default for HillClimbing {
    fn default() -> Self {
        Self {
            core: OptimizerCore::default(),
            neighbors: None,
            selector: None,
            first_improvement: false,
        }
    }
}

impl HillClimbing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_neighbor_generator(mut self, neighbors: impl NeighborGenerator + 'static) -> Self {
        self.neighbors = Some(Box::new(neighbors));
        self
    }

    /// Replaces the default [`KeepSingleBest`] choice among neighbors.
    pub fn with_selector(mut self, selector: impl Selector + 'static) -> Self {
        self.selector = Some(Box::new(selector));
        self
    }

    pub fn with_first_improvement(mut self, first_improvement: bool) -> Self {
        self.first_improvement = first_improvement;
        self
    }
}

impl OptimizationMethod for HillClimbing {
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
        ]
    }

    fn provides(&self, requirement: Requirement) -> bool {
        matches!(requirement, Requirement::NeighborGenerator) && self.neighbors.is_some()
    }

    fn search(&mut self, x0: Vec<f64>) -> Result<()> {
        let direction = self.core.direction();
        let selector = self
            .selector
            .get_or_insert_with(|| Box::new(KeepSingleBest::new(direction)));
        let core = &mut self.core;
        let Some(neighbors) = self.neighbors.as_mut() else {
            return Err(Error::MissingComponents(vec![Requirement::NeighborGenerator]));
        };

        let mut x = x0;
        let mut fx = core.problem.evaluate(&x);
        core.record(&x, fx);

        loop {
            let mut improving = Vec::new();
            for neighbor in neighbors.generate(&x)? {
                let f = core.problem.evaluate(&neighbor);
                core.record(&neighbor, f);
                if direction.is_better(f, fx) {
                    improving.push(Candidate::scalar(neighbor, f));
                    if self.first_improvement {
                        break;
                    }
                }
            }

            core.next_iteration();
            let exhaustive = neighbors.exhaustive();
            match selector.select(improving, 1).into_iter().next() {
                Some(best) => {
                    neighbors.feedback(direction.sign() * (fx - best.f()));
                    debug!("moved to f = {}", best.f());
                    fx = best.f();
                    x = best.x;
                }
                None if exhaustive => {
                    core.finish(vec!["NoImprovingNeighbor"]);
                    return Ok(());
                }
                None => {}
            }
            if core.converged(None, None)? {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::OptimizeDirection;
    use crate::convergence::MaxIterations;
    use crate::design_space::{DesignSpaceDescription, VariableDescriptor};
    use crate::generator::{ExhaustiveNeighborGenerator, RandomNeighborGenerator};

    fn grid() -> DesignSpaceDescription {
        DesignSpaceDescription::new(vec![
            VariableDescriptor::stepped(0.0, 20.0, 1.0).unwrap(),
            VariableDescriptor::stepped(0.0, 20.0, 1.0).unwrap(),
        ])
        .unwrap()
    }

    fn bowl(x: &[f64]) -> f64 {
        (x[0] - 7.0).powi(2) + (x[1] - 13.0).powi(2)
    }

    #[test]
    fn test_exhaustive_climb_stops_at_optimum() {
        let space = grid();
        let mut climber = HillClimbing::new()
            .with_objective(bowl)
            .with_neighbor_generator(ExhaustiveNeighborGenerator::new(space, 8))
            .with_convergence(MaxIterations::new(500));
        let result = climber.run(Some(&[0.0, 0.0])).unwrap();
        assert_eq!(result.optimal_point, vec![7.0, 13.0]);
        assert!(result.converged);
        assert_eq!(result.converged_by, vec!["NoImprovingNeighbor"]);
        assert!(result.iterations < 500);
    }

    #[test]
    fn test_first_improvement_with_random_neighbors() {
        let space = grid();
        let mut climber = HillClimbing::new()
            .with_objective(bowl)
            .with_neighbor_generator(RandomNeighborGenerator::with_seed(space, 8, 4))
            .with_first_improvement(true)
            .with_convergence(MaxIterations::new(2000));
        let result = climber.run(Some(&[20.0, 0.0])).unwrap();
        assert_eq!(result.optimal_point, vec![7.0, 13.0]);
        assert_eq!(result.converged_by, vec!["MaxIterations"]);
    }

    #[test]
    fn test_maximizing_climb() {
        let space = grid();
        let mut climber = HillClimbing::new()
            .with_objective(|x: &[f64]| -bowl(x))
            .with_direction(OptimizeDirection::Maximize)
            .with_neighbor_generator(ExhaustiveNeighborGenerator::new(space, 4))
            .with_convergence(MaxIterations::new(500));
        let result = climber.run(Some(&[20.0, 20.0])).unwrap();
        assert_eq!(result.optimal_point, vec![7.0, 13.0]);
        assert_eq!(result.optimal_value, 0.0);
    }
}
