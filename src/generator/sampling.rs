use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::design_space::DesignSpaceDescription;
use crate::generator::value_from_unit;

/// Produces fresh points over a design space.
pub trait SamplingGenerator {
    fn generate(&mut self, count: usize) -> Vec<Vec<f64>>;
}

/// Independent uniform samples. Discrete variables are drawn uniformly over
/// their positions.
#[derive(Debug, Clone)]
pub struct RandomSampling {
    space: DesignSpaceDescription,
    rng: ChaCha8Rng,
}

impl RandomSampling {
    pub fn new(space: DesignSpaceDescription) -> Self {
        Self {
            space,
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    pub fn with_seed(space: DesignSpaceDescription, seed: u64) -> Self {
        Self {
            space,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// One uniform point.
    pub fn sample(&mut self) -> Vec<f64> {
        let rng = &mut self.rng;
        self.space
            .iter()
            .map(|var| value_from_unit(var, rng.gen::<f64>()))
            .collect()
    }
}

impl SamplingGenerator for RandomSampling {
    fn generate(&mut self, count: usize) -> Vec<Vec<f64>> {
        (0..count).map(|_| self.sample()).collect()
    }
}

/// Latin hypercube design: each variable's range is cut into `count` equal
/// strata and every stratum is used exactly once per variable.
#[derive(Debug, Clone)]
pub struct LatinHypercube {
    space: DesignSpaceDescription,
    rng: ChaCha8Rng,
}

impl LatinHypercube {
    pub fn new(space: DesignSpaceDescription) -> Self {
        Self {
            space,
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    pub fn with_seed(space: DesignSpaceDescription, seed: u64) -> Self {
        Self {
            space,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl SamplingGenerator for LatinHypercube {
    fn generate(&mut self, count: usize) -> Vec<Vec<f64>> {
        let mut points = vec![Vec::with_capacity(self.space.len()); count];
        if count == 0 {
            return points;
        }
        for var in self.space.iter() {
            let mut strata: Vec<usize> = (0..count).collect();
            strata.shuffle(&mut self.rng);
            for (point, stratum) in points.iter_mut().zip(strata) {
                let u = (stratum as f64 + self.rng.gen::<f64>()) / count as f64;
                point.push(value_from_unit(var, u));
            }
        }
        points
    }
}
