use log::trace;
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::Normal;

use crate::design_space::DesignSpaceDescription;
use crate::error::{Error, Result};
use crate::generator::sampling_range;

/// Proposes moves from a current point.
pub trait NeighborGenerator {
    /// Neighbors of `x`. An empty result means no valid move exists.
    fn generate(&mut self, x: &[f64]) -> Result<Vec<Vec<f64>>>;

    /// Credits the most recently proposed move with `improvement` (positive
    /// when the move made things better).
    fn feedback(&mut self, _improvement: f64) {}

    /// Whether `generate` returns every valid neighbor, so that an empty
    /// improvement set proves a local optimum.
    fn exhaustive(&self) -> bool {
        false
    }
}

/// Shared state of the change-vector based generators.
#[derive(Debug, Clone)]
struct ChangeVectors {
    space: DesignSpaceDescription,
    changes: Vec<Vec<i64>>,
}

impl ChangeVectors {
    fn new(space: DesignSpaceDescription, minimum_neighbors: usize) -> Self {
        let changes = space.create_neighbor_change_vectors(minimum_neighbors);
        Self { space, changes }
    }

    fn valid(&self, x: &[f64]) -> Result<Vec<usize>> {
        self.space.find_valid_changes(x, &self.changes)
    }

    fn apply(&self, x: &[f64], k: usize) -> Result<Vec<f64>> {
        self.space.apply_change(x, &self.changes[k])
    }
}

/// Picks one valid change vector uniformly at random.
#[derive(Debug, Clone)]
pub struct RandomNeighborGenerator {
    vectors: ChangeVectors,
    rng: ChaCha8Rng,
}

impl RandomNeighborGenerator {
    pub fn new(space: DesignSpaceDescription, minimum_neighbors: usize) -> Self {
        Self {
            vectors: ChangeVectors::new(space, minimum_neighbors),
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    pub fn with_seed(space: DesignSpaceDescription, minimum_neighbors: usize, seed: u64) -> Self {
        Self {
            vectors: ChangeVectors::new(space, minimum_neighbors),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn change_vectors(&self) -> &[Vec<i64>] {
        &self.vectors.changes
    }
}

impl NeighborGenerator for RandomNeighborGenerator {
    fn generate(&mut self, x: &[f64]) -> Result<Vec<Vec<f64>>> {
        let valid = self.vectors.valid(x)?;
        match valid.choose(&mut self.rng) {
            Some(&k) => Ok(vec![self.vectors.apply(x, k)?]),
            None => Ok(Vec::new()),
        }
    }
}

/// Chooses change vectors in proportion to the improvement they have
/// produced so far.
///
/// Each vector starts with a score of one. Positive feedback adds the
/// improvement to the score of the vector that produced it. Selection
/// probabilities are the normalized scores of the currently valid vectors,
/// raised to at least `min_probability`.
#[derive(Debug, Clone)]
pub struct StochasticNeighborGenerator {
    vectors: ChangeVectors,
    scores: Vec<f64>,
    min_probability: f64,
    last: Option<usize>,
    rng: ChaCha8Rng,
}

impl StochasticNeighborGenerator {
    pub fn new(space: DesignSpaceDescription, minimum_neighbors: usize) -> Self {
        Self::from_rng(space, minimum_neighbors, ChaCha8Rng::from_entropy())
    }

    pub fn with_seed(space: DesignSpaceDescription, minimum_neighbors: usize, seed: u64) -> Self {
        Self::from_rng(space, minimum_neighbors, ChaCha8Rng::seed_from_u64(seed))
    }

    fn from_rng(space: DesignSpaceDescription, minimum_neighbors: usize, rng: ChaCha8Rng) -> Self {
        let vectors = ChangeVectors::new(space, minimum_neighbors);
        let scores = vec![1.0; vectors.changes.len()];
        Self {
            vectors,
            scores,
            min_probability: 0.01,
            last: None,
            rng,
        }
    }

    /// Sets the probability floor given to every valid move.
    pub fn with_min_probability(mut self, min_probability: f64) -> Self {
        self.min_probability = min_probability.clamp(0.0, 1.0);
        self
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    /// Selection probabilities over the given valid vector indices.
    pub fn probabilities(&self, valid: &[usize]) -> Vec<f64> {
        let total: f64 = valid.iter().map(|&k| self.scores[k]).sum();
        valid
            .iter()
            .map(|&k| {
                let p = if total > 0.0 {
                    self.scores[k] / total
                } else {
                    1.0 / valid.len() as f64
                };
                p.max(self.min_probability)
            })
            .collect()
    }
}

impl NeighborGenerator for StochasticNeighborGenerator {
    fn generate(&mut self, x: &[f64]) -> Result<Vec<Vec<f64>>> {
        let valid = self.vectors.valid(x)?;
        if valid.is_empty() {
            self.last = None;
            return Ok(Vec::new());
        }
        let weights = WeightedIndex::new(self.probabilities(&valid))
            .map_err(|e| Error::InvalidInput(format!("invalid move weights: {e}")))?;
        let k = valid[weights.sample(&mut self.rng)];
        self.last = Some(k);
        Ok(vec![self.vectors.apply(x, k)?])
    }

    fn feedback(&mut self, improvement: f64) {
        if let Some(k) = self.last {
            if improvement > 0.0 && improvement.is_finite() {
                self.scores[k] += improvement;
                trace!("change vector {k} score now {}", self.scores[k]);
            }
        }
    }
}

/// Returns every valid neighbor.
#[derive(Debug, Clone)]
pub struct ExhaustiveNeighborGenerator {
    vectors: ChangeVectors,
}

impl ExhaustiveNeighborGenerator {
    pub fn new(space: DesignSpaceDescription, minimum_neighbors: usize) -> Self {
        Self {
            vectors: ChangeVectors::new(space, minimum_neighbors),
        }
    }
}

impl NeighborGenerator for ExhaustiveNeighborGenerator {
    fn generate(&mut self, x: &[f64]) -> Result<Vec<Vec<f64>>> {
        self.vectors
            .valid(x)?
            .into_iter()
            .map(|k| self.vectors.apply(x, k))
            .collect()
    }

    fn exhaustive(&self) -> bool {
        true
    }
}

/// Normal perturbation of every variable.
///
/// Continuous variables move by `N(0, σ)` with `σ = scale · range` (the range
/// of an unbounded variable is its sampling range) and are clamped to their
/// bounds. Discrete variables move by a rounded `N(0, scale · size)` number of
/// positions, at least one position in either direction with probability
/// one half.
#[derive(Debug, Clone)]
pub struct GaussianNeighborGenerator {
    space: DesignSpaceDescription,
    scale: f64,
    count: usize,
    rng: ChaCha8Rng,
}

impl GaussianNeighborGenerator {
    pub fn new(space: DesignSpaceDescription, scale: f64) -> Self {
        Self::from_rng(space, scale, ChaCha8Rng::from_entropy())
    }

    pub fn with_seed(space: DesignSpaceDescription, scale: f64, seed: u64) -> Self {
        Self::from_rng(space, scale, ChaCha8Rng::seed_from_u64(seed))
    }

    fn from_rng(space: DesignSpaceDescription, scale: f64, rng: ChaCha8Rng) -> Self {
        Self {
            space,
            scale,
            count: 1,
            rng,
        }
    }

    /// Number of neighbors returned per call.
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count.max(1);
        self
    }

    fn perturb(&mut self, x: &[f64]) -> Result<Vec<f64>> {
        let mut moved = Vec::with_capacity(x.len());
        for (var, &xi) in self.space.iter().zip(x.iter()) {
            match var.size() {
                Some(size) => {
                    let sigma = (self.scale * size as f64).max(0.5);
                    let normal = normal(sigma)?;
                    let position = var.position_of(xi).unwrap_or(0) as f64;
                    let target = (position + normal.sample(&mut self.rng).round())
                        .clamp(0.0, size.saturating_sub(1) as f64);
                    moved.push(var.value_at(target as u64).unwrap_or(xi));
                }
                None => {
                    let (lo, hi) = sampling_range(var);
                    let normal = normal(self.scale * (hi - lo))?;
                    moved.push(var.snap(xi + normal.sample(&mut self.rng)));
                }
            }
        }
        Ok(moved)
    }
}

fn normal(sigma: f64) -> Result<Normal<f64>> {
    Normal::new(0.0, sigma)
        .map_err(|e| Error::InvalidInput(format!("invalid perturbation scale {sigma}: {e}")))
}

impl NeighborGenerator for GaussianNeighborGenerator {
    fn generate(&mut self, x: &[f64]) -> Result<Vec<Vec<f64>>> {
        self.space.check_dimension(x.len())?;
        (0..self.count).map(|_| self.perturb(x)).collect()
    }
}
