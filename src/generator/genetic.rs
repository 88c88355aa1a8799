//! Bit-string genetic operators.
//!
//! Discrete variables are stored as fixed-width big-endian bit strings of
//! their position (`⌈log2(size)⌉` bits). Continuous variables are carried as
//! raw reals and only ever exchanged whole.

use bitvec::prelude::*;
use log::trace;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use crate::design_space::DesignSpaceDescription;
use crate::error::{Error, Result};
use crate::generator::sampling_range;

/// One encoded variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Gene {
    Bits(BitVec<u8, Msb0>),
    Real(f64),
}

impl Gene {
    /// Number of crossover positions this gene contributes.
    fn positions(&self) -> usize {
        match self {
            Gene::Bits(bits) => bits.len(),
            Gene::Real(_) => 1,
        }
    }
}

pub type Chromosome = Vec<Gene>;

/// Converts points of a design space to and from chromosomes.
#[derive(Debug, Clone)]
pub struct BitStringCodec {
    space: DesignSpaceDescription,
    widths: Vec<Option<usize>>,
}

impl BitStringCodec {
    pub fn new(space: DesignSpaceDescription) -> Self {
        let widths = space.iter().map(|var| var.size().map(bits_for)).collect();
        Self { space, widths }
    }

    pub fn space(&self) -> &DesignSpaceDescription {
        &self.space
    }

    /// Bit width of each variable, `None` for continuous ones.
    pub fn widths(&self) -> &[Option<usize>] {
        &self.widths
    }

    /// Total number of encoded bits.
    pub fn bit_length(&self) -> usize {
        self.widths.iter().flatten().sum()
    }

    pub fn encode(&self, x: &[f64]) -> Result<Chromosome> {
        let positions = self.space.positions_of(x)?;
        Ok(positions
            .iter()
            .zip(self.widths.iter())
            .zip(x.iter())
            .map(|((position, width), &xi)| match (position, width) {
                (Some(p), Some(w)) => Gene::Bits(encode_position(*p, *w)),
                _ => Gene::Real(xi),
            })
            .collect())
    }

    /// Decodes a chromosome. Bit patterns past the last position decode to
    /// the last position.
    pub fn decode(&self, chromosome: &[Gene]) -> Result<Vec<f64>> {
        self.space.check_dimension(chromosome.len())?;
        self.space
            .iter()
            .zip(chromosome.iter())
            .enumerate()
            .map(|(i, (var, gene))| match (gene, var.size()) {
                (Gene::Bits(bits), Some(size)) => {
                    let position = decode_position(bits).min(size.saturating_sub(1));
                    var.value_at(position).ok_or_else(|| {
                        Error::InvalidInput(format!("position {position} invalid for variable {i}"))
                    })
                }
                (Gene::Real(v), None) => Ok(*v),
                _ => Err(Error::InvalidInput(format!(
                    "gene {i} does not match the discreteness of its variable"
                ))),
            })
            .collect()
    }
}

/// `⌈log2(size)⌉`, the width needed to address `size` positions.
pub fn bits_for(size: u64) -> usize {
    if size <= 1 {
        0
    } else {
        (64 - (size - 1).leading_zeros()) as usize
    }
}

fn encode_position(position: u64, width: usize) -> BitVec<u8, Msb0> {
    let mut bits = bitvec![u8, Msb0; 0; width];
    for i in 0..width {
        let shift = width - 1 - i;
        bits.set(i, (position >> shift) & 1 == 1);
    }
    bits
}

/// Per-position event probability `rate / positions`, capped at one.
fn event_probability(rate: f64, positions: usize) -> Result<f64> {
    if !rate.is_finite() || rate < 0.0 {
        return Err(Error::InvalidInput(format!(
            "genetic operator rate must be finite and non-negative, got {rate}"
        )));
    }
    Ok((rate / positions.max(1) as f64).min(1.0))
}

fn decode_position(bits: &BitSlice<u8, Msb0>) -> u64 {
    bits.iter().fold(0u64, |acc, bit| (acc << 1) | u64::from(*bit))
}

/// Bit-flip mutation with per-bit probability `rate / bit_length`.
///
/// Real genes are perturbed by `N(0, real_scale · range)` with probability
/// `rate / chromosome_length` and clamped to their bounds.
#[derive(Debug, Clone)]
pub struct GeneticMutation {
    codec: BitStringCodec,
    pub rate: f64,
    pub real_scale: f64,
    rng: ChaCha8Rng,
}

impl GeneticMutation {
    pub fn new(space: DesignSpaceDescription, rate: f64) -> Self {
        Self::from_rng(space, rate, ChaCha8Rng::from_entropy())
    }

    pub fn with_seed(space: DesignSpaceDescription, rate: f64, seed: u64) -> Self {
        Self::from_rng(space, rate, ChaCha8Rng::seed_from_u64(seed))
    }

    fn from_rng(space: DesignSpaceDescription, rate: f64, rng: ChaCha8Rng) -> Self {
        Self {
            codec: BitStringCodec::new(space),
            rate,
            real_scale: 0.1,
            rng,
        }
    }

    /// Mutates a chromosome in place, returning how many genes changed.
    pub fn mutate(&mut self, chromosome: &mut Chromosome) -> Result<usize> {
        let bit_probability = match self.codec.bit_length() {
            0 => 0.0,
            length => event_probability(self.rate, length)?,
        };
        let real_probability = event_probability(self.rate, chromosome.len())?;
        let mut changed = 0;
        for (gene, var) in chromosome.iter_mut().zip(self.codec.space.iter()) {
            match gene {
                Gene::Bits(bits) => {
                    let mut flipped = false;
                    for i in 0..bits.len() {
                        if self.rng.gen_bool(bit_probability) {
                            let current = bits[i];
                            bits.set(i, !current);
                            flipped = true;
                        }
                    }
                    changed += usize::from(flipped);
                }
                Gene::Real(v) => {
                    if self.rng.gen_bool(real_probability) {
                        let (lo, hi) = sampling_range(var);
                        let sigma = self.real_scale * (hi - lo);
                        let normal = Normal::new(0.0, sigma).map_err(|e| {
                            Error::InvalidInput(format!("invalid mutation scale {sigma}: {e}"))
                        })?;
                        *v = var.snap(*v + normal.sample(&mut self.rng));
                        changed += 1;
                    }
                }
            }
        }
        Ok(changed)
    }

    /// One mutated child per parent.
    pub fn generate(&mut self, parents: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        parents
            .iter()
            .map(|parent| {
                let mut chromosome = self.codec.encode(parent)?;
                self.mutate(&mut chromosome)?;
                self.codec.decode(&chromosome)
            })
            .collect()
    }
}

/// Multi-point bit-level crossover.
///
/// Parents are paired at random. Walking the concatenated positions of a
/// pair (every bit, plus one position per real gene), a crossover event fires
/// with probability `rate / positions` at each position. An event swaps the
/// remaining bits of the current gene and every later gene, then records
/// both resulting chromosomes as children.
#[derive(Debug, Clone)]
pub struct BitStringCrossover {
    codec: BitStringCodec,
    pub rate: f64,
    rng: ChaCha8Rng,
}

impl BitStringCrossover {
    pub fn new(space: DesignSpaceDescription, rate: f64) -> Self {
        Self::from_rng(space, rate, ChaCha8Rng::from_entropy())
    }

    pub fn with_seed(space: DesignSpaceDescription, rate: f64, seed: u64) -> Self {
        Self::from_rng(space, rate, ChaCha8Rng::seed_from_u64(seed))
    }

    fn from_rng(space: DesignSpaceDescription, rate: f64, rng: ChaCha8Rng) -> Self {
        Self {
            codec: BitStringCodec::new(space),
            rate,
            rng,
        }
    }

    /// Crosses two chromosomes, returning the children of every event.
    pub fn cross(&mut self, a: &Chromosome, b: &Chromosome) -> Result<Vec<Chromosome>> {
        let positions: usize = a.iter().map(Gene::positions).sum();
        let probability = event_probability(self.rate, positions)?;
        if positions == 0 {
            return Ok(Vec::new());
        }
        let (mut a, mut b) = (a.clone(), b.clone());
        let mut children = Vec::new();
        for gene in 0..a.len() {
            for offset in 0..a[gene].positions() {
                if self.rng.gen_bool(probability) {
                    swap_tails(&mut a, &mut b, gene, offset);
                    children.push(a.clone());
                    children.push(b.clone());
                }
            }
        }
        Ok(children)
    }

    pub fn generate(&mut self, parents: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        let mut encoded = parents
            .iter()
            .map(|p| self.codec.encode(p))
            .collect::<Result<Vec<_>>>()?;
        encoded.shuffle(&mut self.rng);
        let mut children = Vec::new();
        for pair in encoded.chunks_exact(2) {
            for child in self.cross(&pair[0], &pair[1])? {
                children.push(self.codec.decode(&child)?);
            }
        }
        trace!("crossover produced {} children", children.len());
        Ok(children)
    }
}

/// Swaps `a` and `b` from bit `offset` of gene `gene` to the end.
fn swap_tails(a: &mut Chromosome, b: &mut Chromosome, gene: usize, offset: usize) {
    match (&mut a[gene], &mut b[gene]) {
        (Gene::Bits(x), Gene::Bits(y)) => {
            for i in offset..x.len().min(y.len()) {
                let (xi, yi) = (x[i], y[i]);
                x.set(i, yi);
                y.set(i, xi);
            }
        }
        (x, y) => std::mem::swap(x, y),
    }
    for k in gene + 1..a.len().min(b.len()) {
        std::mem::swap(&mut a[k], &mut b[k]);
    }
}

/// Crossover operators for the genetic algorithm.
#[derive(Debug, Clone)]
pub enum GeneticCrossover {
    BitString(BitStringCrossover),
    /// Reserved; always fails with [`Error::NotImplemented`].
    DifferentialEvolution,
}

impl GeneticCrossover {
    pub fn generate(&mut self, parents: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        match self {
            GeneticCrossover::BitString(crossover) => crossover.generate(parents),
            GeneticCrossover::DifferentialEvolution => {
                Err(Error::NotImplemented("differential evolution crossover"))
            }
        }
    }
}
