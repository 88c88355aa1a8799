use log::debug;
use ndarray::{Array1, Array2, Axis};

use crate::linalg::{normalize, subtract};
use crate::search_direction::SearchDirection;

/// Powell's conjugate direction set.
///
/// Cycles through a basis of `n` directions (rows of an `n × n` matrix,
/// initially the identity). After a full cycle the net displacement `u` is
/// searched next and then replaces the oldest basis direction. The basis goes
/// back to the identity every `reset_interval` cycles, or as soon as the line
/// search reports a step shorter than `min_alpha`.
#[derive(Debug, Clone)]
pub struct PowellDirections {
    pub reset_interval: usize,
    pub min_alpha: f64,
    basis: Option<Array2<f64>>,
    cursor: usize,
    cycle_start: Vec<f64>,
    new_cycle: bool,
    cycles: usize,
    stalled: bool,
}

impl PowellDirections {
    pub fn new(reset_interval: usize, min_alpha: f64) -> Self {
        Self {
            reset_interval,
            min_alpha,
            basis: None,
            cursor: 0,
            cycle_start: Vec::new(),
            new_cycle: true,
            cycles: 0,
            stalled: false,
        }
    }

    /// The current direction set, one direction per row.
    pub fn basis(&self) -> Option<&Array2<f64>> {
        self.basis.as_ref()
    }

    fn needs_reset(&self, reset: bool, n: usize) -> bool {
        reset
            || self.stalled
            || self.basis.as_ref().map_or(true, |b| b.nrows() != n)
            || (self.reset_interval > 0 && self.cycles >= self.reset_interval)
    }

    fn replace_oldest(basis: &mut Array2<f64>, direction: &[f64]) {
        let n = basis.nrows();
        for i in 1..n {
            let row = basis.row(i).to_owned();
            basis.row_mut(i - 1).assign(&row);
        }
        basis
            .row_mut(n - 1)
            .assign(&Array1::from(direction.to_vec()));
    }
}

impl Default for PowellDirections {
    fn default() -> Self {
        Self::new(10, 1e-10)
    }
}

impl SearchDirection for PowellDirections {
    fn find(&mut self, x: &[f64], _gradient: &[f64], _f: f64, reset: bool) -> Vec<f64> {
        let n = x.len();
        if self.needs_reset(reset, n) {
            debug!("Powell direction set reset to the coordinate axes");
            self.basis = Some(Array2::eye(n));
            self.cursor = 0;
            self.cycles = 0;
            self.stalled = false;
            self.new_cycle = true;
        }
        if self.new_cycle {
            self.cycle_start = x.to_vec();
            self.new_cycle = false;
        }
        let basis = match self.basis.as_mut() {
            Some(basis) => basis,
            None => return vec![0.0; n],
        };

        if self.cursor < n {
            let direction = basis.index_axis(Axis(0), self.cursor).to_vec();
            self.cursor += 1;
            return direction;
        }

        self.cursor = 0;
        self.new_cycle = true;
        self.cycles += 1;
        match normalize(&subtract(x, &self.cycle_start)) {
            Some(average) => {
                Self::replace_oldest(basis, &average);
                average
            }
            None => {
                self.new_cycle = false;
                self.cycle_start = x.to_vec();
                self.cursor = 1;
                basis.index_axis(Axis(0), 0).to_vec()
            }
        }
    }

    fn observe_step(&mut self, alpha: f64) {
        if alpha.abs() < self.min_alpha {
            self.stalled = true;
        }
    }

    fn requires_gradient(&self) -> bool {
        false
    }
}
