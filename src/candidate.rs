//! Evaluated points and comparison direction.

use std::cmp::Ordering;

/// Whether the objective is minimized or maximized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptimizeDirection {
    #[default]
    Minimize,
    Maximize,
}

impl OptimizeDirection {
    /// `1.0` when minimizing, `-1.0` when maximizing. Multiplying an
    /// objective by this turns every problem into a minimization.
    pub fn sign(&self) -> f64 {
        match self {
            OptimizeDirection::Minimize => 1.0,
            OptimizeDirection::Maximize => -1.0,
        }
    }

    /// Whether `a` is strictly better than `b`.
    pub fn is_better(&self, a: f64, b: f64) -> bool {
        match self {
            OptimizeDirection::Minimize => a < b,
            OptimizeDirection::Maximize => a > b,
        }
    }

    /// Orders values so that the better one comes first. NaN sorts last.
    pub fn compare(&self, a: f64, b: f64) -> Ordering {
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let ordering = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
                match self {
                    OptimizeDirection::Minimize => ordering,
                    OptimizeDirection::Maximize => ordering.reverse(),
                }
            }
        }
    }
}

/// A decision vector together with its objective value(s).
///
/// Objective values already include any constraint penalty. Candidates are
/// not modified after evaluation; generators produce new ones.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub x: Vec<f64>,
    pub objectives: Vec<f64>,
}

impl Candidate {
    pub fn new(x: Vec<f64>, objectives: Vec<f64>) -> Self {
        Self { x, objectives }
    }

    /// A candidate with a single objective value.
    pub fn scalar(x: Vec<f64>, f: f64) -> Self {
        Self {
            x,
            objectives: vec![f],
        }
    }

    /// First (or only) objective value; NaN if the candidate is unevaluated.
    pub fn f(&self) -> f64 {
        self.objectives.first().copied().unwrap_or(f64::NAN)
    }

    pub fn is_evaluated(&self) -> bool {
        !self.objectives.is_empty()
    }

    /// Pareto dominance: no objective is worse and at least one is better.
    pub fn dominates(&self, other: &Candidate, direction: OptimizeDirection) -> bool {
        let mut strictly_better = false;
        for (&a, &b) in self.objectives.iter().zip(other.objectives.iter()) {
            if direction.is_better(b, a) {
                return false;
            }
            if direction.is_better(a, b) {
                strictly_better = true;
            }
        }
        strictly_better
    }
}

/// Sorts candidates by their first objective, best first.
pub fn sort_by_objective(candidates: &mut [Candidate], direction: OptimizeDirection) {
    candidates.sort_by(|a, b| direction.compare(a.f(), b.f()));
}
