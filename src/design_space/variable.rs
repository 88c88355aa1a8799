use crate::design_space::{MAX_TO_STORE_IMPLICITLY, TOLERANCE_FOR_SAME};
use crate::error::{Error, Result};

/// How a variable's domain is discretized.
#[derive(Debug, Clone, PartialEq)]
enum Domain {
    Continuous,
    /// Arithmetic progression `lower_bound + k * delta` for `k` in `0..size`.
    /// `cache` holds the expanded values when `size` is under the storage limit.
    Stepped {
        delta: f64,
        size: u64,
        cache: Option<Vec<f64>>,
    },
    /// Explicit list of admissible values, in the order given.
    Enumerated { values: Vec<f64> },
}

/// Describes the domain of one decision variable.
///
/// A variable is either continuous on `[lower_bound, upper_bound]` (bounds may
/// be infinite) or discrete. Discrete variables are defined by a step `delta`
/// from the lower bound or by an explicit list of values. Positions index the
/// discrete values from `0` to `size - 1`.
///
/// # Examples
///
/// ```
/// use optkit::design_space::VariableDescriptor;
///
/// let teeth = VariableDescriptor::stepped(12.0, 60.0, 4.0).unwrap();
/// assert_eq!(teeth.size(), Some(13));
/// assert_eq!(teeth.position_of(20.0), Some(2));
/// assert_eq!(teeth.value_at(2), Some(20.0));
/// assert_eq!(teeth.position_of(21.0), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDescriptor {
    lower_bound: f64,
    upper_bound: f64,
    domain: Domain,
    storage_limit: u64,
}

impl VariableDescriptor {
    /// Creates a continuous variable. Either bound may be infinite.
    pub fn continuous(lower_bound: f64, upper_bound: f64) -> Result<Self> {
        check_bounds(lower_bound, upper_bound)?;
        Ok(Self {
            lower_bound,
            upper_bound,
            domain: Domain::Continuous,
            storage_limit: MAX_TO_STORE_IMPLICITLY,
        })
    }

    /// Creates a continuous variable with no bounds.
    pub fn unbounded() -> Self {
        Self {
            lower_bound: f64::NEG_INFINITY,
            upper_bound: f64::INFINITY,
            domain: Domain::Continuous,
            storage_limit: MAX_TO_STORE_IMPLICITLY,
        }
    }

    /// Creates a discrete variable stepping by `delta` from `lower_bound`.
    ///
    /// The size is `⌈(upper_bound − lower_bound) / delta⌉ + 1`.
    pub fn stepped(lower_bound: f64, upper_bound: f64, delta: f64) -> Result<Self> {
        check_bounds(lower_bound, upper_bound)?;
        let mut var = Self {
            lower_bound,
            upper_bound,
            domain: Domain::Continuous,
            storage_limit: MAX_TO_STORE_IMPLICITLY,
        };
        var.domain = var.stepped_domain(delta)?;
        Ok(var)
    }

    /// Creates a discrete variable with `size` evenly spaced values spanning
    /// the bounds.
    pub fn with_size(lower_bound: f64, upper_bound: f64, size: u64) -> Result<Self> {
        check_bounds(lower_bound, upper_bound)?;
        let mut var = Self {
            lower_bound,
            upper_bound,
            domain: Domain::Continuous,
            storage_limit: MAX_TO_STORE_IMPLICITLY,
        };
        var.domain = var.sized_domain(size)?;
        Ok(var)
    }

    /// Creates a discrete variable from an explicit list of values.
    pub fn enumerated(values: Vec<f64>) -> Result<Self> {
        let (lower_bound, upper_bound) = enumerated_bounds(&values)?;
        Ok(Self {
            lower_bound,
            upper_bound,
            domain: Domain::Enumerated { values },
            storage_limit: MAX_TO_STORE_IMPLICITLY,
        })
    }

    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    pub fn upper_bound(&self) -> f64 {
        self.upper_bound
    }

    pub fn is_discrete(&self) -> bool {
        !matches!(self.domain, Domain::Continuous)
    }

    /// Step between consecutive values of a delta-defined variable.
    pub fn delta(&self) -> Option<f64> {
        match self.domain {
            Domain::Stepped { delta, .. } => Some(delta),
            _ => None,
        }
    }

    /// Number of admissible values, `None` for continuous variables.
    pub fn size(&self) -> Option<u64> {
        match &self.domain {
            Domain::Continuous => None,
            Domain::Stepped { size, .. } => Some(*size),
            Domain::Enumerated { values } => Some(values.len() as u64),
        }
    }

    /// The admissible values, when they are stored.
    ///
    /// Delta-defined variables above the storage limit return `None`; use
    /// [`value_at`](Self::value_at) for those.
    pub fn values(&self) -> Option<&[f64]> {
        match &self.domain {
            Domain::Continuous => None,
            Domain::Stepped { cache, .. } => cache.as_deref(),
            Domain::Enumerated { values } => Some(values),
        }
    }

    pub fn storage_limit(&self) -> u64 {
        self.storage_limit
    }

    /// Changes the size above which delta-defined values are not stored.
    pub fn set_storage_limit(&mut self, limit: u64) {
        self.storage_limit = limit;
        if let Domain::Stepped { delta, size, .. } = self.domain {
            self.domain = Domain::Stepped {
                delta,
                size,
                cache: self.build_cache(delta, size),
            };
        }
    }

    /// Rediscretizes the variable with a new step. The size and stored values
    /// are recomputed together.
    pub fn set_delta(&mut self, delta: f64) -> Result<()> {
        self.domain = self.stepped_domain(delta)?;
        Ok(())
    }

    /// Rediscretizes the variable into `size` evenly spaced values.
    pub fn set_size(&mut self, size: u64) -> Result<()> {
        self.domain = self.sized_domain(size)?;
        Ok(())
    }

    /// Replaces the domain with an explicit list; bounds follow the list.
    pub fn set_values(&mut self, values: Vec<f64>) -> Result<()> {
        let (lower_bound, upper_bound) = enumerated_bounds(&values)?;
        self.lower_bound = lower_bound;
        self.upper_bound = upper_bound;
        self.domain = Domain::Enumerated { values };
        Ok(())
    }

    /// Value at a discrete position, `None` if out of range or continuous.
    pub fn value_at(&self, position: u64) -> Option<f64> {
        match &self.domain {
            Domain::Continuous => None,
            Domain::Stepped { delta, size, cache } => {
                if position >= *size {
                    return None;
                }
                match cache {
                    Some(values) => values.get(position as usize).copied(),
                    None => Some(self.lower_bound + position as f64 * delta),
                }
            }
            Domain::Enumerated { values } => values.get(position as usize).copied(),
        }
    }

    /// Position of `value` in the discrete domain.
    ///
    /// For delta-defined variables the value must sit on the grid within
    /// [`TOLERANCE_FOR_SAME`]. For explicit lists an exact match is tried
    /// first, then the nearest value by absolute difference; ties go to the
    /// lowest index.
    pub fn position_of(&self, value: f64) -> Option<u64> {
        match &self.domain {
            Domain::Continuous => None,
            Domain::Stepped { delta, size, .. } => {
                let exact = (value - self.lower_bound) / delta;
                let rounded = exact.round();
                if (exact - rounded).abs() >= TOLERANCE_FOR_SAME || rounded < 0.0 {
                    return None;
                }
                let position = rounded as u64;
                (position < *size).then_some(position)
            }
            Domain::Enumerated { values } => {
                if let Some(i) = values.iter().position(|&v| v == value) {
                    return Some(i as u64);
                }
                let mut nearest = None;
                let mut smallest = f64::INFINITY;
                for (i, &v) in values.iter().enumerate() {
                    let diff = (v - value).abs();
                    if diff < smallest {
                        smallest = diff;
                        nearest = Some(i as u64);
                    }
                }
                nearest
            }
        }
    }

    /// Closest admissible value to `value`.
    ///
    /// Continuous variables are clamped to their bounds; discrete variables
    /// move to the nearest position.
    pub fn snap(&self, value: f64) -> f64 {
        match &self.domain {
            Domain::Continuous => value.max(self.lower_bound).min(self.upper_bound),
            Domain::Stepped { delta, size, .. } => {
                let position = ((value - self.lower_bound) / delta)
                    .round()
                    .max(0.0)
                    .min((*size - 1) as f64) as u64;
                self.value_at(position).unwrap_or(self.lower_bound)
            }
            Domain::Enumerated { values } => {
                let mut best = values[0];
                for &v in values.iter() {
                    if (v - value).abs() < (best - value).abs() {
                        best = v;
                    }
                }
                best
            }
        }
    }

    fn stepped_domain(&self, delta: f64) -> Result<Domain> {
        if !(delta > 0.0) || !delta.is_finite() {
            return Err(Error::InvalidInput(format!(
                "discrete step must be positive and finite, got {delta}"
            )));
        }
        if !self.lower_bound.is_finite() || !self.upper_bound.is_finite() {
            return Err(Error::SpaceTooLarge);
        }
        let span = (self.upper_bound - self.lower_bound) / delta;
        let steps = (span - TOLERANCE_FOR_SAME).ceil().max(0.0);
        if !steps.is_finite() || steps >= u64::MAX as f64 {
            return Err(Error::SpaceTooLarge);
        }
        let size = steps as u64 + 1;
        Ok(Domain::Stepped {
            delta,
            size,
            cache: self.build_cache(delta, size),
        })
    }

    fn sized_domain(&self, size: u64) -> Result<Domain> {
        if size == 0 {
            return Err(Error::InvalidInput("discrete size must be at least 1".into()));
        }
        if !self.lower_bound.is_finite() || !self.upper_bound.is_finite() {
            return Err(Error::SpaceTooLarge);
        }
        if size > 1 && self.upper_bound <= self.lower_bound {
            return Err(Error::InvalidInput(format!(
                "{size} values need a non-empty range, got [{}, {}]",
                self.lower_bound, self.upper_bound
            )));
        }
        let delta = if size > 1 {
            (self.upper_bound - self.lower_bound) / (size - 1) as f64
        } else {
            1.0
        };
        Ok(Domain::Stepped {
            delta,
            size,
            cache: self.build_cache(delta, size),
        })
    }

    fn build_cache(&self, delta: f64, size: u64) -> Option<Vec<f64>> {
        (size <= self.storage_limit).then(|| {
            (0..size)
                .map(|k| self.lower_bound + k as f64 * delta)
                .collect()
        })
    }
}

fn check_bounds(lower_bound: f64, upper_bound: f64) -> Result<()> {
    if lower_bound.is_nan() || upper_bound.is_nan() || lower_bound > upper_bound {
        return Err(Error::InvalidInput(format!(
            "invalid bounds [{lower_bound}, {upper_bound}]"
        )));
    }
    Ok(())
}

fn enumerated_bounds(values: &[f64]) -> Result<(f64, f64)> {
    if values.is_empty() {
        return Err(Error::InvalidInput("explicit value list is empty".into()));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(Error::InvalidInput("explicit values must be finite".into()));
    }
    let lower = values.iter().copied().fold(f64::INFINITY, f64::min);
    let upper = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Ok((lower, upper))
}
