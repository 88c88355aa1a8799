//! Design-space descriptions.
//!
//! A [`DesignSpaceDescription`] is the ordered list of decision variables of a
//! problem. It tracks which variables are discrete, how many values each one
//! has and how large the whole discrete space is, and it produces the
//! neighbor change vectors used by local and stochastic discrete search.

mod neighbors;
mod variable;

pub use variable::VariableDescriptor;

use std::ops::Index;

use crate::error::{Error, Result};

/// Tolerance used when deciding whether a value sits on a discrete grid.
pub const TOLERANCE_FOR_SAME: f64 = 1e-9;

/// Delta-defined variables with more values than this do not store them.
pub const MAX_TO_STORE_IMPLICITLY: u64 = 5000;

/// Ordered collection of variable descriptors with derived discreteness data.
///
/// The derived fields are recomputed on every mutation.
///
/// # Examples
///
/// ```
/// use optkit::design_space::{DesignSpaceDescription, VariableDescriptor};
///
/// let space = DesignSpaceDescription::new(vec![
///     VariableDescriptor::stepped(1.0, 20.0, 1.0).unwrap(),
///     VariableDescriptor::enumerated(vec![0.5, 1.0, 2.0]).unwrap(),
/// ])
/// .unwrap();
/// assert!(space.all_discrete());
/// assert_eq!(space.size_of_space(), 60);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DesignSpaceDescription {
    variables: Vec<VariableDescriptor>,
    all_discrete: bool,
    discrete_var_indices: Vec<usize>,
    max_variable_sizes: Vec<Option<u64>>,
    size_of_space: u64,
}

impl DesignSpaceDescription {
    /// Creates a space from the given variables.
    ///
    /// Fails with [`Error::SpaceTooLarge`] if the product of the discrete
    /// sizes does not fit in a `u64`.
    pub fn new(variables: Vec<VariableDescriptor>) -> Result<Self> {
        let mut space = Self {
            variables,
            ..Self::default()
        };
        space.update()?;
        Ok(space)
    }

    /// A space of `n` unbounded continuous variables.
    pub fn unbounded(n: usize) -> Self {
        Self {
            variables: vec![VariableDescriptor::unbounded(); n],
            all_discrete: false,
            discrete_var_indices: Vec::new(),
            max_variable_sizes: vec![None; n],
            size_of_space: 0,
        }
    }

    pub fn push(&mut self, variable: VariableDescriptor) -> Result<()> {
        self.variables.push(variable);
        self.update_or_rollback(|space| {
            space.variables.pop();
        })
    }

    pub fn insert(&mut self, index: usize, variable: VariableDescriptor) -> Result<()> {
        if index > self.variables.len() {
            return Err(Error::InvalidInput(format!(
                "insert index {index} beyond {} variables",
                self.variables.len()
            )));
        }
        self.variables.insert(index, variable);
        self.update_or_rollback(|space| {
            space.variables.remove(index);
        })
    }

    pub fn remove(&mut self, index: usize) -> Result<VariableDescriptor> {
        if index >= self.variables.len() {
            return Err(Error::InvalidInput(format!(
                "no variable at index {index}"
            )));
        }
        let removed = self.variables.remove(index);
        // Removing a variable can only shrink the space.
        self.update()?;
        Ok(removed)
    }

    /// Replaces the variable at `index`.
    pub fn set(&mut self, index: usize, variable: VariableDescriptor) -> Result<()> {
        let Some(slot) = self.variables.get_mut(index) else {
            return Err(Error::InvalidInput(format!(
                "no variable at index {index}"
            )));
        };
        let previous = std::mem::replace(slot, variable);
        self.update_or_rollback(move |space| {
            space.variables[index] = previous;
        })
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&VariableDescriptor> {
        self.variables.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VariableDescriptor> {
        self.variables.iter()
    }

    /// True when every variable is discrete (and there is at least one).
    pub fn all_discrete(&self) -> bool {
        self.all_discrete
    }

    pub fn discrete_var_indices(&self) -> &[usize] {
        &self.discrete_var_indices
    }

    /// Size of each variable, `None` for continuous variables.
    pub fn max_variable_sizes(&self) -> &[Option<u64>] {
        &self.max_variable_sizes
    }

    /// Product of the sizes of the discrete variables, `0` when there are none.
    pub fn size_of_space(&self) -> u64 {
        self.size_of_space
    }

    /// Discrete positions of `x`, `None` at continuous variables.
    ///
    /// Fails if `x` has the wrong length or a discrete coordinate is not a
    /// member of its variable's domain.
    pub fn positions_of(&self, x: &[f64]) -> Result<Vec<Option<u64>>> {
        self.check_dimension(x.len())?;
        let mut positions = vec![None; x.len()];
        for &i in &self.discrete_var_indices {
            let position = self.variables[i].position_of(x[i]).ok_or_else(|| {
                Error::InvalidInput(format!(
                    "value {} is not in the domain of variable {i}",
                    x[i]
                ))
            })?;
            positions[i] = Some(position);
        }
        Ok(positions)
    }

    /// Values at the given positions of an all-discrete space.
    pub fn values_at(&self, positions: &[u64]) -> Result<Vec<f64>> {
        self.check_dimension(positions.len())?;
        self.variables
            .iter()
            .zip(positions.iter())
            .enumerate()
            .map(|(i, (var, &p))| {
                var.value_at(p).ok_or_else(|| {
                    Error::InvalidInput(format!("position {p} is invalid for variable {i}"))
                })
            })
            .collect()
    }

    /// Moves every coordinate of `x` to the closest admissible value.
    pub fn snap(&self, x: &[f64]) -> Result<Vec<f64>> {
        self.check_dimension(x.len())?;
        Ok(self
            .variables
            .iter()
            .zip(x.iter())
            .map(|(var, &v)| var.snap(v))
            .collect())
    }

    /// Generates at least `minimum_neighbors` change vectors over the
    /// discrete variables. The set is closed under negation.
    pub fn create_neighbor_change_vectors(&self, minimum_neighbors: usize) -> Vec<Vec<i64>> {
        neighbors::neighbor_change_vectors(
            self.variables.len(),
            &self.discrete_var_indices,
            minimum_neighbors,
        )
    }

    /// Indices of the change vectors that keep every discrete coordinate of
    /// `candidate` within its variable's positions.
    pub fn find_valid_changes(
        &self,
        candidate: &[f64],
        change_vectors: &[Vec<i64>],
    ) -> Result<Vec<usize>> {
        let positions = self.positions_of(candidate)?;
        Ok(change_vectors
            .iter()
            .enumerate()
            .filter(|(_, change)| self.change_is_valid(&positions, change))
            .map(|(k, _)| k)
            .collect())
    }

    /// Applies a change vector to `candidate`, returning the moved point.
    pub fn apply_change(&self, candidate: &[f64], change: &[i64]) -> Result<Vec<f64>> {
        self.check_dimension(change.len())?;
        let positions = self.positions_of(candidate)?;
        let mut moved = candidate.to_vec();
        for &i in &self.discrete_var_indices {
            if change[i] == 0 {
                continue;
            }
            let target = positions[i]
                .and_then(|p| p.checked_add_signed(change[i]))
                .and_then(|p| self.variables[i].value_at(p))
                .ok_or_else(|| {
                    Error::InvalidInput(format!(
                        "change {} leaves the domain of variable {i}",
                        change[i]
                    ))
                })?;
            moved[i] = target;
        }
        Ok(moved)
    }

    pub(crate) fn check_dimension(&self, found: usize) -> Result<()> {
        if found != self.variables.len() {
            return Err(Error::DimensionMismatch {
                expected: self.variables.len(),
                found,
            });
        }
        Ok(())
    }

    fn change_is_valid(&self, positions: &[Option<u64>], change: &[i64]) -> bool {
        if change.len() != positions.len() {
            return false;
        }
        self.discrete_var_indices.iter().all(|&i| {
            let (Some(position), Some(size)) = (positions[i], self.max_variable_sizes[i]) else {
                return false;
            };
            position
                .checked_add_signed(change[i])
                .is_some_and(|p| p < size)
        })
    }

    fn update_or_rollback(&mut self, rollback: impl FnOnce(&mut Self)) -> Result<()> {
        if let Err(e) = self.update() {
            rollback(self);
            self.update()?;
            return Err(e);
        }
        Ok(())
    }

    fn update(&mut self) -> Result<()> {
        let discrete_var_indices: Vec<usize> = self
            .variables
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_discrete())
            .map(|(i, _)| i)
            .collect();
        let max_variable_sizes: Vec<Option<u64>> = self.variables.iter().map(|v| v.size()).collect();
        let size_of_space = if discrete_var_indices.is_empty() {
            0
        } else {
            discrete_var_indices
                .iter()
                .try_fold(1u64, |acc, &i| {
                    max_variable_sizes[i].and_then(|s| acc.checked_mul(s))
                })
                .ok_or(Error::SpaceTooLarge)?
        };

        self.all_discrete =
            !self.variables.is_empty() && discrete_var_indices.len() == self.variables.len();
        self.discrete_var_indices = discrete_var_indices;
        self.max_variable_sizes = max_variable_sizes;
        self.size_of_space = size_of_space;
        Ok(())
    }
}

impl Index<usize> for DesignSpaceDescription {
    type Output = VariableDescriptor;

    fn index(&self, index: usize) -> &Self::Output {
        &self.variables[index]
    }
}

impl<'a> IntoIterator for &'a DesignSpaceDescription {
    type Item = &'a VariableDescriptor;
    type IntoIter = std::slice::Iter<'a, VariableDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.variables.iter()
    }
}
