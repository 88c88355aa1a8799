//! Composable numerical optimization.
//!
//! A problem is an objective (or several), optional constraints folded in
//! through a merit function, and an optional [`design_space`] describing
//! bounded, stepped or enumerated variables. A driver from [`optimizer`] is
//! assembled from interchangeable parts: [`search_direction`] and
//! [`line_search`] strategies for gradient methods, [`generator`] and
//! [`selector`] operators for population and neighborhood methods, a
//! [`cooling`] schedule for annealing, and any number of [`convergence`]
//! criteria.
//!
//! Design points and objective values are `f64`. Only the vector helpers in
//! [`linalg`] are generic over `num_traits::Float`.

pub mod candidate;
pub mod convergence;
pub mod cooling;
pub mod design_space;
pub mod error;
pub mod function;
pub mod generator;
pub mod line_search;
pub mod linalg;
pub mod merit;
pub mod optimizer;
pub mod search_direction;
pub mod selector;

pub use error::{Error, Result};
pub use optimizer::{OptimizationMethod, OptimizationResult};
