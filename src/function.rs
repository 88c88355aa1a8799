//! Objective, constraint and analysis contracts.
//!
//! Every evaluator is a pure map `x → f64`. Derivatives are an optional
//! capability: an evaluator that knows its partial derivatives returns
//! `Some` from [`ObjectiveFunction::derivative_wrt`], otherwise the drivers
//! fall back to finite differences (see [`Differencing`]).

mod differentiation;
mod memoize;

pub use differentiation::Differencing;
pub use memoize::Memoized;

/// A scalar function of the decision vector.
///
/// Closures of type `Fn(&[f64]) -> f64` implement this trait directly.
///
/// # Examples
///
/// ```
/// use optkit::function::ObjectiveFunction;
///
/// struct Paraboloid;
///
/// impl ObjectiveFunction for Paraboloid {
///     fn evaluate(&self, x: &[f64]) -> f64 {
///         x.iter().map(|xi| xi * xi).sum()
///     }
///
///     fn derivative_wrt(&self, x: &[f64], i: usize) -> Option<f64> {
///         Some(2.0 * x[i])
///     }
/// }
///
/// assert_eq!(Paraboloid.evaluate(&[1.0, 2.0]), 5.0);
/// assert_eq!(Paraboloid.gradient(&[1.0, 2.0]), Some(vec![2.0, 4.0]));
/// let closure = |x: &[f64]| x[0] - 10.0;
/// assert_eq!(closure.evaluate(&[4.0]), -6.0);
/// ```
pub trait ObjectiveFunction: Send + Sync {
    /// Evaluates the function at `x`.
    fn evaluate(&self, x: &[f64]) -> f64;

    /// Analytic partial derivative with respect to `x[i]`, if available.
    fn derivative_wrt(&self, _x: &[f64], _i: usize) -> Option<f64> {
        None
    }

    /// Analytic gradient, if every partial derivative is available.
    fn gradient(&self, x: &[f64]) -> Option<Vec<f64>> {
        (0..x.len()).map(|i| self.derivative_wrt(x, i)).collect()
    }
}

impl<F> ObjectiveFunction for F
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    fn evaluate(&self, x: &[f64]) -> f64 {
        self(x)
    }
}

/// Default tolerance under which an equality constraint counts as satisfied.
pub const EQUALITY_TOLERANCE: f64 = 1e-6;

/// An equality (`h(x) = 0`) or inequality (`g(x) ≤ 0`) constraint.
pub enum Constraint {
    Equality(Box<dyn ObjectiveFunction>),
    Inequality(Box<dyn ObjectiveFunction>),
}

impl Constraint {
    pub fn equality(h: impl ObjectiveFunction + 'static) -> Self {
        Constraint::Equality(Box::new(h))
    }

    pub fn inequality(g: impl ObjectiveFunction + 'static) -> Self {
        Constraint::Inequality(Box::new(g))
    }

    pub fn is_equality(&self) -> bool {
        matches!(self, Constraint::Equality(_))
    }

    pub fn function(&self) -> &dyn ObjectiveFunction {
        match self {
            Constraint::Equality(h) => h.as_ref(),
            Constraint::Inequality(g) => g.as_ref(),
        }
    }

    /// Raw constraint value at `x`.
    pub fn value(&self, x: &[f64]) -> f64 {
        self.function().evaluate(x)
    }

    /// Whether `x` satisfies the constraint, using [`EQUALITY_TOLERANCE`]
    /// for equalities.
    pub fn is_feasible(&self, x: &[f64]) -> bool {
        let value = self.value(x);
        match self {
            Constraint::Equality(_) => value.abs() <= EQUALITY_TOLERANCE,
            Constraint::Inequality(_) => value <= 0.0,
        }
    }

    /// Amount by which a constraint value is violated (zero when satisfied).
    pub fn violation(&self, value: f64) -> f64 {
        match self {
            Constraint::Equality(_) => value.abs(),
            Constraint::Inequality(_) => value.max(0.0),
        }
    }
}

impl std::fmt::Debug for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Constraint::Equality(_) => f.write_str("Constraint::Equality(..)"),
            Constraint::Inequality(_) => f.write_str("Constraint::Inequality(..)"),
        }
    }
}

/// A shared computation run once per decision vector before the objective
/// and constraints are evaluated.
///
/// Implementations publish their intermediate results through interior
/// mutability (for example an `Arc<Mutex<_>>` shared with the functions that
/// read them).
pub trait DependentAnalysis: Send + Sync {
    fn calculate(&self, x: &[f64]);
}
