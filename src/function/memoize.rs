use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::function::ObjectiveFunction;

/// Caches the last input/output pair of an evaluator.
///
/// A call is served from the cache when every coordinate of `x` is within
/// `tolerance` of the cached input (L∞ distance). With the default
/// [`Memoized::exact`] policy only bit-identical inputs hit. Derivatives are
/// forwarded to the wrapped function without caching.
///
/// # Examples
///
/// ```
/// use optkit::function::{Memoized, ObjectiveFunction};
///
/// let f = Memoized::exact(|x: &[f64]| x[0] * x[0]);
/// assert_eq!(f.evaluate(&[3.0]), 9.0);
/// assert_eq!(f.evaluate(&[3.0]), 9.0);
/// assert_eq!(f.hits(), 1);
/// assert_eq!(f.misses(), 1);
/// ```
#[derive(Debug)]
pub struct Memoized<F> {
    inner: F,
    tolerance: f64,
    last: Mutex<Option<(Vec<f64>, f64)>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<F: ObjectiveFunction> Memoized<F> {
    /// Cache hits require identical inputs.
    pub fn exact(inner: F) -> Self {
        Self::with_tolerance(inner, 0.0)
    }

    /// Cache hits allow each coordinate to differ by up to `tolerance`.
    pub fn with_tolerance(inner: F, tolerance: f64) -> Self {
        Self {
            inner,
            tolerance: tolerance.max(0.0),
            last: Mutex::new(None),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    /// Forgets the cached pair.
    pub fn clear(&self) {
        *self.last.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn matches(&self, cached: &[f64], x: &[f64]) -> bool {
        cached.len() == x.len()
            && cached
                .iter()
                .zip(x.iter())
                .all(|(&a, &b)| a == b || (a - b).abs() <= self.tolerance)
    }
}

impl<F: ObjectiveFunction> ObjectiveFunction for Memoized<F> {
    fn evaluate(&self, x: &[f64]) -> f64 {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if let Some((cached_x, cached_f)) = last.as_ref() {
            if self.matches(cached_x, x) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return *cached_f;
            }
        }
        let value = self.inner.evaluate(x);
        self.misses.fetch_add(1, Ordering::Relaxed);
        *last = Some((x.to_vec(), value));
        value
    }

    fn derivative_wrt(&self, x: &[f64], i: usize) -> Option<f64> {
        self.inner.derivative_wrt(x, i)
    }

    fn gradient(&self, x: &[f64]) -> Option<Vec<f64>> {
        self.inner.gradient(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_exact_policy() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let f = Memoized::exact(move |x: &[f64]| {
            counter.fetch_add(1, Ordering::SeqCst);
            x[0] + x[1]
        });
        assert_eq!(f.evaluate(&[1.0, 2.0]), 3.0);
        assert_eq!(f.evaluate(&[1.0, 2.0]), 3.0);
        assert_eq!(f.evaluate(&[1.0, 2.0 + 1e-12]), 3.0 + 1e-12);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(f.hits(), 1);
    }

    #[test]
    fn test_tolerance_policy() {
        let f = Memoized::with_tolerance(|x: &[f64]| x[0], 1e-6);
        assert_eq!(f.evaluate(&[1.0]), 1.0);
        assert_eq!(f.evaluate(&[1.0 + 1e-9]), 1.0);
        assert_eq!(f.evaluate(&[1.1]), 1.1);
        assert_eq!(f.hits(), 1);
        assert_eq!(f.misses(), 2);
        f.clear();
        f.evaluate(&[1.1]);
        assert_eq!(f.misses(), 3);
    }
}
