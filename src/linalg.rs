//! Dense vector helpers shared by the line searches, direction strategies and
//! convergence criteria. Vectors are plain slices; results are owned `Vec`s.
//!
//! The helpers are generic over [`Float`] so they serve `f32` callers too.
//! The optimizers themselves work in `f64` throughout.

use num_traits::Float;

pub fn dot<T: Float>(a: &[T], b: &[T]) -> T {
    a.iter()
        .zip(b.iter())
        .fold(T::zero(), |acc, (&x, &y)| acc + x * y)
}

/// Euclidean norm.
pub fn norm2<T: Float>(a: &[T]) -> T {
    dot(a, a).sqrt()
}

/// Sum of absolute values.
pub fn norm1<T: Float>(a: &[T]) -> T {
    a.iter().fold(T::zero(), |acc, &x| acc + x.abs())
}

/// Largest absolute component.
pub fn norm_inf<T: Float>(a: &[T]) -> T {
    a.iter().fold(T::zero(), |acc, &x| acc.max(x.abs()))
}

pub fn subtract<T: Float>(a: &[T], b: &[T]) -> Vec<T> {
    a.iter().zip(b.iter()).map(|(&x, &y)| x - y).collect()
}

/// Returns `x + alpha * d`.
pub fn axpy<T: Float>(x: &[T], alpha: T, d: &[T]) -> Vec<T> {
    x.iter().zip(d.iter()).map(|(&xi, &di)| xi + alpha * di).collect()
}

pub fn scale<T: Float>(a: &[T], factor: T) -> Vec<T> {
    a.iter().map(|&x| x * factor).collect()
}

pub fn negate<T: Float>(a: &[T]) -> Vec<T> {
    a.iter().map(|&x| -x).collect()
}

/// Returns `a / ‖a‖₂`, or `None` if `a` has zero magnitude.
pub fn normalize<T: Float>(a: &[T]) -> Option<Vec<T>> {
    let n = norm2(a);
    if n > T::zero() && n.is_finite() {
        Some(scale(a, T::one() / n))
    } else {
        None
    }
}

/// L1 distance between two points.
pub fn distance1<T: Float>(a: &[T], b: &[T]) -> T {
    a.iter()
        .zip(b.iter())
        .fold(T::zero(), |acc, (&x, &y)| acc + (x - y).abs())
}

/// Euclidean distance between two points.
pub fn distance2<T: Float>(a: &[T], b: &[T]) -> T {
    a.iter()
        .zip(b.iter())
        .fold(T::zero(), |acc, (&x, &y)| acc + (x - y) * (x - y))
        .sqrt()
}

pub fn is_zero<T: Float>(a: &[T]) -> bool {
    a.iter().all(|&x| x == T::zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_norms() {
        let v = [3.0, -4.0];
        assert_abs_diff_eq!(norm2(&v), 5.0);
        assert_abs_diff_eq!(norm1(&v), 7.0);
        assert_abs_diff_eq!(norm_inf(&v), 4.0);
    }

    #[test]
    fn test_normalize_zero_vector() {
        assert!(normalize(&[0.0, 0.0]).is_none());
        let unit = normalize(&[0.0, 2.0]).unwrap();
        assert_abs_diff_eq!(unit[1], 1.0);
    }

    #[test]
    fn test_axpy_and_distance() {
        let x = axpy(&[1.0, 1.0], 2.0, &[0.5, -0.5]);
        assert_eq!(x, vec![2.0, 0.0]);
        assert_abs_diff_eq!(distance1(&x, &[0.0, 0.0]), 2.0);
        assert_abs_diff_eq!(distance2(&[0.0, 0.0], &[3.0, 4.0]), 5.0);
    }

    #[test]
    fn test_single_precision() {
        let v: [f32; 2] = [3.0, -4.0];
        assert_abs_diff_eq!(norm2(&v), 5.0f32);
        assert_abs_diff_eq!(dot(&v, &[1.0, 1.0]), -1.0f32);
        let unit = normalize(&v).unwrap();
        assert_abs_diff_eq!(unit[0], 0.6f32, epsilon = 1e-6);
    }
}
