use crate::linalg::{normalize, subtract};
use crate::search_direction::{unit, SearchDirection};

/// Round-robin through the coordinate axes, followed by one "diagonal" search
/// along the net displacement of the cycle.
#[derive(Debug, Clone, Default)]
pub struct CyclicCoordinates {
    cursor: usize,
    cycle_start: Option<Vec<f64>>,
}

impl CyclicCoordinates {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SearchDirection for CyclicCoordinates {
    fn find(&mut self, x: &[f64], _gradient: &[f64], _f: f64, reset: bool) -> Vec<f64> {
        let n = x.len();
        let start = match self.cycle_start.take() {
            Some(start) if !reset && start.len() == n => start,
            _ => {
                self.cursor = 0;
                x.to_vec()
            }
        };
        if self.cursor < n {
            let axis = self.cursor;
            self.cursor += 1;
            self.cycle_start = Some(start);
            return unit(n, axis);
        }
        self.cursor = 0;
        match normalize(&subtract(x, &start)) {
            Some(diagonal) => diagonal,
            None => {
                self.cursor = 1;
                self.cycle_start = Some(x.to_vec());
                unit(n, 0)
            }
        }
    }

    fn requires_gradient(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_axes_then_diagonal() {
        let mut cyclic = CyclicCoordinates::new();
        assert_eq!(cyclic.find(&[0.0, 0.0, 0.0], &[], 0.0, false), vec![1.0, 0.0, 0.0]);
        assert_eq!(cyclic.find(&[2.0, 0.0, 0.0], &[], 0.0, false), vec![0.0, 1.0, 0.0]);
        assert_eq!(cyclic.find(&[2.0, 2.0, 0.0], &[], 0.0, false), vec![0.0, 0.0, 1.0]);
        let d = cyclic.find(&[2.0, 2.0, 1.0], &[], 0.0, false);
        assert_abs_diff_eq!(d[0], 2.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(d[2], 1.0 / 3.0, epsilon = 1e-12);
        // A new cycle begins from wherever the diagonal search ended.
        assert_eq!(cyclic.find(&[3.0, 3.0, 1.5], &[], 0.0, false), vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_no_displacement_skips_diagonal() {
        let mut cyclic = CyclicCoordinates::new();
        cyclic.find(&[1.0], &[], 0.0, false);
        assert_eq!(cyclic.find(&[1.0], &[], 0.0, false), vec![1.0]);
    }
}
