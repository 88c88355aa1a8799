//! Simplex search: classic Nelder-Mead and its geodesic seeding variant.
//!
//! Both drivers share one engine that keeps the vertices sorted by
//! minimization value, best at index 0 and worst at index `n`.

use log::{debug, trace};

use crate::error::{Error, Result};
use crate::linalg::{dot, norm2, normalize, scale, subtract};
use crate::optimizer::{OptimizationMethod, OptimizerCore, Requirement};

/// Coefficients and seeding for the simplex drivers.
#[derive(Debug, Clone, Copy)]
pub struct SimplexConfig {
    pub reflection: f64,
    pub expansion: f64,
    pub contraction: f64,
    pub shrink: f64,
    /// Edge length of the axis simplex, or radius of the seeding sphere.
    pub initial_radius: f64,
    /// Times the seeding polyhedron is subdivided ([`SphericalSearch`] only).
    pub subdivisions: usize,
}

impl Default for SimplexConfig {
    fn default() -> Self {
        Self {
            reflection: 1.0,
            expansion: 2.0,
            contraction: 0.5,
            shrink: 0.5,
            initial_radius: 1.0,
            subdivisions: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Move {
    Reflect,
    Expand,
    ContractOutside,
    ContractInside,
    Shrink,
}

struct Simplex {
    vertices: Vec<(Vec<f64>, f64)>,
}

impl Simplex {
    fn new(core: &mut OptimizerCore, points: Vec<Vec<f64>>) -> Result<Self> {
        if points.len() < 2 {
            return Err(Error::InvalidInput(
                "a simplex needs at least two distinct vertices".into(),
            ));
        }
        let mut vertices = Vec::with_capacity(points.len());
        for p in points {
            vertices.push(evaluate(core, p)?);
        }
        let mut simplex = Self { vertices };
        simplex.sort();
        Ok(simplex)
    }

    fn sort(&mut self) {
        self.vertices.sort_by(|a, b| a.1.total_cmp(&b.1));
    }

    fn points(&self) -> Vec<Vec<f64>> {
        self.vertices.iter().map(|(x, _)| x.clone()).collect()
    }

    /// Centroid of every vertex except the worst.
    fn centroid(&self) -> Vec<f64> {
        let n = self.vertices.len() - 1;
        let mut c = vec![0.0; self.vertices[0].0.len()];
        for (x, _) in &self.vertices[..n] {
            for (ci, xi) in c.iter_mut().zip(x) {
                *ci += xi;
            }
        }
        scale(&c, 1.0 / n as f64)
    }

    /// One Nelder-Mead step.
    fn step(&mut self, core: &mut OptimizerCore, config: &SimplexConfig) -> Result<Move> {
        let n = self.vertices.len() - 1;
        let centroid = self.centroid();
        let away = subtract(&centroid, &self.vertices[n].0);
        let along = |coefficient: f64| -> Vec<f64> {
            centroid
                .iter()
                .zip(&away)
                .map(|(c, a)| c + coefficient * a)
                .collect()
        };
        let f_best = self.vertices[0].1;
        let f_second_worst = self.vertices[n - 1].1;
        let f_worst = self.vertices[n].1;

        let reflected = evaluate(core, along(config.reflection))?;
        let (vertex, chosen) = if reflected.1 < f_best {
            let expanded = evaluate(core, along(config.reflection * config.expansion))?;
            if expanded.1 < reflected.1 {
                (expanded, Move::Expand)
            } else {
                (reflected, Move::Reflect)
            }
        } else if reflected.1 < f_second_worst {
            (reflected, Move::Reflect)
        } else {
            let (coefficient, kind, bar) = if reflected.1 < f_worst {
                (config.reflection * config.contraction, Move::ContractOutside, reflected.1)
            } else {
                (-config.contraction, Move::ContractInside, f_worst)
            };
            let contracted = evaluate(core, along(coefficient))?;
            if contracted.1 <= bar {
                (contracted, kind)
            } else {
                self.shrink(core, config.shrink)?;
                return Ok(Move::Shrink);
            }
        };
        self.vertices[n] = vertex;
        self.sort();
        Ok(chosen)
    }

    fn shrink(&mut self, core: &mut OptimizerCore, factor: f64) -> Result<()> {
        let best = self.vertices[0].0.clone();
        for k in 1..self.vertices.len() {
            let moved: Vec<f64> = best
                .iter()
                .zip(&self.vertices[k].0)
                .map(|(b, x)| b + factor * (x - b))
                .collect();
            self.vertices[k] = evaluate(core, moved)?;
        }
        self.sort();
        Ok(())
    }
}

/// Projects `x` into the design space, when there is one, and evaluates it.
fn evaluate(core: &mut OptimizerCore, x: Vec<f64>) -> Result<(Vec<f64>, f64)> {
    let x = match core.space() {
        Some(space) => space.snap(&x)?,
        None => x,
    };
    let v = core.problem.minimization_value(&x);
    core.record_minimization(&x, v);
    Ok((x, v))
}

fn iterate(core: &mut OptimizerCore, config: &SimplexConfig, mut simplex: Simplex) -> Result<()> {
    loop {
        let kind = simplex.step(core, config)?;
        trace!("simplex {kind:?}, best = {}", simplex.vertices[0].1);
        core.next_iteration();
        let population = simplex.points();
        if core.converged(Some(&population), None)? {
            return Ok(());
        }
    }
}

fn simplex_requirements() -> Vec<Requirement> {
    vec![
        Requirement::Objective,
        Requirement::ConvergenceCriterion,
        Requirement::StartingPoint,
    ]
}

/// Nelder-Mead over the axis simplex `{x0, x0 + r·e_1, …, x0 + r·e_n}`.
#[derive(Default)]
pub struct NelderMead {
    core: OptimizerCore,
    pub config: SimplexConfig,
}

impl NelderMead {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: SimplexConfig) -> Self {
        self.config = config;
        self
    }
}

impl OptimizationMethod for NelderMead {
    fn core(&self) -> &OptimizerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut OptimizerCore {
        &mut self.core
    }

    fn requirements(&self) -> Vec<Requirement> {
        simplex_requirements()
    }

    fn search(&mut self, x0: Vec<f64>) -> Result<()> {
        let r = self.config.initial_radius;
        let mut points = vec![x0.clone()];
        for i in 0..x0.len() {
            let mut p = x0.clone();
            p[i] += r;
            points.push(p);
        }
        let simplex = Simplex::new(&mut self.core, points)?;
        iterate(&mut self.core, &self.config, simplex)
    }
}

/// Nelder-Mead seeded from a subdivided polyhedron around the start point.
///
/// The vertices of the cross-polytope `±r·e_i` are refined `subdivisions`
/// times, each pass adding the midpoint of every closest pair pushed back out
/// to the sphere. The objective is evaluated at every point on the sphere and
/// the starting simplex is `x0` plus the best points that keep it
/// non-degenerate.
#[derive(Default)]
pub struct SphericalSearch {
    core: OptimizerCore,
    pub config: SimplexConfig,
}

impl SphericalSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: SimplexConfig) -> Self {
        self.config = config;
        self
    }
}

/// Unit directions of the cross-polytope, subdivided `levels` times.
pub(crate) fn geodesic_directions(n: usize, levels: usize) -> Vec<Vec<f64>> {
    let mut directions = Vec::with_capacity(2 * n);
    for i in 0..n {
        for s in [1.0, -1.0] {
            let mut e = vec![0.0; n];
            e[i] = s;
            directions.push(e);
        }
    }
    for _ in 0..levels {
        let closest = directions
            .iter()
            .enumerate()
            .flat_map(|(i, a)| directions[i + 1..].iter().map(move |b| dot(a, b)))
            .fold(f64::NEG_INFINITY, f64::max);
        let mut added = Vec::new();
        for (i, a) in directions.iter().enumerate() {
            for b in &directions[i + 1..] {
                if dot(a, b) < closest - 1e-9 {
                    continue;
                }
                let sum: Vec<f64> = a.iter().zip(b).map(|(x, y)| x + y).collect();
                if let Some(mid) = normalize(&sum) {
                    added.push(mid);
                }
            }
        }
        directions.extend(added);
    }
    directions
}

/// Residual of `v` after removing its components along the orthonormal
/// `basis`.
fn residual(v: &[f64], basis: &[Vec<f64>]) -> Vec<f64> {
    let mut r = v.to_vec();
    for b in basis {
        let c = dot(&r, b);
        for (ri, bi) in r.iter_mut().zip(b) {
            *ri -= c * bi;
        }
    }
    r
}

impl OptimizationMethod for SphericalSearch {
    fn core(&self) -> &OptimizerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut OptimizerCore {
        &mut self.core
    }

    fn requirements(&self) -> Vec<Requirement> {
        simplex_requirements()
    }

    fn search(&mut self, x0: Vec<f64>) -> Result<()> {
        let n = x0.len();
        let r = self.config.initial_radius;
        let directions = geodesic_directions(n, self.config.subdivisions);
        let mut sphere = Vec::with_capacity(directions.len());
        for d in directions {
            let p: Vec<f64> = x0.iter().zip(&d).map(|(x, di)| x + r * di).collect();
            sphere.push(evaluate(&mut self.core, p)?);
        }
        sphere.sort_by(|a, b| a.1.total_cmp(&b.1));
        debug!("{} points on the seeding sphere", sphere.len());

        let mut points = vec![x0.clone()];
        let mut basis: Vec<Vec<f64>> = Vec::with_capacity(n);
        for (p, _) in sphere {
            if basis.len() == n {
                break;
            }
            let offset = residual(&subtract(&p, &x0), &basis);
            // Snapping may pull a point back onto x0 or into the current span.
            if norm2(&offset) <= 1e-9 * r.max(1.0) {
                continue;
            }
            if let Some(unit) = normalize(&offset) {
                basis.push(unit);
                points.push(p);
            }
        }
        let simplex = Simplex::new(&mut self.core, points)?;
        iterate(&mut self.core, &self.config, simplex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convergence::{MaxIterations, MaxSpanInPopulation};
    use approx::assert_abs_diff_eq;

    fn rosenbrock(x: &[f64]) -> f64 {
        (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2)
    }

    #[test]
    fn test_nelder_mead_rosenbrock() {
        let mut nm = NelderMead::new()
            .with_objective(rosenbrock)
            .with_config(SimplexConfig {
                initial_radius: 0.5,
                ..SimplexConfig::default()
            })
            .with_convergence(MaxSpanInPopulation::new(1e-9))
            .with_convergence(MaxIterations::new(5000));
        let result = nm.run(Some(&[-1.2, 1.0])).unwrap();
        assert!(result.converged);
        assert_abs_diff_eq!(result.optimal_point[0], 1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(result.optimal_point[1], 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_geodesic_directions() {
        let base = geodesic_directions(3, 0);
        assert_eq!(base.len(), 6);
        let refined = geodesic_directions(3, 1);
        // Octahedron: 6 vertices plus the midpoints of its 12 edges.
        assert_eq!(refined.len(), 18);
        for d in &refined {
            assert_abs_diff_eq!(norm2(d), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_spherical_search_three_dimensions() {
        let mut search = SphericalSearch::new()
            .with_objective(|x: &[f64]| {
                (x[0] - 2.0).powi(2) + 2.0 * (x[1] + 1.0).powi(2) + 3.0 * (x[2] - 0.5).powi(2)
            })
            .with_convergence(MaxSpanInPopulation::new(1e-8))
            .with_convergence(MaxIterations::new(2000));
        let result = search.run(Some(&[0.0, 0.0, 0.0])).unwrap();
        assert_abs_diff_eq!(result.optimal_point[0], 2.0, epsilon = 1e-4);
        assert_abs_diff_eq!(result.optimal_point[1], -1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(result.optimal_point[2], 0.5, epsilon = 1e-4);
    }

    #[test]
    fn test_reflection_accepted_on_plane() {
        let mut core = OptimizerCore::default();
        core.problem.add_objective(|x: &[f64]| x[0] + 2.0 * x[1]);
        let mut simplex = Simplex::new(
            &mut core,
            vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]],
        )
        .unwrap();
        assert_eq!(simplex.vertices[0].0, vec![0.0, 0.0]);
        // Reflecting the worst vertex through the centroid lands below the
        // best one, and expanding goes further still.
        let kind = simplex.step(&mut core, &SimplexConfig::default()).unwrap();
        assert_eq!(kind, Move::Expand);
        assert!(simplex.vertices[0].1 < 0.0);
    }
}
