//! Temperature schedules for simulated annealing.

use log::warn;

/// Decides the starting temperature and how it falls.
///
/// `samples` are objective values observed by the driver: a random batch for
/// the initial temperature, then the values seen at the current temperature.
pub trait CoolingSchedule {
    fn initial_temperature(&mut self, samples: &[f64]) -> f64;

    fn update(&mut self, temperature: f64, samples: &[f64]) -> f64;

    /// Moves tried before each temperature update.
    fn samples_per_temperature(&self) -> usize;
}

/// Population standard deviation, `0` for fewer than two samples.
pub fn standard_deviation(samples: &[f64]) -> f64 {
    let finite: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.len() < 2 {
        return 0.0;
    }
    let n = finite.len() as f64;
    let mean = finite.iter().sum::<f64>() / n;
    (finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

fn initial_from_spread(samples: &[f64]) -> f64 {
    match standard_deviation(samples) {
        sigma if sigma > 0.0 => sigma,
        _ => 1.0,
    }
}

/// `T ← rate · T`.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialCooling {
    pub rate: f64,
    pub samples_per_temperature: usize,
}

impl ExponentialCooling {
    pub fn new(rate: f64, samples_per_temperature: usize) -> Self {
        Self {
            rate,
            samples_per_temperature,
        }
    }
}

impl Default for ExponentialCooling {
    fn default() -> Self {
        Self::new(0.95, 20)
    }
}

impl CoolingSchedule for ExponentialCooling {
    fn initial_temperature(&mut self, samples: &[f64]) -> f64 {
        initial_from_spread(samples)
    }

    fn update(&mut self, temperature: f64, _samples: &[f64]) -> f64 {
        temperature * self.rate
    }

    fn samples_per_temperature(&self) -> usize {
        self.samples_per_temperature
    }
}

/// Sangiovanni-Vincentelli adaptive schedule.
///
/// `T ← T · exp(−λ·T / σ)` where `σ` is the standard deviation of the
/// objective values seen at the current temperature. When `σ` is zero, or
/// the update would leave `T` unchanged, the temperature decays by the fixed
/// `fallback_rate` instead.
#[derive(Debug, Clone, Copy)]
pub struct SangiovanniVincentelli {
    pub lambda: f64,
    pub samples_per_temperature: usize,
    pub fallback_rate: f64,
}

impl SangiovanniVincentelli {
    pub fn new(lambda: f64, samples_per_temperature: usize) -> Self {
        Self {
            lambda,
            samples_per_temperature,
            fallback_rate: 0.9,
        }
    }
}

impl Default for SangiovanniVincentelli {
    fn default() -> Self {
        Self::new(0.7, 30)
    }
}

impl CoolingSchedule for SangiovanniVincentelli {
    fn initial_temperature(&mut self, samples: &[f64]) -> f64 {
        initial_from_spread(samples)
    }

    fn update(&mut self, temperature: f64, samples: &[f64]) -> f64 {
        let sigma = standard_deviation(samples);
        if sigma > 0.0 {
            let next = temperature * (-self.lambda * temperature / sigma).exp();
            if next < temperature && next.is_finite() {
                return next;
            }
        }
        warn!("no spread in sampled objective values, decaying temperature by a fixed factor");
        temperature * self.fallback_rate
    }

    fn samples_per_temperature(&self) -> usize {
        self.samples_per_temperature
    }
}
