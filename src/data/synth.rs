//! Chaotic series generators
//!
//! Both generators iterate a deterministic map and keep every
//! `num_freq`-th sample, emitting exactly `num_steps / num_freq` rows.

use crate::error::{Result, TensorRnnError};
use ndarray::{s, Array2, Array3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Growth rate of the logistic map; 4.0 is the fully chaotic regime.
pub const LOGISTIC_ALPHA: f64 = 4.0;

/// Lorenz system coefficients and the Euler step size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LorenzParams {
    pub sigma: f64,
    pub rho: f64,
    pub beta: f64,
    pub dt: f64,
}

impl Default for LorenzParams {
    fn default() -> Self {
        Self {
            sigma: 10.0,
            rho: 28.0,
            beta: 2.667,
            dt: 0.01,
        }
    }
}

impl LorenzParams {
    /// Time derivative at `(x, y, z)`.
    pub fn derivative(&self, [x, y, z]: [f64; 3]) -> [f64; 3] {
        [
            self.sigma * (y - x),
            self.rho * x - y - x * z,
            x * y - self.beta * z,
        ]
    }

    /// One explicit Euler step.
    pub fn euler_step(&self, point: [f64; 3]) -> [f64; 3] {
        let d = self.derivative(point);
        [
            point[0] + d[0] * self.dt,
            point[1] + d[1] * self.dt,
            point[2] + d[2] * self.dt,
        ]
    }
}

fn output_rows(num_steps: usize, num_freq: usize) -> Result<usize> {
    if num_freq == 0 {
        return Err(TensorRnnError::config("num_freq must be positive"));
    }
    let rows = num_steps / num_freq;
    if rows == 0 {
        return Err(TensorRnnError::config(format!(
            "{} steps at frequency {} produce no samples",
            num_steps, num_freq
        )));
    }
    Ok(rows)
}

/// `x_{t+1} = 4 x_t (1 - x_t)` from `x0`, shape `[num_steps / num_freq, 1]`.
pub fn logistic_series(x0: f64, num_steps: usize, num_freq: usize) -> Result<Array2<f32>> {
    let rows = output_rows(num_steps, num_freq)?;
    let mut series = Array2::zeros((rows, 1));
    let mut x = x0;
    for t in 0..rows * num_freq {
        if t % num_freq == 0 {
            series[[t / num_freq, 0]] = x as f32;
        }
        x = LOGISTIC_ALPHA * x * (1.0 - x);
    }
    Ok(series)
}

/// Euler-integrated Lorenz trajectory, shape `[num_steps / num_freq, 3]`.
pub fn lorenz_series(
    x0: f64,
    y0: f64,
    z0: f64,
    num_steps: usize,
    num_freq: usize,
) -> Result<Array2<f32>> {
    lorenz_series_with(LorenzParams::default(), [x0, y0, z0], num_steps, num_freq)
}

pub fn lorenz_series_with(
    params: LorenzParams,
    start: [f64; 3],
    num_steps: usize,
    num_freq: usize,
) -> Result<Array2<f32>> {
    let rows = output_rows(num_steps, num_freq)?;
    let mut series = Array2::zeros((rows, 3));
    let mut point = start;
    for t in 0..rows * num_freq {
        if t % num_freq == 0 {
            for (c, value) in point.iter().enumerate() {
                series[[t / num_freq, c]] = *value as f32;
            }
        }
        point = params.euler_step(point);
    }
    Ok(series)
}

/// `num_samples` logistic series from seeded starts in `[0, 1)`, side by
/// side: `[num_steps / num_freq, num_samples]`.
pub fn logistic_dataset(
    num_samples: usize,
    num_steps: usize,
    num_freq: usize,
    seed: u64,
) -> Result<Array2<f32>> {
    let ensemble = logistic_ensemble(num_samples, num_steps, num_freq, seed)?;
    Ok(side_by_side(&ensemble))
}

/// `num_samples` Lorenz trajectories from seeded starts in `[-20, 20)^3`:
/// `[num_steps / num_freq, 3 * num_samples]`.
pub fn lorenz_dataset(
    num_samples: usize,
    num_steps: usize,
    num_freq: usize,
    seed: u64,
) -> Result<Array2<f32>> {
    let ensemble = lorenz_ensemble(num_samples, num_steps, num_freq, seed)?;
    Ok(side_by_side(&ensemble))
}

/// Independent logistic series stacked as `[num_samples, rows, 1]`.
pub fn logistic_ensemble(
    num_samples: usize,
    num_steps: usize,
    num_freq: usize,
    seed: u64,
) -> Result<Array3<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    ensemble(num_samples, output_rows(num_steps, num_freq)?, 1, |_| {
        logistic_series(rng.gen_range(0.0..1.0), num_steps, num_freq)
    })
}

/// Independent Lorenz trajectories stacked as `[num_samples, rows, 3]`.
pub fn lorenz_ensemble(
    num_samples: usize,
    num_steps: usize,
    num_freq: usize,
    seed: u64,
) -> Result<Array3<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    ensemble(num_samples, output_rows(num_steps, num_freq)?, 3, |_| {
        let x0 = rng.gen_range(-20.0..20.0);
        let y0 = rng.gen_range(-20.0..20.0);
        let z0 = rng.gen_range(-20.0..20.0);
        lorenz_series(x0, y0, z0, num_steps, num_freq)
    })
}

fn ensemble<F>(num_samples: usize, rows: usize, channels: usize, mut gen: F) -> Result<Array3<f32>>
where
    F: FnMut(usize) -> Result<Array2<f32>>,
{
    if num_samples == 0 {
        return Err(TensorRnnError::config("num_samples must be positive"));
    }
    let mut out = Array3::zeros((num_samples, rows, channels));
    for i in 0..num_samples {
        let series = gen(i)?;
        out.slice_mut(s![i, .., ..]).assign(&series);
    }
    debug!(num_samples, rows, channels, "generated series ensemble");
    Ok(out)
}

/// `[samples, rows, channels]` -> `[rows, channels * samples]`, sample-major
/// columns.
fn side_by_side(ensemble: &Array3<f32>) -> Array2<f32> {
    let (samples, rows, channels) = ensemble.dim();
    let mut out = Array2::zeros((rows, channels * samples));
    for i in 0..samples {
        out.slice_mut(s![.., i * channels..(i + 1) * channels])
            .assign(&ensemble.slice(s![i, .., ..]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logistic_rows_and_subsampling() {
        let dense = logistic_series(0.3, 20, 1).unwrap();
        let sparse = logistic_series(0.3, 20, 5).unwrap();
        assert_eq!(dense.dim(), (20, 1));
        assert_eq!(sparse.dim(), (4, 1));
        for j in 0..4 {
            assert_eq!(sparse[[j, 0]], dense[[j * 5, 0]]);
        }
    }

    #[test]
    fn test_zero_frequency_rejected() {
        assert!(logistic_series(0.3, 10, 0).is_err());
        assert!(lorenz_series(0.0, 1.0, 1.0, 3, 5).is_err());
    }

    #[test]
    fn test_lorenz_first_step() {
        let series = lorenz_series(1.0, 1.0, 1.0, 2, 1).unwrap();
        // dx = 0, dy = 28 - 1 - 1, dz = 1 - 2.667
        assert_eq!(series[[1, 0]], 1.0);
        assert!((series[[1, 1]] - 1.26).abs() < 1e-6);
        assert!((series[[1, 2]] - (1.0 - 0.01667)).abs() < 1e-6);
    }

    #[test]
    fn test_dataset_layout() {
        let data = lorenz_dataset(2, 30, 3, 7).unwrap();
        let ensemble = lorenz_ensemble(2, 30, 3, 7).unwrap();
        assert_eq!(data.dim(), (10, 6));
        assert_eq!(ensemble.dim(), (2, 10, 3));
        assert_eq!(data[[4, 3 + 2]], ensemble[[1, 4, 2]]);
    }

    #[test]
    fn test_dataset_is_seeded() {
        let a = logistic_dataset(3, 10, 1, 42).unwrap();
        let b = logistic_dataset(3, 10, 1, 42).unwrap();
        let c = logistic_dataset(3, 10, 1, 43).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.row(0).iter().all(|&x| (0.0..1.0).contains(&x)));
    }
}
