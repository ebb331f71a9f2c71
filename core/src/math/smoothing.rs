use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::math::matrix::MatrixHelper;
use crate::prelude::{OverlayError, OverlayResult};

/// User-facing smoothing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmoothingSettings {
    pub window_length: usize,
    pub polyorder: usize,
}

impl Default for SmoothingSettings {
    fn default() -> Self {
        Self {
            window_length: 201,
            polyorder: 3,
        }
    }
}

/// Savitzky-Golay smoothing filter.
///
/// The filter is the hat matrix `A (AᵀA)⁻¹ Aᵀ` of a polynomial least-squares
/// fit over one window: its middle row gives the interior coefficients, and
/// the leading/trailing rows evaluate the first/last window's fit at the edge
/// samples.
#[derive(Debug, Clone)]
pub struct SavitzkyGolay {
    window: usize,
    hat: Array2<f64>,
}

impl SavitzkyGolay {
    pub fn new(window_length: usize, polyorder: usize) -> OverlayResult<Self> {
        if window_length % 2 == 0 {
            return Err(OverlayError::InvalidConfig(format!(
                "smoothing window must be odd, got {}",
                window_length
            )));
        }
        if polyorder >= window_length {
            return Err(OverlayError::InvalidConfig(format!(
                "polyorder {} must be smaller than window {}",
                polyorder, window_length
            )));
        }

        let half = (window_length / 2) as f64;
        let columns = polyorder + 1;
        let design = Array2::from_shape_fn((window_length, columns), |(row, power)| {
            (row as f64 - half).powi(power as i32)
        });
        let normal = MatrixHelper::multiply(design.t(), design.view());
        let normal_inv = MatrixHelper::invert(normal.view()).ok_or_else(|| {
            OverlayError::InvalidConfig("smoothing design matrix is singular".into())
        })?;
        let projector = MatrixHelper::multiply(design.view(), normal_inv.view());
        let hat = MatrixHelper::multiply(projector.view(), design.t());

        Ok(Self {
            window: window_length,
            hat,
        })
    }

    pub fn from_settings(settings: &SmoothingSettings) -> OverlayResult<Self> {
        Self::new(settings.window_length, settings.polyorder)
    }

    /// Smooths every finite run of `values`; gaps stay gaps and runs shorter
    /// than the window are returned unchanged.
    pub fn apply(&self, values: &[f64]) -> Vec<f64> {
        let mut output = values.to_vec();
        let mut start = 0;
        while start < values.len() {
            if !values[start].is_finite() {
                start += 1;
                continue;
            }
            let end = values[start..]
                .iter()
                .position(|value| !value.is_finite())
                .map_or(values.len(), |offset| start + offset);
            if end - start >= self.window {
                self.smooth_run(&values[start..end], &mut output[start..end]);
            }
            start = end;
        }
        output
    }

    fn smooth_run(&self, run: &[f64], out: &mut [f64]) {
        let n = run.len();
        let m = self.window;
        let half = m / 2;

        let weighted = |row: usize, offset: usize| -> f64 {
            (0..m).map(|j| self.hat[[row, j]] * run[offset + j]).sum()
        };

        for (i, slot) in out.iter_mut().enumerate() {
            *slot = if i < half {
                weighted(i, 0)
            } else if i >= n - half {
                weighted(m - (n - i), n - m)
            } else {
                weighted(half, i - half)
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_even_window_and_large_polyorder() {
        assert!(SavitzkyGolay::new(4, 2).is_err());
        assert!(SavitzkyGolay::new(5, 5).is_err());
        assert!(SavitzkyGolay::new(5, 2).is_ok());
    }

    #[test]
    fn preserves_polynomials_up_to_order() {
        let filter = SavitzkyGolay::new(7, 2).unwrap();
        let values: Vec<f64> = (0..20).map(|i| 0.5 * (i as f64).powi(2) - 3.0 * i as f64 + 1.0).collect();
        let smoothed = filter.apply(&values);
        for (raw, smooth) in values.iter().zip(&smoothed) {
            assert!((raw - smooth).abs() < 1e-6, "{raw} vs {smooth}");
        }
    }

    #[test]
    fn flattens_alternating_noise() {
        let filter = SavitzkyGolay::new(5, 1).unwrap();
        let values: Vec<f64> = (0..30).map(|i| if i % 2 == 0 { 101.0 } else { 99.0 }).collect();
        let smoothed = filter.apply(&values);
        for value in &smoothed[2..28] {
            assert!((value - 100.0).abs() < 0.5);
        }
    }

    #[test]
    fn gaps_split_runs_and_short_runs_pass_through() {
        let filter = SavitzkyGolay::new(3, 1).unwrap();
        let values = vec![1.0, 5.0, 1.0, f64::NAN, 7.0, 9.0];
        let smoothed = filter.apply(&values);
        assert!(smoothed[3].is_nan());
        assert_eq!(&smoothed[4..], &[7.0, 9.0]);
        assert!((smoothed[1] - 7.0 / 3.0).abs() < 1e-9);
    }
}
