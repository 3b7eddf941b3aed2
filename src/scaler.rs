//! Column standardization (zero mean, unit variance).

use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{PcaError, Result};

/// Standard deviations below this are treated as zero and replaced by 1.0,
/// so constant columns pass through centered but unscaled.
const SCALE_SANITIZATION_THRESHOLD: f64 = 1e-9;

/// Per-column standardizer: subtracts the column mean and divides by the
/// column (population) standard deviation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    /// Learns column means and standard deviations from `x`.
    ///
    /// Near-zero standard deviations are sanitized to 1.0, so the stored
    /// scale vector contains only positive finite values.
    ///
    /// # Errors
    ///
    /// Returns [`PcaError::InvalidInput`] if `x` has fewer than 2 rows or
    /// zero columns.
    pub fn fit(x: ArrayView2<f64>) -> Result<Self> {
        if x.nrows() < 2 {
            return Err(PcaError::InvalidInput(format!(
                "standardization requires at least 2 samples, got {}",
                x.nrows()
            )));
        }
        if x.ncols() == 0 {
            return Err(PcaError::InvalidInput(
                "input matrix has zero feature columns".to_string(),
            ));
        }

        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| PcaError::InvalidInput("failed to compute column means".to_string()))?;
        let std_dev = x.map_axis(Axis(0), |column| column.std(0.0));
        let scale = std_dev.mapv(|val| {
            if val.is_finite() && val.abs() > SCALE_SANITIZATION_THRESHOLD {
                val
            } else {
                1.0
            }
        });

        Ok(Self { mean, scale })
    }

    /// Applies the learned centering and scaling to `x`.
    ///
    /// # Errors
    ///
    /// Returns [`PcaError::InvalidInput`] if the column count of `x` differs
    /// from the fitted width.
    pub fn transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.mean.len() {
            return Err(PcaError::InvalidInput(format!(
                "input has {} columns but scaler was fitted on {}",
                x.ncols(),
                self.mean.len()
            )));
        }
        let mut out = x.to_owned();
        out -= &self.mean;
        out /= &self.scale;
        Ok(out)
    }

    /// Fits on `x` and returns the scaler together with the transformed data.
    pub fn fit_transform(x: ArrayView2<f64>) -> Result<(Self, Array2<f64>)> {
        let scaler = Self::fit(x)?;
        let transformed = scaler.transform(x)?;
        Ok((scaler, transformed))
    }

    /// Column means of the fitted data.
    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    /// Sanitized column standard deviations of the fitted data.
    pub fn scale(&self) -> &Array1<f64> {
        &self.scale
    }
}
