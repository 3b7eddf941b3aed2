//! Covariance eigendecomposition PCA with variance diagnostics.
//!
//! This is the analytical core of the crate: given a (column-standardized)
//! sample matrix it computes the sample covariance matrix, eigendecomposes it,
//! ranks the eigenpairs by absolute eigenvalue, counts the components retained
//! by the Kaiser criterion, and derives per-component and cumulative
//! explained-variance percentages. Projection onto the leading components is
//! derived from the same ranked eigenvectors.

use log::debug;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use ndarray_linalg::{Eigh, UPLO};
use serde::{Deserialize, Serialize};

use crate::error::{PcaError, Result};

/// Absolute tolerance for the unit-norm check on returned eigenvectors.
const NORM_TOLERANCE: f64 = 1e-6;

/// An (eigenvalue, eigenvector) solution of the covariance matrix.
///
/// The vector is unit-norm within [`NORM_TOLERANCE`]; this is validated at
/// construction time by [`analyze`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Eigenpair {
    /// Eigenvalue of the sample covariance matrix.
    pub value: f64,
    /// Corresponding unit-norm eigenvector, length D.
    pub vector: Array1<f64>,
}

/// Result of a covariance eigendecomposition analysis.
///
/// Everything is derived once per [`analyze`] call and immutable afterwards.
/// Eigenpairs are ordered by descending absolute eigenvalue, and all
/// variance sequences follow that order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EigenAnalysis {
    covariance: Array2<f64>,
    eigenpairs: Vec<Eigenpair>,
    kaiser_count: usize,
    explained_variance: Vec<f64>,
    cumulative_explained_variance: Vec<f64>,
}

/// Computes the D×D unbiased sample covariance matrix of `x`.
///
/// Columns are centered by their means before forming XᵀX / (N−1), so the
/// result is exact even when the input is only approximately standardized.
///
/// # Errors
///
/// Returns [`PcaError::InvalidInput`] if `x` has fewer than 2 rows or zero
/// columns.
pub fn covariance_matrix(x: ArrayView2<f64>) -> Result<Array2<f64>> {
    let n_samples = x.nrows();
    let n_features = x.ncols();

    if n_samples < 2 {
        return Err(PcaError::InvalidInput(format!(
            "covariance requires at least 2 samples, got {}",
            n_samples
        )));
    }
    if n_features == 0 {
        return Err(PcaError::InvalidInput(
            "input matrix has zero feature columns".to_string(),
        ));
    }

    let mean_vector = x
        .mean_axis(Axis(0))
        .ok_or_else(|| PcaError::InvalidInput("failed to compute column means".to_string()))?;
    let mut centered = x.to_owned();
    centered -= &mean_vector;

    let mut cov_matrix = centered.t().dot(&centered);
    cov_matrix /= (n_samples - 1) as f64;
    Ok(cov_matrix)
}

/// Runs the full eigendecomposition analysis on a standardized sample matrix.
///
/// Steps: covariance estimation, symmetric eigendecomposition (LAPACK
/// `syev`-style), unit-norm validation of every eigenvector, ranking by
/// descending absolute eigenvalue (stable among ties), Kaiser count, and
/// explained-variance percentages.
///
/// The Kaiser count assumes standardized input: on standardized data an
/// eigenvalue below 1 explains less variance than a single original feature.
///
/// # Errors
///
/// * [`PcaError::InvalidInput`] — fewer than 2 rows, zero columns, or zero
///   total variance (all columns constant).
/// * [`PcaError::Decomposition`] — an eigenvector failed the unit-norm check.
/// * [`PcaError::Linalg`] — the eigendecomposition itself failed.
///
/// # Examples
///
/// ```
/// use eigen_pca::eigen::analyze;
/// use ndarray::array;
///
/// let x = array![
///     [1.0, 2.0],
///     [2.0, 1.0],
///     [3.0, 4.0],
///     [4.0, 3.0],
/// ];
/// let analysis = analyze(x.view()).unwrap();
/// assert_eq!(analysis.eigenpairs().len(), 2);
/// ```
pub fn analyze(x_std: ArrayView2<f64>) -> Result<EigenAnalysis> {
    let cov_matrix = covariance_matrix(x_std)?;
    debug!(
        "computed {}x{} covariance matrix from {} samples",
        cov_matrix.nrows(),
        cov_matrix.ncols(),
        x_std.nrows()
    );

    // The backend makes no ordering promise, so pair values with their
    // column vectors before any reordering.
    let (vals, vecs) = cov_matrix.eigh(UPLO::Upper)?;
    let mut eigenpairs: Vec<Eigenpair> = vals
        .into_iter()
        .zip(vecs.columns().into_iter().map(|col| col.to_owned()))
        .map(|(value, vector)| Eigenpair { value, vector })
        .collect();

    for (component, pair) in eigenpairs.iter().enumerate() {
        let norm = pair.vector.dot(&pair.vector).sqrt();
        if (norm - 1.0).abs() > NORM_TOLERANCE {
            return Err(PcaError::Decomposition { component, norm });
        }
    }

    // Stable sort: equal eigenvalues keep the decomposition's order.
    eigenpairs.sort_by(|a, b| {
        b.value
            .abs()
            .partial_cmp(&a.value.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let kaiser_count = eigenpairs.iter().filter(|pair| pair.value > 1.0).count();

    let total: f64 = eigenpairs.iter().map(|pair| pair.value).sum();
    if total <= f64::EPSILON {
        return Err(PcaError::InvalidInput(
            "total variance is zero; explained-variance percentages are undefined".to_string(),
        ));
    }

    let explained_variance: Vec<f64> = eigenpairs
        .iter()
        .map(|pair| pair.value / total * 100.0)
        .collect();
    let cumulative_explained_variance: Vec<f64> = explained_variance
        .iter()
        .scan(0.0, |acc, pct| {
            *acc += pct;
            Some(*acc)
        })
        .collect();

    debug!(
        "ranked {} eigenpairs, kaiser count {}",
        eigenpairs.len(),
        kaiser_count
    );

    Ok(EigenAnalysis {
        covariance: cov_matrix,
        eigenpairs,
        kaiser_count,
        explained_variance,
        cumulative_explained_variance,
    })
}

impl EigenAnalysis {
    /// Eigenpairs ranked by descending absolute eigenvalue.
    pub fn eigenpairs(&self) -> &[Eigenpair] {
        &self.eigenpairs
    }

    /// Number of feature dimensions D.
    pub fn n_features(&self) -> usize {
        self.eigenpairs.len()
    }

    /// The sample covariance matrix the analysis was computed from.
    pub fn covariance(&self) -> &Array2<f64> {
        &self.covariance
    }

    /// Number of eigenpairs whose eigenvalue strictly exceeds 1.0.
    ///
    /// This is a reporting aid for choosing a subspace dimension; it does not
    /// drive any downstream computation.
    pub fn kaiser_count(&self) -> usize {
        self.kaiser_count
    }

    /// Percentage of total variance explained per ranked component.
    pub fn explained_variance(&self) -> &[f64] {
        &self.explained_variance
    }

    /// Running sum of [`Self::explained_variance`]; non-decreasing and 100.0
    /// (within floating-point tolerance) at the last component.
    pub fn cumulative_explained_variance(&self) -> &[f64] {
        &self.cumulative_explained_variance
    }

    /// Builds the D×k projection matrix W from the top-k ranked eigenvectors.
    ///
    /// # Errors
    ///
    /// Returns [`PcaError::InvalidInput`] if `k` is 0 or exceeds D.
    pub fn projection_matrix(&self, k: usize) -> Result<Array2<f64>> {
        if k == 0 || k > self.eigenpairs.len() {
            return Err(PcaError::InvalidInput(format!(
                "requested {} components but analysis has {}",
                k,
                self.eigenpairs.len()
            )));
        }
        let views: Vec<ArrayView1<f64>> = self
            .eigenpairs
            .iter()
            .take(k)
            .map(|pair| pair.vector.view())
            .collect();
        ndarray::stack(Axis(1), &views)
            .map_err(|e| PcaError::Linalg(format!("failed to assemble projection matrix: {}", e)))
    }

    /// Projects an already-standardized matrix onto the top-k components,
    /// returning the N×k score matrix Y = X·W.
    ///
    /// # Errors
    ///
    /// Returns [`PcaError::InvalidInput`] if `x` has a different number of
    /// columns than the analyzed matrix, or if `k` is out of range.
    pub fn project(&self, x: ArrayView2<f64>, k: usize) -> Result<Array2<f64>> {
        if x.ncols() != self.eigenpairs.len() {
            return Err(PcaError::InvalidInput(format!(
                "input has {} columns but analysis was computed over {}",
                x.ncols(),
                self.eigenpairs.len()
            )));
        }
        let w = self.projection_matrix(k)?;
        Ok(x.dot(&w))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rand_distr::{Distribution, Normal};

    fn gaussian_matrix(n_samples: usize, n_features: usize, seed: u64) -> Array2<f64> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let normal = Normal::new(0.0, 1.0).unwrap();
        Array2::from_shape_fn((n_samples, n_features), |_| normal.sample(&mut rng))
    }

    #[test]
    fn covariance_is_symmetric() {
        let x = gaussian_matrix(200, 5, 42);
        let cov = covariance_matrix(x.view()).unwrap();
        for i in 0..5 {
            for j in 0..5 {
                assert_abs_diff_eq!(cov[[i, j]], cov[[j, i]], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn covariance_matches_manual_centering() {
        let x = array![[1.0, 4.0], [2.0, 5.0], [3.0, 7.0]];
        let cov = covariance_matrix(x.view()).unwrap();
        // Hand-computed: var(col0) = 1, var(col1) = 7/3, cov = 1.5.
        assert_abs_diff_eq!(cov[[0, 0]], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(cov[[1, 1]], 7.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(cov[[0, 1]], 1.5, epsilon = 1e-12);
    }

    #[test]
    fn eigenvectors_are_unit_norm() {
        let x = gaussian_matrix(150, 6, 7);
        let analysis = analyze(x.view()).unwrap();
        for pair in analysis.eigenpairs() {
            let norm = pair.vector.dot(&pair.vector).sqrt();
            assert_abs_diff_eq!(norm, 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn eigenpairs_sorted_by_descending_absolute_value() {
        let x = gaussian_matrix(300, 8, 11);
        let analysis = analyze(x.view()).unwrap();
        let pairs = analysis.eigenpairs();
        for window in pairs.windows(2) {
            assert!(window[0].value.abs() >= window[1].value.abs());
        }
    }

    #[test]
    fn cumulative_variance_is_monotone_and_sums_to_100() {
        let x = gaussian_matrix(250, 4, 3);
        let analysis = analyze(x.view()).unwrap();
        let cum = analysis.cumulative_explained_variance();
        for window in cum.windows(2) {
            assert!(window[1] >= window[0] - 1e-9);
        }
        assert_abs_diff_eq!(*cum.last().unwrap(), 100.0, epsilon = 1e-6);
    }

    #[test]
    fn kaiser_count_matches_threshold_and_range() {
        let x = gaussian_matrix(400, 6, 19);
        let analysis = analyze(x.view()).unwrap();
        let expected = analysis
            .eigenpairs()
            .iter()
            .filter(|pair| pair.value > 1.0)
            .count();
        assert_eq!(analysis.kaiser_count(), expected);
        assert!(analysis.kaiser_count() <= analysis.n_features());
    }

    #[test]
    fn independent_unit_variance_features_give_unit_eigenvalues() {
        // Balanced +-1 design over 2^d rows: columns are orthogonal with
        // unit (population) variance, so the covariance is a scaled identity.
        let d = 5;
        let n = 1 << d;
        let x = Array2::from_shape_fn((n, d), |(i, j)| {
            if (i >> j) & 1 == 1 {
                1.0
            } else {
                -1.0
            }
        });
        let analysis = analyze(x.view()).unwrap();
        for pair in analysis.eigenpairs() {
            // Unbiased estimator divides by N-1, so each eigenvalue is N/(N-1).
            let expected = x.nrows() as f64 / (x.nrows() - 1) as f64;
            assert_abs_diff_eq!(pair.value, expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn identity_covariance_kaiser_count_is_zero() {
        // Population-standardized columns (ddof 0) of an orthogonal design
        // yield eigenvalues of exactly N/(N-1) > 1, so to exercise the strict
        // threshold at 1.0 the matrix is rescaled so the sample covariance is
        // exactly the identity.
        let d = 4;
        let n = 1 << d;
        let scale = ((n - 1) as f64 / n as f64).sqrt();
        let x = Array2::from_shape_fn((n, d), |(i, j)| {
            let sign = if (i >> j) & 1 == 1 { 1.0 } else { -1.0 };
            sign * scale
        });
        let analysis = analyze(x.view()).unwrap();
        for pair in analysis.eigenpairs() {
            assert_abs_diff_eq!(pair.value, 1.0, epsilon = 1e-9);
        }
        // None strictly exceed 1.0.
        assert_eq!(analysis.kaiser_count(), 0);
    }

    #[test]
    fn too_few_rows_is_invalid_input() {
        let x = array![[1.0, 2.0, 3.0]];
        match analyze(x.view()) {
            Err(PcaError::InvalidInput(_)) => {}
            other => panic!("expected InvalidInput, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn zero_columns_is_invalid_input() {
        let x = Array2::<f64>::zeros((5, 0));
        assert!(matches!(
            analyze(x.view()),
            Err(PcaError::InvalidInput(_))
        ));
    }

    #[test]
    fn constant_data_is_invalid_input() {
        let x = Array2::<f64>::ones((10, 3));
        assert!(matches!(
            analyze(x.view()),
            Err(PcaError::InvalidInput(_))
        ));
    }

    #[test]
    fn projection_matrix_has_orthonormal_columns() {
        let x = gaussian_matrix(120, 5, 23);
        let analysis = analyze(x.view()).unwrap();
        let w = analysis.projection_matrix(3).unwrap();
        assert_eq!(w.dim(), (5, 3));
        let gram = w.t().dot(&w);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(gram[[i, j]], expected, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn project_rejects_mismatched_width() {
        let x = gaussian_matrix(50, 4, 31);
        let analysis = analyze(x.view()).unwrap();
        let wrong = gaussian_matrix(10, 3, 32);
        assert!(matches!(
            analysis.project(wrong.view(), 2),
            Err(PcaError::InvalidInput(_))
        ));
    }

    #[test]
    fn projection_k_out_of_range_is_invalid_input() {
        let x = gaussian_matrix(50, 4, 37);
        let analysis = analyze(x.view()).unwrap();
        assert!(matches!(
            analysis.projection_matrix(0),
            Err(PcaError::InvalidInput(_))
        ));
        assert!(matches!(
            analysis.projection_matrix(5),
            Err(PcaError::InvalidInput(_))
        ));
    }

    #[test]
    fn dominant_direction_is_recovered() {
        // Data varying almost entirely along (1, 1)/sqrt(2).
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let wide = Normal::new(0.0, 10.0).unwrap();
        let narrow = Normal::new(0.0, 0.1).unwrap();
        let mut x = Array2::<f64>::zeros((500, 2));
        for mut row in x.rows_mut() {
            let t = wide.sample(&mut rng);
            let e = narrow.sample(&mut rng);
            row[0] = t + e;
            row[1] = t - e;
        }
        let analysis = analyze(x.view()).unwrap();
        let top = &analysis.eigenpairs()[0].vector;
        let expected = 1.0 / 2.0_f64.sqrt();
        assert_abs_diff_eq!(top[0].abs(), expected, epsilon = 1e-2);
        assert_abs_diff_eq!(top[1].abs(), expected, epsilon = 1e-2);
        assert!(analysis.explained_variance()[0] > 99.0);
    }
}
