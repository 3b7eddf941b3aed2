//! Error types shared across the crate.

use thiserror::Error;

/// Error type for all `eigen_pca` operations.
#[derive(Error, Debug)]
pub enum PcaError {
    /// The input matrix cannot support the requested computation
    /// (fewer than 2 rows, zero columns, or a dimension mismatch).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The decomposition returned an eigenvector that is not unit-norm.
    ///
    /// This signals an inconsistent result from the underlying numerical
    /// routine. It is fatal: retrying a deterministic decomposition on the
    /// same matrix yields the same result.
    #[error("eigendecomposition returned a non-unit eigenvector (component {component}, norm {norm})")]
    Decomposition { component: usize, norm: f64 },

    /// The LAPACK-backed linear algebra routine itself failed.
    #[error("linear algebra backend error: {0}")]
    Linalg(String),

    /// The dataset CSV could not be parsed or has the wrong shape.
    #[error("dataset error at line {line}: {message}")]
    Dataset { line: usize, message: String },

    /// K-means was invoked with an unusable configuration or dataset.
    #[error("clustering error: {0}")]
    Clustering(String),
}

impl From<ndarray_linalg::error::LinalgError> for PcaError {
    fn from(err: ndarray_linalg::error::LinalgError) -> Self {
        PcaError::Linalg(err.to_string())
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, PcaError>;
