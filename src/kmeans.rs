//! Lloyd's k-means over the rows of an `ndarray` matrix.
//!
//! Centroids are seeded by sampling distinct input rows; a fixed seed makes
//! the whole fit deterministic.

use log::debug;
use ndarray::{Array2, ArrayView1, ArrayView2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{PcaError, Result};

/// Configuration for a k-means fit.
#[derive(Debug, Clone)]
pub struct KMeansConfig {
    /// Number of clusters k.
    pub n_clusters: usize,
    /// Maximum number of Lloyd iterations.
    pub max_iter: usize,
    /// Convergence threshold on the largest centroid displacement.
    pub tol: f64,
    /// Seed for centroid initialization. `None` draws from the thread RNG.
    pub seed: Option<u64>,
}

impl KMeansConfig {
    /// Config with `max_iter` 300 and `tol` 1e-4.
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            max_iter: 300,
            tol: 1e-4,
            seed: None,
        }
    }

    /// Sets the initialization seed for reproducible fits.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Overrides the iteration cap.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Overrides the convergence threshold.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }
}

/// A converged (or iteration-capped) k-means clustering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMeansFit {
    centroids: Array2<f64>,
    labels: Vec<usize>,
    inertia: f64,
}

impl KMeansFit {
    /// Cluster index per input row, in input order.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Final centroids, shape (k, n_features).
    pub fn centroids(&self) -> &Array2<f64> {
        &self.centroids
    }

    /// Sum of squared distances of each point to its assigned centroid.
    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    /// Assigns each row of `points` to its nearest centroid.
    ///
    /// # Errors
    ///
    /// Returns [`PcaError::InvalidInput`] if the column count of `points`
    /// differs from the centroid width.
    pub fn predict(&self, points: ArrayView2<f64>) -> Result<Vec<usize>> {
        if points.ncols() != self.centroids.ncols() {
            return Err(PcaError::InvalidInput(format!(
                "points have {} columns but centroids have {}",
                points.ncols(),
                self.centroids.ncols()
            )));
        }
        Ok(points
            .rows()
            .into_iter()
            .map(|row| nearest_centroid(row, self.centroids.view()).0)
            .collect())
    }
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x - y) * (x - y))
        .sum()
}

fn nearest_centroid(point: ArrayView1<f64>, centroids: ArrayView2<f64>) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (idx, centroid) in centroids.rows().into_iter().enumerate() {
        let dist = squared_distance(point, centroid);
        if dist < best.1 {
            best = (idx, dist);
        }
    }
    best
}

/// Runs Lloyd's algorithm on the rows of `data`.
///
/// Empty clusters keep their previous centroid. The fit stops when the
/// largest centroid displacement drops below `config.tol` or after
/// `config.max_iter` iterations.
///
/// # Errors
///
/// Returns [`PcaError::Clustering`] if `n_clusters` is 0 or exceeds the
/// number of rows, or if `data` is empty.
pub fn fit(data: ArrayView2<f64>, config: &KMeansConfig) -> Result<KMeansFit> {
    let n_samples = data.nrows();
    let n_features = data.ncols();

    if n_samples == 0 || n_features == 0 {
        return Err(PcaError::Clustering(
            "cannot cluster an empty matrix".to_string(),
        ));
    }
    if config.n_clusters == 0 {
        return Err(PcaError::Clustering(
            "n_clusters must be greater than 0".to_string(),
        ));
    }
    if config.n_clusters > n_samples {
        return Err(PcaError::Clustering(format!(
            "n_clusters ({}) exceeds number of samples ({})",
            config.n_clusters, n_samples
        )));
    }

    let mut rng = match config.seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_rng(rand::thread_rng())
            .map_err(|e| PcaError::Clustering(format!("failed to initialize RNG: {}", e)))?,
    };

    // Seed centroids from k distinct input rows.
    let chosen = rand::seq::index::sample(&mut rng, n_samples, config.n_clusters);
    let mut centroids = Array2::<f64>::zeros((config.n_clusters, n_features));
    for (cluster, row_idx) in chosen.into_iter().enumerate() {
        centroids.row_mut(cluster).assign(&data.row(row_idx));
    }

    let mut labels = vec![0usize; n_samples];
    for iteration in 0..config.max_iter {
        for (point, label) in data.rows().into_iter().zip(labels.iter_mut()) {
            *label = nearest_centroid(point, centroids.view()).0;
        }

        let mut new_centroids = Array2::<f64>::zeros((config.n_clusters, n_features));
        let mut counts = vec![0usize; config.n_clusters];
        for (point, &label) in data.rows().into_iter().zip(labels.iter()) {
            let mut acc = new_centroids.row_mut(label);
            acc += &point;
            counts[label] += 1;
        }
        for (cluster, &count) in counts.iter().enumerate() {
            if count > 0 {
                let mut row = new_centroids.row_mut(cluster);
                row /= count as f64;
            } else {
                new_centroids.row_mut(cluster).assign(&centroids.row(cluster));
            }
        }

        let movement = centroids
            .rows()
            .into_iter()
            .zip(new_centroids.rows())
            .map(|(old, new)| squared_distance(old, new).sqrt())
            .fold(0.0f64, f64::max);
        centroids = new_centroids;

        if movement < config.tol {
            debug!("k-means converged after {} iterations", iteration + 1);
            break;
        }
    }

    // Final assignment against the last centroid update.
    let mut inertia = 0.0;
    for (point, label) in data.rows().into_iter().zip(labels.iter_mut()) {
        let (idx, dist) = nearest_centroid(point, centroids.view());
        *label = idx;
        inertia += dist;
    }

    Ok(KMeansFit {
        centroids,
        labels,
        inertia,
    })
}
