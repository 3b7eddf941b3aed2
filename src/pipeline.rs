//! The explicit analysis pipeline: load, standardize, analyze, project,
//! cluster, render.
//!
//! Rendering targets and data origins are injected, so the whole run is
//! testable without touching the network or a plotting backend.

use log::info;
use ndarray::Array2;

use crate::dataset::{DataSource, FEATURE_NAMES};
use crate::eigen::{self, EigenAnalysis};
use crate::error::{PcaError, Result};
use crate::kmeans::{self, KMeansConfig, KMeansFit};
use crate::scaler::StandardScaler;

/// Pipeline parameters.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Dimensionality of the projection fed to clustering.
    pub n_components: usize,
    /// Number of k-means clusters.
    pub n_clusters: usize,
    /// Seed for k-means initialization.
    pub seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            n_components: 2,
            n_clusters: 3,
            seed: None,
        }
    }
}

/// Sink for the plots the original analysis drew inline.
///
/// Implementations translate these calls into an actual plotting backend;
/// that backend stays outside this crate.
pub trait Renderer {
    /// Distribution of one feature restricted to one species.
    fn feature_histogram(&mut self, feature: &str, species: &str, values: &[f64]);

    /// Per-component and cumulative explained-variance percentages, in
    /// ranked component order.
    fn variance_profile(&mut self, per_component: &[f64], cumulative: &[f64]);

    /// Projected scores (N×k) with one cluster label per row.
    fn scatter(&mut self, scores: &Array2<f64>, cluster_labels: &[usize]);
}

/// Discards every rendering call; useful for headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn feature_histogram(&mut self, _feature: &str, _species: &str, _values: &[f64]) {}
    fn variance_profile(&mut self, _per_component: &[f64], _cumulative: &[f64]) {}
    fn scatter(&mut self, _scores: &Array2<f64>, _cluster_labels: &[usize]) {}
}

/// Everything a pipeline run produces.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// The eigendecomposition analysis of the standardized features.
    pub analysis: EigenAnalysis,
    /// N×k projection of the standardized features.
    pub scores: Array2<f64>,
    /// K-means clustering of the projection.
    pub clusters: KMeansFit,
    /// Species label per row, parallel to `scores`.
    pub species: Vec<String>,
}

/// Runs the full analysis against an injected source and renderer.
///
/// Stages, in order: load, per-species feature histograms, standardize,
/// eigendecomposition analysis with a variance profile, projection onto the
/// leading components, and k-means over the projection rendered as a
/// scatter plot.
///
/// # Errors
///
/// Propagates the first failure from any stage; `n_components` of 0 or
/// larger than the feature count is rejected as [`PcaError::InvalidInput`].
pub fn run(
    source: &dyn DataSource,
    renderer: &mut dyn Renderer,
    config: &PipelineConfig,
) -> Result<AnalysisReport> {
    let dataset = source.load()?;
    info!("loaded {} observations", dataset.len());

    let features = dataset.features();
    if config.n_components == 0 || config.n_components > features.ncols() {
        return Err(PcaError::InvalidInput(format!(
            "n_components must be in 1..={}, got {}",
            features.ncols(),
            config.n_components
        )));
    }

    let species = dataset.species();
    for (col, feature) in FEATURE_NAMES.iter().enumerate() {
        for name in dataset.unique_species() {
            let values: Vec<f64> = features
                .column(col)
                .iter()
                .zip(species.iter())
                .filter(|(_, &s)| s == name)
                .map(|(&v, _)| v)
                .collect();
            renderer.feature_histogram(feature, name, &values);
        }
    }

    let (_, standardized) = StandardScaler::fit_transform(features.view())?;
    let analysis = eigen::analyze(standardized.view())?;
    info!(
        "eigendecomposition: {} components, kaiser count {}",
        analysis.n_features(),
        analysis.kaiser_count()
    );
    renderer.variance_profile(
        analysis.explained_variance(),
        analysis.cumulative_explained_variance(),
    );

    let scores = analysis.project(standardized.view(), config.n_components)?;

    let mut kmeans_config = KMeansConfig::new(config.n_clusters);
    kmeans_config.seed = config.seed;
    let clusters = kmeans::fit(scores.view(), &kmeans_config)?;
    info!(
        "k-means over {}-dimensional projection: k = {}, inertia {:.3}",
        config.n_components,
        config.n_clusters,
        clusters.inertia()
    );
    renderer.scatter(&scores, clusters.labels());

    Ok(AnalysisReport {
        analysis,
        scores,
        clusters,
        species: species.into_iter().map(str::to_owned).collect(),
    })
}
