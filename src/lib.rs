// Principal component analysis by covariance eigendecomposition

#![doc = include_str!("../README.md")]

pub mod dataset;
pub mod eigen;
pub mod error;
pub mod kmeans;
pub mod pipeline;
pub mod scaler;

pub use dataset::{load_iris, parse_iris, BundledIris, DataSource, IrisDataset, IrisRecord};
pub use eigen::{analyze, covariance_matrix, EigenAnalysis, Eigenpair};
pub use error::{PcaError, Result};
pub use kmeans::{KMeansConfig, KMeansFit};
pub use pipeline::{run, AnalysisReport, NullRenderer, PipelineConfig, Renderer};
pub use scaler::StandardScaler;
