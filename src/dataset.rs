//! The bundled Iris dataset and the data-source seam of the pipeline.
//!
//! The canonical 150-row UCI Iris table ships with the crate, so analyses run
//! without any network or filesystem access. Alternative sources (files,
//! fixtures) plug in through [`DataSource`].

use ndarray::Array2;
use serde::Deserialize;

use crate::error::{PcaError, Result};

/// The canonical UCI Iris table, 150 rows, embedded at build time.
pub const IRIS_CSV: &str = include_str!("../data/iris.csv");

/// Names of the four numeric feature columns, in column order.
pub const FEATURE_NAMES: [&str; 4] = ["sepal_len", "sepal_wid", "petal_len", "petal_wid"];

/// One observation: four measurements and the species label.
#[derive(Debug, Clone, Deserialize)]
pub struct IrisRecord {
    pub sepal_len: f64,
    pub sepal_wid: f64,
    pub petal_len: f64,
    pub petal_wid: f64,
    pub species: String,
}

impl IrisRecord {
    /// The four measurements in [`FEATURE_NAMES`] order.
    pub fn features(&self) -> [f64; 4] {
        [self.sepal_len, self.sepal_wid, self.petal_len, self.petal_wid]
    }
}

/// A parsed Iris table.
#[derive(Debug, Clone)]
pub struct IrisDataset {
    records: Vec<IrisRecord>,
}

impl IrisDataset {
    /// All parsed records in file order.
    pub fn records(&self) -> &[IrisRecord] {
        &self.records
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The N×4 feature matrix in file order.
    pub fn features(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.records.len(), 4), |(row, col)| {
            self.records[row].features()[col]
        })
    }

    /// Species label per row, in file order.
    pub fn species(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.species.as_str()).collect()
    }

    /// Distinct species labels, in order of first appearance.
    pub fn unique_species(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for record in &self.records {
            if !seen.contains(&record.species.as_str()) {
                seen.push(record.species.as_str());
            }
        }
        seen
    }
}

/// Parses an Iris CSV (with header) from any reader.
///
/// Fully empty lines are skipped, matching the trailing blank line in the
/// original UCI distribution.
///
/// # Errors
///
/// Returns [`PcaError::Dataset`] with the 1-based line number of the first
/// malformed record, or if the table is empty.
pub fn parse_iris<R: std::io::Read>(reader: R) -> Result<IrisDataset> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let mut records = Vec::new();
    for (idx, row) in csv_reader.deserialize::<IrisRecord>().enumerate() {
        // Header occupies line 1; the first record is line 2.
        let line = idx + 2;
        let record = row.map_err(|e| PcaError::Dataset {
            line,
            message: e.to_string(),
        })?;
        if record.features().iter().any(|v| !v.is_finite()) {
            return Err(PcaError::Dataset {
                line,
                message: "non-finite feature value".to_string(),
            });
        }
        records.push(record);
    }

    if records.is_empty() {
        return Err(PcaError::Dataset {
            line: 1,
            message: "no records found".to_string(),
        });
    }

    Ok(IrisDataset { records })
}

/// Loads the bundled 150-row Iris table.
pub fn load_iris() -> Result<IrisDataset> {
    parse_iris(IRIS_CSV.as_bytes())
}

/// Source of an Iris table for the analysis pipeline.
pub trait DataSource {
    fn load(&self) -> Result<IrisDataset>;
}

/// The bundled dataset as a [`DataSource`].
#[derive(Debug, Default, Clone, Copy)]
pub struct BundledIris;

impl DataSource for BundledIris {
    fn load(&self) -> Result<IrisDataset> {
        load_iris()
    }
}
