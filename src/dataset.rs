//! Labeled training data read from CSV.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use thiserror::Error;

use crate::features::{FEATURES, TARGET};

/// Cell values pandas reads as missing by default.
const NA_TOKENS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Dataset file '{}' not found", .0.display())]
    NotFound(PathBuf),
    #[error("Error loading dataset: {0}")]
    Read(#[from] csv::Error),
    #[error("Dataset has no '{0}' column")]
    MissingColumn(String),
    #[error("Row {row}: value '{value}' in column '{column}' is not numeric")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },
    #[error("Row {row}: target value '{value}' is not 0 or 1")]
    InvalidLabel { row: usize, value: String },
    #[error("Dataset has no complete rows")]
    Empty,
    #[error("Training rows need both 0 and 1 target values")]
    SingleClass,
}

/// Feature matrix (rows × [`FEATURES`]) and 0/1 labels.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub features: Array2<f64>,
    pub labels: Vec<f64>,
}

impl Dataset {
    pub fn load_csv(path: &Path) -> Result<Self, DatasetError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => DatasetError::NotFound(path.to_path_buf()),
            _ => DatasetError::Read(e.into()),
        })?;
        Self::from_reader(file)
    }

    /// Parse CSV with a header row, dropping any row that has a missing cell
    /// in any column.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))
        };
        let feature_idx = FEATURES
            .iter()
            .map(|name| column(*name))
            .collect::<Result<Vec<_>, _>>()?;
        let target_idx = column(TARGET)?;

        let mut values = Vec::new();
        let mut labels = Vec::new();
        let mut dropped = 0usize;
        for (i, record) in rdr.records().enumerate() {
            let record = record?;
            // header is line 1
            let row = i + 2;
            if record.iter().any(|cell| NA_TOKENS.contains(&cell.trim())) {
                dropped += 1;
                continue;
            }
            for (&idx, name) in feature_idx.iter().zip(FEATURES) {
                let cell = record[idx].trim();
                let v = cell.parse::<f64>().map_err(|_| DatasetError::InvalidValue {
                    row,
                    column: name.to_string(),
                    value: cell.to_string(),
                })?;
                values.push(v);
            }
            let cell = record[target_idx].trim();
            let label = match cell.parse::<f64>() {
                Ok(v) if v == 0.0 || v == 1.0 => v,
                _ => {
                    return Err(DatasetError::InvalidLabel {
                        row,
                        value: cell.to_string(),
                    })
                }
            };
            labels.push(label);
        }

        if labels.is_empty() {
            return Err(DatasetError::Empty);
        }
        if dropped > 0 {
            log::info!("Dropped {} incomplete rows", dropped);
        }

        let features = Array2::from_shape_vec((labels.len(), FEATURES.len()), values)
            .map_err(|_| DatasetError::Empty)?;
        Ok(Self { features, labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn select(&self, rows: &[usize]) -> Self {
        Self {
            features: self.features.select(Axis(0), rows),
            labels: rows.iter().map(|&r| self.labels[r]).collect(),
        }
    }

    /// Seeded shuffle split into `(train, test)`; the test side gets
    /// `ceil(test_ratio * n)` rows.
    pub fn train_test_split(&self, test_ratio: f64, seed: u64) -> (Self, Self) {
        let n = self.len();
        let n_test = ((test_ratio * n as f64).ceil() as usize).min(n);

        let mut order: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        order.shuffle(&mut rng);

        let (test, train) = order.split_at(n_test);
        (self.select(train), self.select(test))
    }
}
