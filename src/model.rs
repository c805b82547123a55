//! Boosted-tree failure classifier: training, persistence and inference.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use gbdt::config::Config as GbdtConfig;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use ndarray::{Array1, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::config::{Config, InferenceScaling};
use crate::dataset::{Dataset, DatasetError};
use crate::error::StartupError;
use crate::features::FEATURES;
use crate::models::SensorReading;
use crate::scaler::StandardScaler;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Error saving model to '{}': {source}", path.display())]
    Save { path: PathBuf, source: io::Error },
    #[error("Error loading model from '{}': {source}", path.display())]
    Load { path: PathBuf, source: io::Error },
    #[error("Error encoding model: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Model file '{}' is not a valid artifact: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Model was trained on features {found:?}, expected {expected:?}")]
    FeatureMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
}

/// Fixed boosting hyperparameters.
#[derive(Debug, Clone)]
pub struct TrainParams {
    pub trees: usize,
    pub max_depth: u32,
    pub learning_rate: f32,
    pub subsample: f64,
    pub test_ratio: f64,
    pub seed: u64,
}

impl Default for TrainParams {
    fn default() -> Self {
        Self {
            trees: 500,
            max_depth: 7,
            learning_rate: 0.01,
            subsample: 0.3,
            test_ratio: 0.2,
            seed: 42,
        }
    }
}

impl TrainParams {
    fn gbdt_config(&self) -> GbdtConfig {
        let mut cfg = GbdtConfig::new();
        cfg.set_feature_size(FEATURES.len());
        cfg.set_max_depth(self.max_depth);
        cfg.set_iterations(self.trees);
        cfg.set_shrinkage(self.learning_rate);
        cfg.set_data_sample_ratio(self.subsample);
        cfg.set_loss("LogLikelyhood");
        cfg.set_debug(false);
        cfg
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    /// Misclassification rate on the held-out split.
    pub holdout_error: Option<f64>,
}

/// Persisted model: the ensemble plus the scaler it was trained behind.
#[derive(Serialize, Deserialize)]
pub struct ModelArtifact {
    features: Vec<String>,
    scaler: StandardScaler,
    model: GBDT,
}

impl fmt::Debug for ModelArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelArtifact")
            .field("features", &self.features)
            .field("scaler", &self.scaler)
            .finish_non_exhaustive()
    }
}

impl ModelArtifact {
    /// Standardize, split, fit and score on the held-out rows.
    pub fn train(
        dataset: &Dataset,
        params: &TrainParams,
    ) -> Result<(Self, TrainingReport), DatasetError> {
        let scaler = StandardScaler::fit(&dataset.features).ok_or(DatasetError::Empty)?;
        let mut scaled = dataset.clone();
        scaler.transform(&mut scaled.features);

        let (train, test) = scaled.train_test_split(params.test_ratio, params.seed);
        if train.is_empty() {
            return Err(DatasetError::Empty);
        }
        // a one-class fit leaves an infinite base score that cannot round-trip
        let has_class = |class: f64| train.labels.iter().any(|&l| l == class);
        if !(has_class(0.0) && has_class(1.0)) {
            return Err(DatasetError::SingleClass);
        }

        let mut train_data: DataVec = train
            .features
            .axis_iter(Axis(0))
            .zip(&train.labels)
            // log-likelihood loss expects -1/+1 targets
            .map(|(row, &label)| {
                let target = if label > 0.5 { 1.0 } else { -1.0 };
                Data::new_training_data(to_f32(row), 1.0, target, None)
            })
            .collect();

        let mut model = GBDT::new(&params.gbdt_config());
        model.fit(&mut train_data);

        let artifact = Self {
            features: FEATURES.iter().map(|f| f.to_string()).collect(),
            scaler,
            model,
        };

        let holdout_error = if test.is_empty() {
            None
        } else {
            let rows: Vec<Vec<f32>> = test.features.axis_iter(Axis(0)).map(to_f32).collect();
            let wrong = artifact
                .classify(rows)
                .iter()
                .zip(&test.labels)
                .filter(|(predicted, &label)| f64::from(**predicted) != label)
                .count();
            Some(wrong as f64 / test.len() as f64)
        };

        let report = TrainingReport {
            rows: dataset.len(),
            train_rows: train.len(),
            test_rows: test.len(),
            holdout_error,
        };
        Ok((artifact, report))
    }

    /// Write the artifact, replacing any existing file at `path`.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let encoded = serde_json::to_vec(self)?;
        let save_err = |source| ModelError::Save {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(save_err)?;
        tmp.write_all(&encoded).map_err(save_err)?;
        tmp.persist(path).map_err(|e| save_err(e.error))?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let bytes = fs::read(path).map_err(|source| ModelError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: Self =
            serde_json::from_slice(&bytes).map_err(|source| ModelError::Decode {
                path: path.to_path_buf(),
                source,
            })?;

        if artifact.features != FEATURES || artifact.scaler.width() != FEATURES.len() {
            return Err(ModelError::FeatureMismatch {
                expected: FEATURES.iter().map(|f| f.to_string()).collect(),
                found: artifact.features,
            });
        }
        Ok(artifact)
    }

    /// 0/1 label per row. The ensemble's score is a probability (or a ±1
    /// label, depending on the loss), so anything above 0.5 is a failure.
    fn classify(&self, rows: Vec<Vec<f32>>) -> Vec<u8> {
        if rows.is_empty() {
            return Vec::new();
        }
        let data: DataVec = rows
            .into_iter()
            .map(|features| Data::new_test_data(features, None))
            .collect();
        self.model
            .predict(&data)
            .into_iter()
            .map(|score| u8::from(score > 0.5))
            .collect()
    }
}

fn to_f32(row: ArrayView1<f64>) -> Vec<f32> {
    row.iter().map(|&v| v as f32).collect()
}

/// Read-only model handle shared by request handlers.
pub struct Predictor {
    artifact: ModelArtifact,
    scaling: InferenceScaling,
}

impl Predictor {
    pub fn new(artifact: ModelArtifact, scaling: InferenceScaling) -> Self {
        Self { artifact, scaling }
    }

    pub fn scaling(&self) -> InferenceScaling {
        self.scaling
    }

    pub fn predict(&self, readings: &[SensorReading]) -> Vec<u8> {
        let rows = readings
            .iter()
            .map(|reading| {
                let raw = Array1::from(reading.values().to_vec());
                match self.scaling {
                    InferenceScaling::Raw => to_f32(raw.view()),
                    InferenceScaling::Standardized => self
                        .artifact
                        .scaler
                        .transform_row(raw.view())
                        .into_iter()
                        .map(|v| v as f32)
                        .collect(),
                }
            })
            .collect();
        self.artifact.classify(rows)
    }
}

/// Produce the serving model: train (and persist) when retraining is on or
/// no artifact exists yet, otherwise load the existing artifact.
pub fn load_or_train(
    config: &Config,
    params: &TrainParams,
) -> Result<(ModelArtifact, Option<TrainingReport>), StartupError> {
    if !config.retrain && config.model_path.exists() {
        log::info!("Loading model from {}", config.model_path.display());
        let artifact = ModelArtifact::load(&config.model_path)?;
        log::info!("Model loaded successfully.");
        return Ok((artifact, None));
    }

    log::info!("Training model from {}", config.dataset_path.display());
    let dataset = Dataset::load_csv(&config.dataset_path)?;
    let (artifact, report) = ModelArtifact::train(&dataset, params)?;
    log::info!(
        "Trained on {} rows ({} train / {} test)",
        report.rows,
        report.train_rows,
        report.test_rows
    );
    if let Some(err) = report.holdout_error {
        log::info!("Holdout error rate: {:.4}", err);
    }

    artifact.save(&config.model_path)?;
    log::info!("Model saved successfully to {}", config.model_path.display());
    Ok((artifact, Some(report)))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// 200 rows where failures are driven by high air quality readings.
    pub fn dataset() -> Dataset {
        let mut csv = String::from("footfall,tempMode,AQ,USS,CS,VOC,RP,IP,Temperature,fail\n");
        for i in 0..200u32 {
            let aq = i % 10;
            let fail = u32::from(aq >= 5);
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{},{},{}\n",
                (i * 37) % 500,
                i % 8,
                aq,
                (i * 7) % 9,
                i % 6,
                (i * 3) % 7,
                (i * 11) % 60,
                i % 5,
                10 + i % 20,
                fail
            ));
        }
        Dataset::from_reader(csv.as_bytes()).unwrap()
    }

    pub fn params() -> TrainParams {
        TrainParams {
            trees: 30,
            max_depth: 3,
            learning_rate: 0.1,
            subsample: 1.0,
            ..TrainParams::default()
        }
    }

    pub fn artifact() -> ModelArtifact {
        ModelArtifact::train(&dataset(), &params()).unwrap().0
    }
}
