//! Service configuration. Every field has a built-in default; the process
//! environment (and an optional `.env` file) may override it.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Default cap on a prediction request body (256 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 256 * 1024 * 1024;

/// Whether request features go through the training scaler before inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferenceScaling {
    /// Feed values exactly as received (the model was fit on scaled data).
    Raw,
    /// Apply the persisted scaler first.
    Standardized,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Labeled CSV used for training.
    pub dataset_path: PathBuf,
    /// Where the trained artifact is written and read.
    pub model_path: PathBuf,
    /// Retrain on every start even when an artifact already exists.
    pub retrain: bool,
    pub inference_scaling: InferenceScaling,
    /// JSON-lines audit file for served predictions; disabled when `None`.
    pub audit_log: Option<PathBuf>,
    /// Largest accepted JSON body in bytes.
    pub body_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            dataset_path: PathBuf::from("sensor_dataset.csv"),
            model_path: PathBuf::from("sensor_model.json"),
            retrain: true,
            inference_scaling: InferenceScaling::Raw,
            audit_log: None,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let scale_inputs = parse_or(&lookup, "PREDICT_SCALE_INPUTS", false);

        Self {
            host: lookup("PREDICT_HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PREDICT_PORT", defaults.port),
            dataset_path: lookup("PREDICT_DATASET")
                .map(PathBuf::from)
                .unwrap_or(defaults.dataset_path),
            model_path: lookup("PREDICT_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            retrain: parse_or(&lookup, "PREDICT_RETRAIN", defaults.retrain),
            inference_scaling: if scale_inputs {
                InferenceScaling::Standardized
            } else {
                InferenceScaling::Raw
            },
            audit_log: lookup("PREDICT_AUDIT_LOG")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            body_limit: parse_or(&lookup, "PREDICT_MAX_BODY_BYTES", defaults.body_limit),
        }
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Ignoring invalid {}={:?}", key, raw);
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_match_fixed_service_values() {
        let config = from_pairs(&[]);
        assert_eq!(config.bind_addr(), ("0.0.0.0".to_string(), 5000));
        assert_eq!(config.dataset_path, PathBuf::from("sensor_dataset.csv"));
        assert!(config.retrain);
        assert_eq!(config.inference_scaling, InferenceScaling::Raw);
        assert!(config.audit_log.is_none());
        assert_eq!(config.body_limit, DEFAULT_BODY_LIMIT);
    }

    #[test]
    fn overrides_are_applied() {
        let config = from_pairs(&[
            ("PREDICT_PORT", "8081"),
            ("PREDICT_RETRAIN", "false"),
            ("PREDICT_SCALE_INPUTS", "true"),
            ("PREDICT_AUDIT_LOG", "audit.jsonl"),
            ("PREDICT_MAX_BODY_BYTES", "1048576"),
        ]);
        assert_eq!(config.port, 8081);
        assert!(!config.retrain);
        assert_eq!(config.inference_scaling, InferenceScaling::Standardized);
        assert_eq!(config.audit_log, Some(PathBuf::from("audit.jsonl")));
        assert_eq!(config.body_limit, 1024 * 1024);
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = from_pairs(&[("PREDICT_PORT", "http"), ("PREDICT_RETRAIN", "maybe")]);
        assert_eq!(config.port, 5000);
        assert!(config.retrain);
    }
}
