//! Optional destination for served readings and their predictions.

use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use thiserror::Error;

use crate::models::SensorReading;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to write {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("Failed to encode reading: {0}")]
    Encode(#[from] serde_json::Error),
}

pub trait ReadingSink: Send + Sync {
    /// Called once per successful batch; `readings` and `predictions` align.
    fn record(&self, readings: &[SensorReading], predictions: &[u8]) -> Result<(), SinkError>;
}

#[derive(Serialize)]
struct AuditLine<'a> {
    reading: &'a SensorReading,
    prediction: u8,
}

/// Appends one JSON object per reading to a file.
pub struct JsonLinesSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReadingSink for JsonLinesSink {
    fn record(&self, readings: &[SensorReading], predictions: &[u8]) -> Result<(), SinkError> {
        let mut buf = Vec::new();
        for (reading, &prediction) in readings.iter().zip(predictions) {
            serde_json::to_writer(&mut buf, &AuditLine { reading, prediction })?;
            buf.push(b'\n');
        }

        let io_err = |source| SinkError::Io {
            path: self.path.clone(),
            source,
        };
        // a poisoned lock only means another writer panicked mid-append
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        let mut out = BufWriter::new(file);
        out.write_all(&buf).map_err(io_err)?;
        out.flush().map_err(io_err)?;
        Ok(())
    }
}
