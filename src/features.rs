//! Feature layout and per-record validation for prediction requests.

use serde_json::{Map, Value};

use crate::error::PredictError;
use crate::models::SensorReading;

/// Model inputs in the column order the model was trained on.
pub const FEATURES: [&str; 9] = [
    "footfall",
    "tempMode",
    "AQ",
    "USS",
    "CS",
    "VOC",
    "RP",
    "IP",
    "Temperature",
];

/// Binary label column in the training dataset.
pub const TARGET: &str = "fail";

/// Validate one raw request record and coerce it into a [`SensorReading`].
///
/// Missing (or null) features are reported all at once, in canonical order.
/// Numeric text is accepted; anything else that is not a number fails on the
/// first offending column.
pub fn parse_reading(index: usize, raw: &Value) -> Result<SensorReading, PredictError> {
    let record = raw
        .as_object()
        .ok_or(PredictError::NotAnObject { index })?;

    let missing: Vec<String> = FEATURES
        .iter()
        .filter(|name| record.get(**name).map_or(true, Value::is_null))
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(PredictError::MissingFeatures(missing));
    }

    let mut values = [0.0; 9];
    for (slot, name) in values.iter_mut().zip(FEATURES) {
        *slot = coerce(record, name)?;
    }
    Ok(SensorReading::from_values(values))
}

fn coerce(record: &Map<String, Value>, column: &str) -> Result<f64, PredictError> {
    let value = match record.get(column) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value
        .filter(|v| v.is_finite())
        .ok_or_else(|| PredictError::NonNumeric {
            column: column.to_string(),
        })
}
