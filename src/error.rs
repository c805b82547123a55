//! Error types surfaced at the process and HTTP boundaries.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::dataset::DatasetError;
use crate::model::ModelError;
use crate::models::ErrorResponse;

/// Anything that stops the service from coming up.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Failure of a prediction batch. Every variant aborts the whole batch.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("Missing features: {}", .0.join(", "))]
    MissingFeatures(Vec<String>),
    #[error("Cannot convert column '{column}' to numeric.")]
    NonNumeric { column: String },
    #[error("Record {index} is not a JSON object")]
    NotAnObject { index: usize },
    #[error("Invalid request body: {0}")]
    Body(String),
    #[error("Inference failed: {0}")]
    Inference(String),
}

impl ResponseError for PredictError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}
