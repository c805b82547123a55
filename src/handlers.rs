use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde_json::Value;

use crate::error::PredictError;
use crate::features;
use crate::models::PredictionResponse;
use crate::state::AppContext;

/// Register the prediction route; `body_limit` caps the JSON body in bytes.
pub fn routes(body_limit: usize) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(json_config(body_limit))
            .service(web::resource("/api/predict").route(web::post().to(predict)));
    }
}

/// Body extraction failures use the same `{"error": ...}` shape as
/// validation failures.
fn json_config(body_limit: usize) -> web::JsonConfig {
    web::JsonConfig::default().limit(body_limit).error_handler(|err, _req| {
        let err = PredictError::Body(err.to_string());
        log::error!("Prediction Error: {}", err);
        err.into()
    })
}

pub async fn predict(
    ctx: web::Data<AppContext>,
    body: web::Json<Vec<Value>>,
) -> Result<HttpResponse, PredictError> {
    match predict_batch(&ctx, body.into_inner()).await {
        Ok(predictions) => Ok(HttpResponse::Ok().json(PredictionResponse { predictions })),
        Err(err) => {
            log::error!("Prediction Error: {}", err);
            Err(err)
        }
    }
}

async fn predict_batch(ctx: &AppContext, records: Vec<Value>) -> Result<Vec<u8>, PredictError> {
    let mut readings = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let reading = features::parse_reading(index, record)?;
        log::info!("Row {}: {}", index, reading);
        readings.push(reading);
    }
    if readings.is_empty() {
        return Ok(Vec::new());
    }

    let predictor = Arc::clone(&ctx.predictor);
    let (readings, predictions) = web::block(move || {
        let predictions = predictor.predict(&readings);
        (readings, predictions)
    })
    .await
    .map_err(|e| PredictError::Inference(e.to_string()))?;

    if let Some(sink) = ctx.sink.clone() {
        let recorded = predictions.clone();
        match web::block(move || sink.record(&readings, &recorded)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::warn!("Reading sink failed: {}", e),
            Err(e) => log::warn!("Reading sink failed: {}", e),
        }
    }

    Ok(predictions)
}
