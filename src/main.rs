mod config;
mod dataset;
mod error;
mod features;
mod handlers;
mod middleware;
mod model;
mod models;
mod scaler;
mod sink;
mod state;

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;

use crate::config::{Config, InferenceScaling};
use crate::model::{Predictor, TrainParams};
use crate::sink::JsonLinesSink;
use crate::state::AppContext;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env();

    let (artifact, _report) = model::load_or_train(&config, &TrainParams::default())
        .context("failed to initialize the prediction model")?;
    let predictor = Predictor::new(artifact, config.inference_scaling);
    if predictor.scaling() == InferenceScaling::Raw {
        log::warn!("Serving on unscaled inputs; the model was trained on standardized features");
    }

    let mut ctx = AppContext::new(predictor);
    if let Some(path) = &config.audit_log {
        let sink = JsonLinesSink::new(path.clone());
        log::info!("Recording served readings to {}", sink.path().display());
        ctx = ctx.with_sink(Arc::new(sink));
    }
    let ctx = web::Data::new(ctx);

    let (host, port) = config.bind_addr();
    let body_limit = config.body_limit;
    log::info!("Server running at http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(ctx.clone())
            .wrap(middleware::cors())
            .wrap(middleware::RequestLog)
            .configure(handlers::routes(body_limit))
    })
    .bind((host.as_str(), port))
    .with_context(|| format!("failed to bind {}:{}", host, port))?
    .run()
    .await?;

    Ok(())
}
