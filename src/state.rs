use std::sync::Arc;

use crate::model::Predictor;
use crate::sink::ReadingSink;

/// Shared, read-only application context handed to every worker.
#[derive(Clone)]
pub struct AppContext {
    pub predictor: Arc<Predictor>,
    pub sink: Option<Arc<dyn ReadingSink>>,
}

impl AppContext {
    pub fn new(predictor: Predictor) -> Self {
        Self {
            predictor: Arc::new(predictor),
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ReadingSink>) -> Self {
        self.sink = Some(sink);
        self
    }
}
