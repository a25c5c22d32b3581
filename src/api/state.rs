use std::sync::Arc;

use crate::config::Config;
use crate::content::ContentFetcher;
use crate::observability::Metrics;
use crate::pipeline::Pipeline;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Arc<Pipeline>,
    pub content: Arc<ContentFetcher>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        config: Config,
        pipeline: Pipeline,
        content: ContentFetcher,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
            content: Arc::new(content),
            metrics,
        }
    }
}
