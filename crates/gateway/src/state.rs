//! Application state shared across handlers

use kitchenbuddy_common::{config::AppConfig, ExtractionClient, KitchenStore};
use kitchenbuddy_ingestion::{IngestPipeline, SuggestionService};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn KitchenStore>,
    pub pipeline: IngestPipeline,
    pub suggestions: SuggestionService,
    /// Absent when no Prometheus recorder is installed (tests)
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(
        config: Arc<AppConfig>,
        store: Arc<dyn KitchenStore>,
        client: Arc<dyn ExtractionClient>,
    ) -> Self {
        let retry = config.extraction.retry_policy();

        Self {
            pipeline: IngestPipeline::new(client.clone(), retry),
            suggestions: SuggestionService::new(store.clone(), client, retry),
            config,
            store,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
