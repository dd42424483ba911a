//! Application state for the insights server

use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::Result;
use crate::pipeline::AgendaProcessor;
use crate::providers::{AzureOpenAiClient, GraphAuth, GraphDocumentSource};
use crate::storage::InsightsDb;
use crate::structuring::StructuredExtractor;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// The wired-up pipeline
    processor: AgendaProcessor,
    /// Insight store, shared with the processor
    db: Arc<InsightsDb>,
}

impl AppState {
    /// Wire providers, storage, and the pipeline together from configuration
    pub fn new(config: AppConfig) -> Result<Self> {
        tracing::info!("Initializing agenda insights state");

        let db = Arc::new(InsightsDb::new(&config.database.path)?);
        tracing::info!(path = %config.database.path.display(), "Database opened");

        let auth = Arc::new(GraphAuth::new(&config.source)?);
        let source = Arc::new(GraphDocumentSource::new(auth, &config.source)?);
        tracing::info!(tenant = %config.source.tenant_domain, "Document source initialized");

        let model = Arc::new(AzureOpenAiClient::new(&config.model)?);
        tracing::info!(deployment = %config.model.deployment, "Completion model initialized");

        let extractor = StructuredExtractor::new(model, config.model.max_tokens);

        let config = Arc::new(config);
        let processor =
            AgendaProcessor::new(source, extractor, Arc::clone(&db), Arc::clone(&config));

        Ok(Self {
            inner: Arc::new(AppStateInner { processor, db }),
        })
    }

    pub fn processor(&self) -> &AgendaProcessor {
        &self.inner.processor
    }

    pub fn db(&self) -> &InsightsDb {
        &self.inner.db
    }
}
