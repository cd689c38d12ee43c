//! Shared collaborators handed to the session, the run loop and tools.

use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::config::{ChatConfig, ConfigStore};
use crate::error::Result;
use crate::models::ModelInfo;
use crate::provider::{ModelProvider, OpenAiCompatibleFactory, ProviderFactory};
use crate::search::{SearchBackend, TavilyClient};
use crate::trace::TraceSink;
use crate::ui::{NoUi, UiController};

/// Explicit bundle of process-wide services.
///
/// Cheap to clone; every field is shared. Several sessions may use the
/// same context.
#[derive(Clone)]
pub struct SessionContext {
    pub config: Arc<ConfigStore>,
    pub providers: Arc<dyn ProviderFactory>,
    pub search: Arc<dyn SearchBackend>,
    pub ui: Arc<dyn UiController>,
    pub tracer: Arc<TraceSink>,
    model_cache: Arc<Mutex<Option<CachedModels>>>,
}

/// Model list together with the endpoint it was fetched from.
struct CachedModels {
    base_url: String,
    api_key: String,
    models: Vec<ModelInfo>,
}

impl CachedModels {
    fn serves(&self, config: &ChatConfig) -> bool {
        self.base_url == config.base_url && self.api_key == config.api_key
    }
}

impl SessionContext {
    /// Context with the default HTTP provider, Tavily search, no UI and an
    /// in-memory trace sink.
    pub fn new(config: Arc<ConfigStore>) -> Self {
        Self {
            config,
            providers: Arc::new(OpenAiCompatibleFactory),
            search: Arc::new(TavilyClient::default()),
            ui: Arc::new(NoUi),
            tracer: Arc::new(TraceSink::new(None)),
            model_cache: Arc::default(),
        }
    }

    pub fn with_providers(mut self, providers: Arc<dyn ProviderFactory>) -> Self {
        self.providers = providers;
        self
    }

    pub fn with_search(mut self, search: Arc<dyn SearchBackend>) -> Self {
        self.search = search;
        self
    }

    pub fn with_ui(mut self, ui: Arc<dyn UiController>) -> Self {
        self.ui = ui;
        self
    }

    pub fn with_tracer(mut self, tracer: Arc<TraceSink>) -> Self {
        self.tracer = tracer;
        self
    }

    /// Provider bound to the current configuration.
    pub fn provider(&self) -> Result<Arc<dyn ModelProvider>> {
        self.providers.create(&self.config.get())
    }

    /// Fetch the model list from the endpoint and replace the cache.
    pub async fn refresh_models(&self) -> Result<Vec<ModelInfo>> {
        let config = self.config.get();
        let models = self.providers.create(&config)?.list_models().await?;
        debug!(count = models.len(), base_url = %config.base_url, "Model list refreshed");
        *self.model_cache.lock().await = Some(CachedModels {
            base_url: config.base_url,
            api_key: config.api_key,
            models: models.clone(),
        });
        Ok(models)
    }

    /// Cached model list, fetching it on first use and again whenever the
    /// endpoint or key changed since it was cached.
    pub async fn models(&self) -> Result<Vec<ModelInfo>> {
        let config = self.config.get();
        if let Some(cached) = self.model_cache.lock().await.as_ref() {
            if cached.serves(&config) {
                return Ok(cached.models.clone());
            }
        }
        self.refresh_models().await
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("config", &self.config)
            .field("tracer", &self.tracer)
            .finish_non_exhaustive()
    }
}
