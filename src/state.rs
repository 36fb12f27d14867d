pub mod app_registry;
mod models_cache;
pub(crate) mod request_id;

use bytes::Bytes;

use crate::config::ShimConfig;
use crate::error::ShimError;
use crate::translator::Translator;
use crate::util::unix_now_secs;

pub use app_registry::AppRegistry;
use models_cache::ModelsCatalog;
use request_id::RequestIdGenerator;

/// Shared application state accessible to all handlers.
#[derive(Debug)]
pub struct AppState {
    pub config: ShimConfig,
    pub translator: Translator,
    pub apps: AppRegistry,
    models: ModelsCatalog,
    request_ids: RequestIdGenerator,
}

impl AppState {
    /// Build handler state from a validated config.
    ///
    /// # Errors
    ///
    /// Returns [`ShimError::Config`] when the upstream client cannot be built,
    /// or [`ShimError::Internal`] when the models listing cannot be rendered.
    pub fn new(config: ShimConfig) -> Result<Self, ShimError> {
        let translator = Translator::new(&config)?;
        let apps = AppRegistry::new(&config.apps);
        let models = ModelsCatalog::build(&apps, unix_now_secs())?;
        Ok(Self {
            config,
            translator,
            apps,
            models,
            request_ids: RequestIdGenerator::new(),
        })
    }

    /// Credential used when a request has no `Authorization` header.
    #[must_use]
    pub fn fallback_api_key(&self) -> Option<&str> {
        self.config.dashscope.api_key.as_deref()
    }

    #[must_use]
    pub fn models_response_body(&self) -> Bytes {
        self.models.list_body()
    }

    #[must_use]
    pub fn model_response_body(&self, model: &str) -> Option<Bytes> {
        self.models.model_body(model)
    }

    #[must_use]
    pub fn next_request_id(&self) -> uuid::Uuid {
        let seq = self.request_ids.next_seq();
        self.request_ids.request_uuid(seq)
    }
}
