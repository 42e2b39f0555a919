use std::sync::Arc;
use rdflix_core::{Config, SanitizedConfig, StreamService};

/// Shared application state
pub struct AppState {
    config: Arc<Config>,
    service: Arc<StreamService>,
}

impl AppState {
    pub fn new(config: Arc<Config>, service: Arc<StreamService>) -> Self {
        Self { config, service }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn service(&self) -> Arc<StreamService> {
        Arc::clone(&self.service)
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(self.config.as_ref())
    }
}
