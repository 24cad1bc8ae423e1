use std::sync::Arc;

use crate::ai::chat::{GenerationBackend, SessionRegistry};
use crate::core::AppConfig;

pub struct AppState {
    pub config: AppConfig,
    // Every chat session is kept in memory for the lifetime of the
    // server
    pub sessions: SessionRegistry,
    pub backend: Arc<dyn GenerationBackend>,
}

impl AppState {
    pub fn new(config: AppConfig, backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            config,
            sessions: SessionRegistry::new(),
            backend,
        }
    }
}
