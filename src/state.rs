use std::sync::Arc;

use crate::auth::{SessionError, SessionKeys};
use crate::config::AppConfig;
use crate::database::Repository;
use crate::generation::TextGenerator;

/// Handles shared by every request. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub generator: Arc<dyn TextGenerator>,
    pub config: Arc<AppConfig>,
    pub keys: SessionKeys,
}

impl AppState {
    pub fn new(
        repo: Arc<dyn Repository>,
        generator: Arc<dyn TextGenerator>,
        config: AppConfig,
    ) -> Result<Self, SessionError> {
        let keys = SessionKeys::from_config(&config.security)?;
        Ok(Self {
            repo,
            generator,
            config: Arc::new(config),
            keys,
        })
    }
}
