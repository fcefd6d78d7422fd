use std::sync::Arc;

use groupware_core::Translations;

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Loaded once at startup, read-only afterwards
    pub translations: Arc<Translations>,
}

impl AppState {
    pub fn new(config: Config, translations: Translations) -> Self {
        Self {
            config: Arc::new(config),
            translations: Arc::new(translations),
        }
    }
}
