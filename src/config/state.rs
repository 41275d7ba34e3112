// Application state module
// Configuration plus the injected post store, shared by every connection

use std::sync::Arc;
use tokio::sync::Notify;

use super::types::Config;
use crate::store::SharedStore;

/// Application state
pub struct AppState {
    pub config: Config,
    pub store: SharedStore,
    pub shutdown_signal: Arc<Notify>,
}

impl AppState {
    pub fn new(config: Config, store: SharedStore) -> Self {
        Self {
            config,
            store,
            shutdown_signal: Arc::new(Notify::new()),
        }
    }

    pub const fn access_log_enabled(&self) -> bool {
        self.config.logging.access_log
    }
}
