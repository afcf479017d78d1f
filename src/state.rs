// src/state.rs
use std::sync::Arc;
use std::time::Duration;

use crate::services::assistant::ModelProvider;

pub type SharedState = Arc<AppState>;

/// Read-only after startup; concurrent requests share nothing mutable.
pub struct AppState {
    pub provider: Arc<dyn ModelProvider>,
    pub reply_timeout: Duration,
}

impl AppState {
    pub fn new(provider: Arc<dyn ModelProvider>, reply_timeout: Duration) -> Self {
        Self {
            provider,
            reply_timeout,
        }
    }
}
