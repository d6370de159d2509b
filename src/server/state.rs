//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::HttpConfig;
use crate::engine::TaskEngine;

#[derive(Clone)]
pub struct AppState {
    /// Loaded task models and their request handlers
    pub engine: Arc<TaskEngine>,
    /// Routes and bind address
    pub http: Arc<HttpConfig>,
}

impl AppState {
    pub fn new(engine: TaskEngine, http: HttpConfig) -> Self {
        Self {
            engine: Arc::new(engine),
            http: Arc::new(http),
        }
    }
}
