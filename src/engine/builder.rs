use std::time::Instant;

use tracing::info;

use crate::config::ServerConfig;
use crate::error::LoadError;
use crate::model::{load_model_handle, ModelHandle};
use crate::types::TaskKind;

use super::engine::TaskEngine;

/// Builder for constructing a TaskEngine instance
pub struct EngineBuilder {
    config: Option<ServerConfig>,
}

impl EngineBuilder {
    /// Create a new builder instance
    pub fn new() -> Self {
        Self { config: None }
    }

    /// Set the service configuration
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Load both task models and build the engine
    pub async fn build(self) -> Result<TaskEngine, LoadError> {
        // Get configuration or use default
        let config = self.config.unwrap_or_default();

        config.validate().map_err(|e| LoadError::Configuration {
            parameter: "config".to_string(),
            message: e.to_string(),
        })?;

        let start = Instant::now();

        // Loading is file and tensor bound; keep it off the async workers.
        let (sql, summary) = tokio::try_join!(
            load_blocking(TaskKind::Sql, &config),
            load_blocking(TaskKind::Summary, &config),
        )?;

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Task models ready"
        );

        TaskEngine::from_handles(sql, summary, config.limits).ok_or_else(|| {
            LoadError::Task("loaded models do not match their tasks".to_string())
        })
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

async fn load_blocking(task: TaskKind, config: &ServerConfig) -> Result<ModelHandle, LoadError> {
    let model_config = config.models.for_task(task).clone();
    info!(task = %task, "Loading model");
    tokio::task::spawn_blocking(move || load_model_handle(task, &model_config))
        .await
        .map_err(|e| LoadError::Task(e.to_string()))?
}
