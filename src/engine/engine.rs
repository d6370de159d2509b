use std::sync::Arc;

use crate::config::LimitsConfig;
use crate::model::ModelHandle;
use crate::types::TaskKind;
use crate::validation::RequestValidator;

use super::builder::EngineBuilder;
use super::handler::TaskHandler;

/// Main entry point: one request handler per served task
pub struct TaskEngine {
    sql: Arc<TaskHandler>,
    summary: Arc<TaskHandler>,
}

/// Static description of a running engine
#[derive(Debug, Clone, PartialEq)]
pub struct EngineInfo {
    pub tasks: Vec<TaskKind>,
    pub max_input_lengths: Vec<(TaskKind, usize)>,
}

impl TaskEngine {
    /// Create a new engine builder
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Assemble an engine from already loaded models.
    ///
    /// Returns `None` when a handle is passed for the wrong task.
    pub fn from_handles(
        sql: ModelHandle,
        summary: ModelHandle,
        limits: LimitsConfig,
    ) -> Option<Self> {
        if sql.task() != TaskKind::Sql || summary.task() != TaskKind::Summary {
            return None;
        }
        let validator = RequestValidator::new(limits);
        Some(Self {
            sql: Arc::new(TaskHandler::new(Arc::new(sql), validator)),
            summary: Arc::new(TaskHandler::new(Arc::new(summary), validator)),
        })
    }

    pub fn handler(&self, task: TaskKind) -> Arc<TaskHandler> {
        match task {
            TaskKind::Sql => Arc::clone(&self.sql),
            TaskKind::Summary => Arc::clone(&self.summary),
        }
    }

    pub fn info(&self) -> EngineInfo {
        let tasks = vec![TaskKind::Sql, TaskKind::Summary];
        let max_input_lengths = tasks
            .iter()
            .map(|task| (*task, self.handler(*task).max_input_length()))
            .collect();
        EngineInfo {
            tasks,
            max_input_lengths,
        }
    }
}
