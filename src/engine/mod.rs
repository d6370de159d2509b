//! Engine module: request handling on top of the loaded task models

mod builder;
mod engine;
mod handler;

pub use builder::EngineBuilder;
pub use engine::{EngineInfo, TaskEngine};
pub use handler::{ErrorMessage, ErrorResponse, GenerationResponse, TaskHandler};
