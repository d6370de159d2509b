//! LLM Task Engine - text-to-SQL and summarization over fine-tuned FLAN-T5
//!
//! This crate loads one seq2seq model per task, validates generation
//! requests, builds the task prompts and serves both over HTTP.

use std::fmt;

use candle_core::Device;

// Public modules
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod prompt;
pub mod server;
pub mod types;
pub mod utils;
pub mod validation;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-exports for public API
pub use config::{HttpConfig, LimitsConfig, LoggingConfig, ModelConfig, ServerConfig};
pub use engine::{EngineBuilder, TaskEngine, TaskHandler};
pub use error::{ConfigError, InferenceError, LoadError, Result, ValidationError, ValidationErrors};
pub use model::{ModelHandle, Seq2SeqBackend, TaskTokenizer};
pub use server::{create_router, run_server, AppState};
pub use types::{GenerationConfig, InferenceResult, TaskKind, TaskRequest};

/// Feature detection for supported backends
pub struct Features {
    /// Whether CUDA support is compiled in
    pub cuda: bool,
    /// Whether CUDA device 0 could be opened
    pub cuda_available: bool,
}

impl Features {
    /// Detect available features at runtime
    pub fn detect() -> Self {
        let cuda = cfg!(feature = "cuda");
        let cuda_available = cuda
            && Device::cuda_if_available(0)
                .map(|device| device.is_cuda())
                .unwrap_or(false);

        Self {
            cuda,
            cuda_available,
        }
    }
}

impl fmt::Display for Features {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CUDA support: {}, device available: {}",
            if self.cuda { "yes" } else { "no" },
            if self.cuda_available { "yes" } else { "no" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_detection() {
        let features = Features::detect();
        if !cfg!(feature = "cuda") {
            assert!(!features.cuda_available);
        }
        assert!(features.to_string().starts_with("CUDA support"));
    }

    #[test]
    fn test_version_number() {
        assert!(!VERSION.is_empty());
    }
}
