// Location: src/config.rs

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::TaskKind;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: HttpConfig,
    pub models: ModelsConfig,
    pub limits: LimitsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Address the HTTP listener binds to
    pub bind_address: String,

    /// Route of the text-to-SQL endpoint
    pub text2sql_endpoint: String,

    /// Route of the summarization endpoint
    pub summary_endpoint: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub sql: ModelConfig,
    pub summary: ModelConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Local directory holding config.json, tokenizer.json and the weights
    pub model_dir: Option<PathBuf>,

    /// Hub repository used when no local directory is set
    pub repo_id: Option<String>,

    /// Hub revision
    pub revision: String,

    /// Safetensors files, relative to the model directory or repository
    pub weight_files: Vec<String>,

    /// Maximum number of prompt tokens fed to the encoder
    pub max_input_length: usize,

    /// Weight precision: "f32", "bf16" or "f16"
    pub dtype: String,

    /// CUDA ordinal, ignored on CPU
    pub device_id: usize,

    /// Fixed sampling seed; a random seed is drawn per request when unset
    pub seed: Option<u64>,
}

/// Upper bounds on what a single request may ask for
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_new_tokens: usize,
    pub max_return_sequences: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by RUST_LOG
    pub level: String,
    /// Emit JSON lines instead of human readable output
    pub json: bool,
    /// Append to this file instead of stdout
    pub file_path: Option<PathBuf>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5000".to_string(),
            text2sql_endpoint: "/api/v1/text2sql".to_string(),
            summary_endpoint: "/api/v1/summary".to_string(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: None,
            repo_id: Some("google/flan-t5-large".to_string()),
            revision: "main".to_string(),
            weight_files: vec!["model.safetensors".to_string()],
            max_input_length: 512,
            dtype: "f32".to_string(),
            device_id: 0,
            seed: None,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_new_tokens: 1024,
            max_return_sequences: 8,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file_path: None,
        }
    }
}

impl ModelsConfig {
    pub fn for_task(&self, task: TaskKind) -> &ModelConfig {
        match task {
            TaskKind::Sql => &self.sql,
            TaskKind::Summary => &self.summary,
        }
    }
}

impl ServerConfig {
    /// Read a TOML config file; missing sections fall back to defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ServerConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let server = &self.server;
        for (parameter, endpoint) in [
            ("text2sql_endpoint", &server.text2sql_endpoint),
            ("summary_endpoint", &server.summary_endpoint),
        ] {
            if !endpoint.starts_with('/') {
                return Err(ConfigError::Invalid {
                    parameter: parameter.to_string(),
                    message: "Endpoint must start with '/'".to_string(),
                });
            }
        }
        if server.text2sql_endpoint == server.summary_endpoint {
            return Err(ConfigError::Invalid {
                parameter: "summary_endpoint".to_string(),
                message: "Endpoints must differ".to_string(),
            });
        }

        for task in [TaskKind::Sql, TaskKind::Summary] {
            self.models.for_task(task).validate(task)?;
        }

        if self.limits.max_new_tokens == 0 {
            return Err(ConfigError::Invalid {
                parameter: "limits.max_new_tokens".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }
        if self.limits.max_return_sequences == 0 {
            return Err(ConfigError::Invalid {
                parameter: "limits.max_return_sequences".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

impl ModelConfig {
    pub fn validate(&self, task: TaskKind) -> Result<(), ConfigError> {
        let parameter = |name: &str| format!("models.{}.{}", task_section(task), name);

        if self.model_dir.is_none() && self.repo_id.is_none() {
            return Err(ConfigError::Invalid {
                parameter: parameter("model_dir"),
                message: "Either model_dir or repo_id must be set".to_string(),
            });
        }
        if self.weight_files.is_empty() {
            return Err(ConfigError::Invalid {
                parameter: parameter("weight_files"),
                message: "At least one weight file is required".to_string(),
            });
        }
        if self.max_input_length == 0 {
            return Err(ConfigError::Invalid {
                parameter: parameter("max_input_length"),
                message: "Must be at least 1".to_string(),
            });
        }
        if !matches!(self.dtype.as_str(), "f32" | "bf16" | "f16") {
            return Err(ConfigError::Invalid {
                parameter: parameter("dtype"),
                message: format!("Unsupported dtype {}", self.dtype),
            });
        }
        Ok(())
    }
}

fn task_section(task: TaskKind) -> &'static str {
    match task {
        TaskKind::Sql => "sql",
        TaskKind::Summary => "summary",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.server.text2sql_endpoint, "/api/v1/text2sql");
        assert_eq!(config.server.summary_endpoint, "/api/v1/summary");
        assert_eq!(config.models.sql.max_input_length, 512);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ServerConfig::default();
        config.models.summary.repo_id = None;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.server.summary_endpoint = config.server.text2sql_endpoint.clone();
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.models.sql.dtype = "int8".to_string();
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.limits.max_return_sequences = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[server]
bind_address = "0.0.0.0:8080"

[models.sql]
model_dir = "/models/flan-t5-sql"
repo_id = "google/flan-t5-base"
max_input_length = 256

[limits]
max_new_tokens = 300
"#
        )
        .unwrap();

        let config = ServerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
        assert_eq!(config.server.summary_endpoint, "/api/v1/summary");
        assert_eq!(
            config.models.sql.model_dir,
            Some(PathBuf::from("/models/flan-t5-sql"))
        );
        assert_eq!(config.models.sql.max_input_length, 256);
        assert_eq!(config.models.summary, ModelConfig::default());
        assert_eq!(config.limits.max_new_tokens, 300);
        assert_eq!(config.limits.max_return_sequences, 8);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ServerConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: ServerConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config.toml");
        let config = ServerConfig::from_file(path).unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_unreadable_file() {
        let result = ServerConfig::from_file("/definitely/not/here.toml");
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
