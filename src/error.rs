use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

// Add Result type alias
pub type Result<T> = std::result::Result<T, InferenceError>;

/// A single violated request constraint
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required parameter `{field}`")]
    MissingField { field: &'static str },

    #[error("Value {value} for `{field}` cannot be converted to {expected}")]
    TypeCoercion {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("Value {value} for `{field}` is out of range: {reason}")]
    OutOfRange {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("{message}")]
    InvalidCombination {
        field: &'static str,
        message: &'static str,
    },
}

impl ValidationError {
    /// Name of the request field the error is reported under
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingField { field }
            | ValidationError::TypeCoercion { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::InvalidCombination { field, .. } => field,
        }
    }
}

/// Every constraint a request violated, in field order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field() == field)
    }

    /// Field-keyed messages for the client error payload
    pub fn field_messages(&self) -> BTreeMap<String, String> {
        let mut messages: BTreeMap<String, String> = BTreeMap::new();
        for error in &self.0 {
            messages
                .entry(error.field().to_string())
                .and_modify(|m| {
                    m.push_str("; ");
                    m.push_str(&error.to_string());
                })
                .or_insert_with(|| error.to_string());
        }
        messages
    }

    /// `Ok(value)` when nothing was recorded
    pub fn into_result<T>(self, value: T) -> std::result::Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self(vec![error])
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Failures raised while tokenizing, generating or decoding
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Tokenization failed: {0}")]
    Tokenization(String),

    #[error("Model error: {0}")]
    Candle(#[source] candle_core::Error),

    #[error("Decoding failed: {0}")]
    Decoding(String),

    #[error("Generation worker failed: {0}")]
    Worker(String),
}

impl From<candle_core::Error> for InferenceError {
    /// Captured backtraces are dropped; the message reaches clients.
    fn from(error: candle_core::Error) -> Self {
        let mut error = error;
        while let candle_core::Error::WithBacktrace { inner, .. } = error {
            error = *inner;
        }
        InferenceError::Candle(error)
    }
}

/// Startup failures while resolving and loading a model
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid model config {path}: {source}")]
    ModelConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to load tokenizer {path}: {message}")]
    Tokenizer { path: PathBuf, message: String },

    #[error("Failed to fetch {file} from the hub: {message}")]
    Hub { file: String, message: String },

    #[error("Failed to load model weights: {0}")]
    Weights(#[from] candle_core::Error),

    #[error("Invalid model configuration for {parameter}: {message}")]
    Configuration { parameter: String, message: String },

    #[error("Model loading task failed: {0}")]
    Task(String),
}

/// Errors raised while reading the service configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Configuration error for {parameter}: {message}")]
    Invalid { parameter: String, message: String },
}
