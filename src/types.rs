//! Common type definitions used throughout the engine

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationErrors};

pub const DEFAULT_NUM_RETURN_SEQUENCES: usize = 1;
pub const DEFAULT_TEMPERATURE: f64 = 1.0;
pub const DEFAULT_TOP_K: usize = 50;
pub const DEFAULT_DO_SAMPLE: bool = false;

/// The two fine-tuned task variants served
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Sql,
    Summary,
}

impl TaskKind {
    /// Request fields that must be present for this task
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            TaskKind::Sql => &["sql_table", "question"],
            TaskKind::Summary => &["text"],
        }
    }

    pub fn default_max_new_tokens(self) -> usize {
        match self {
            TaskKind::Sql => 200,
            TaskKind::Summary => 512,
        }
    }

    /// Short name used in logs and the health payload
    pub fn name(self) -> &'static str {
        match self {
            TaskKind::Sql => "text2sql",
            TaskKind::Summary => "summary",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Structured task input, read-only once parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskRequest {
    Sql { sql_table: String, question: String },
    Summary { text: String },
}

impl TaskRequest {
    pub fn kind(&self) -> TaskKind {
        match self {
            TaskRequest::Sql { .. } => TaskKind::Sql,
            TaskRequest::Summary { .. } => TaskKind::Summary,
        }
    }
}

/// Generation parameters for a single request.
///
/// Only constructible through [`GenerationConfig::new`], which enforces the
/// bounds and the rule that several return sequences need sampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationConfig {
    temperature: f64,
    top_k: usize,
    do_sample: bool,
    num_return_sequences: usize,
    max_new_tokens: usize,
}

impl GenerationConfig {
    pub fn new(
        temperature: f64,
        top_k: usize,
        do_sample: bool,
        num_return_sequences: usize,
        max_new_tokens: usize,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = check_temperature(temperature) {
            errors.push(e);
        }
        for (field, value) in [
            ("top_k", top_k),
            ("num_return_sequences", num_return_sequences),
            ("max_new_tokens", max_new_tokens),
        ] {
            if value == 0 {
                errors.push(ValidationError::OutOfRange {
                    field,
                    value: value.to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        if let Err(e) = check_sampling_combination(num_return_sequences, do_sample) {
            errors.push(e);
        }

        errors.into_result(Self {
            temperature,
            top_k,
            do_sample,
            num_return_sequences,
            max_new_tokens,
        })
    }

    /// Defaults applied when a request sets no optional field
    pub fn task_default(task: TaskKind) -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            top_k: DEFAULT_TOP_K,
            do_sample: DEFAULT_DO_SAMPLE,
            num_return_sequences: DEFAULT_NUM_RETURN_SEQUENCES,
            max_new_tokens: task.default_max_new_tokens(),
        }
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn do_sample(&self) -> bool {
        self.do_sample
    }

    pub fn num_return_sequences(&self) -> usize {
        self.num_return_sequences
    }

    pub fn max_new_tokens(&self) -> usize {
        self.max_new_tokens
    }
}

pub(crate) fn check_temperature(value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ValidationError::OutOfRange {
            field: "temperature",
            value: value.to_string(),
            reason: "must be a finite number greater than 0".to_string(),
        })
    }
}

pub(crate) fn check_at_least_one(field: &'static str, value: i64) -> Result<usize, ValidationError> {
    if value >= 1 {
        Ok(value as usize)
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value: value.to_string(),
            reason: "must be at least 1".to_string(),
        })
    }
}

pub(crate) fn check_sampling_combination(
    num_return_sequences: usize,
    do_sample: bool,
) -> Result<(), ValidationError> {
    if num_return_sequences > 1 && !do_sample {
        Err(ValidationError::InvalidCombination {
            field: "num_return_sequences",
            message: "num_return_sequences>1 requires do_sample=true",
        })
    } else {
        Ok(())
    }
}

/// Output of one inference call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceResult {
    /// Decoded sequences in generation order
    pub sequences: Vec<String>,
    /// Set when the prompt was cut to the model's input length
    pub truncation_warning: Option<String>,
}
