//! Request field validation.
//!
//! Turns the raw JSON field map of a request into a [`ValidatedRequest`].
//! Every failing field is collected so the client receives one error payload
//! listing all problems.

use serde_json::{Map, Value};

use crate::config::LimitsConfig;
use crate::error::{ValidationError, ValidationErrors};
use crate::types::{
    check_at_least_one, check_sampling_combination, check_temperature, GenerationConfig,
    TaskKind, TaskRequest, DEFAULT_DO_SAMPLE, DEFAULT_NUM_RETURN_SEQUENCES, DEFAULT_TEMPERATURE,
    DEFAULT_TOP_K,
};

/// A request that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub task: TaskRequest,
    pub config: GenerationConfig,
}

/// Validates raw request fields against the service limits
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestValidator {
    limits: LimitsConfig,
}

impl RequestValidator {
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    pub fn validate(
        &self,
        raw: &Map<String, Value>,
        task: TaskKind,
    ) -> Result<ValidatedRequest, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let request = match task {
            TaskKind::Sql => {
                let sql_table = required_text(raw, "sql_table", &mut errors);
                let question = required_text(raw, "question", &mut errors);
                sql_table
                    .zip(question)
                    .map(|(sql_table, question)| TaskRequest::Sql {
                        sql_table,
                        question,
                    })
            }
            TaskKind::Summary => {
                required_text(raw, "text", &mut errors).map(|text| TaskRequest::Summary { text })
            }
        };

        let num_return_sequences = optional_int(
            raw,
            "num_return_sequences",
            DEFAULT_NUM_RETURN_SEQUENCES as i64,
            &mut errors,
        )
        .and_then(|n| self.bounded(n, "num_return_sequences", self.limits.max_return_sequences, &mut errors));

        let temperature = optional_float(raw, "temperature", DEFAULT_TEMPERATURE, &mut errors)
            .and_then(|t| record(check_temperature(t), &mut errors));

        let top_k = optional_int(raw, "top_k", DEFAULT_TOP_K as i64, &mut errors)
            .and_then(|k| record(check_at_least_one("top_k", k), &mut errors));

        let do_sample = optional_bool(raw, "do_sample", DEFAULT_DO_SAMPLE, &mut errors);

        let max_new_tokens = optional_int(
            raw,
            "max_new_tokens",
            task.default_max_new_tokens() as i64,
            &mut errors,
        )
        .and_then(|n| self.bounded(n, "max_new_tokens", self.limits.max_new_tokens, &mut errors));

        if let (Some(n), Some(sample)) = (num_return_sequences, do_sample) {
            record(check_sampling_combination(n, sample), &mut errors);
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        match (
            request,
            temperature,
            top_k,
            do_sample,
            num_return_sequences,
            max_new_tokens,
        ) {
            (Some(task), Some(temperature), Some(top_k), Some(do_sample), Some(n), Some(max)) => {
                let config = GenerationConfig::new(temperature, top_k, do_sample, n, max)?;
                Ok(ValidatedRequest { task, config })
            }
            // Every `None` above recorded an error.
            _ => Err(errors),
        }
    }

    fn bounded(
        &self,
        value: i64,
        field: &'static str,
        limit: usize,
        errors: &mut ValidationErrors,
    ) -> Option<usize> {
        let value = record(check_at_least_one(field, value), errors)?;
        if value > limit {
            errors.push(ValidationError::OutOfRange {
                field,
                value: value.to_string(),
                reason: format!("must not exceed {limit}"),
            });
            return None;
        }
        Some(value)
    }
}

fn record<T>(result: Result<T, ValidationError>, errors: &mut ValidationErrors) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            errors.push(e);
            None
        }
    }
}

/// Present, non-null field value
fn field<'a>(raw: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    raw.get(name).filter(|v| !v.is_null())
}

fn coercion_error(field: &'static str, value: &Value, expected: &'static str) -> ValidationError {
    ValidationError::TypeCoercion {
        field,
        value: value.to_string(),
        expected,
    }
}

fn required_text(
    raw: &Map<String, Value>,
    name: &'static str,
    errors: &mut ValidationErrors,
) -> Option<String> {
    match field(raw, name) {
        None => {
            errors.push(ValidationError::MissingField { field: name });
            None
        }
        Some(Value::String(s)) if s.trim().is_empty() => {
            errors.push(ValidationError::MissingField { field: name });
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            errors.push(coercion_error(name, other, "a string"));
            None
        }
    }
}

fn optional_int(
    raw: &Map<String, Value>,
    name: &'static str,
    default: i64,
    errors: &mut ValidationErrors,
) -> Option<i64> {
    let Some(value) = field(raw, name) else {
        return Some(default);
    };
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    if parsed.is_none() {
        errors.push(coercion_error(name, value, "an integer"));
    }
    parsed
}

fn optional_float(
    raw: &Map<String, Value>,
    name: &'static str,
    default: f64,
    errors: &mut ValidationErrors,
) -> Option<f64> {
    let Some(value) = field(raw, name) else {
        return Some(default);
    };
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    if parsed.is_none() {
        errors.push(coercion_error(name, value, "a float"));
    }
    parsed
}

fn optional_bool(
    raw: &Map<String, Value>,
    name: &'static str,
    default: bool,
    errors: &mut ValidationErrors,
) -> Option<bool> {
    let Some(value) = field(raw, name) else {
        return Some(default);
    };
    let parsed = match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    };
    if parsed.is_none() {
        errors.push(coercion_error(name, value, "a boolean"));
    }
    parsed
}
