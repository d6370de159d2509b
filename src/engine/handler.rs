use std::collections::BTreeMap;
use std::sync::Arc;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, info};

use crate::error::{InferenceError, ValidationErrors};
use crate::model::ModelHandle;
use crate::prompt::build_prompt;
use crate::types::{InferenceResult, TaskKind};
use crate::validation::RequestValidator;

/// Successful generation payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub status_code: u16,
    pub generated_sequence: Vec<String>,
    pub tokenizer_warning: Option<String>,
}

/// Client error payload: a plain message, or one message per request field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: ErrorMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorMessage {
    Text(String),
    Fields(BTreeMap<String, String>),
}

impl From<InferenceResult> for GenerationResponse {
    fn from(result: InferenceResult) -> Self {
        Self {
            status_code: StatusCode::OK.as_u16(),
            generated_sequence: result.sequences,
            tokenizer_warning: result.truncation_warning,
        }
    }
}

impl ErrorResponse {
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: ErrorMessage::Text(message.into()),
        }
    }
}

impl From<&ValidationErrors> for ErrorResponse {
    fn from(errors: &ValidationErrors) -> Self {
        Self {
            message: ErrorMessage::Fields(errors.field_messages()),
        }
    }
}

impl From<&InferenceError> for ErrorResponse {
    fn from(error: &InferenceError) -> Self {
        Self::text(error.to_string())
    }
}

/// Validates, prompts and runs one task model.
///
/// `handle` blocks for the duration of generation and must run on a blocking
/// thread.
pub struct TaskHandler {
    task: TaskKind,
    model: Arc<ModelHandle>,
    validator: RequestValidator,
}

impl TaskHandler {
    pub fn new(model: Arc<ModelHandle>, validator: RequestValidator) -> Self {
        Self {
            task: model.task(),
            model,
            validator,
        }
    }

    pub fn task(&self) -> TaskKind {
        self.task
    }

    pub fn max_input_length(&self) -> usize {
        self.model.tokenizer().max_input_length()
    }

    /// Run a raw request body through validation and generation
    pub fn handle(&self, body: &[u8]) -> (StatusCode, Value) {
        let raw = match parse_object(body) {
            Ok(raw) => raw,
            Err(message) => {
                debug!(task = %self.task, reason = %message, "Rejected request body");
                return bad_request(&ErrorResponse::text(message));
            }
        };

        let request = match self.validator.validate(&raw, self.task) {
            Ok(request) => request,
            Err(errors) => {
                info!(
                    task = %self.task,
                    errors = errors.len(),
                    "Request failed validation"
                );
                return bad_request(&ErrorResponse::from(&errors));
            }
        };

        let prompt = build_prompt(&request.task);
        debug!(task = %self.task, prompt_chars = prompt.len(), "Prompt built");

        match self.model.generate(&prompt, &request.config) {
            Ok(result) => respond(StatusCode::OK, &GenerationResponse::from(result)),
            Err(e) => {
                error!(task = %self.task, error = %e, "Generation failed");
                self.failure(&e)
            }
        }
    }

    /// Response for a request whose generation never completed
    pub fn failure(&self, error: &InferenceError) -> (StatusCode, Value) {
        bad_request(&ErrorResponse::from(error))
    }
}

fn parse_object(body: &[u8]) -> Result<Map<String, Value>, String> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("Request body must be a JSON object".to_string()),
        Err(e) => Err(format!("Request body is not valid JSON: {}", e)),
    }
}

fn bad_request(response: &ErrorResponse) -> (StatusCode, Value) {
    respond(StatusCode::BAD_REQUEST, response)
}

fn respond<T: Serialize>(status: StatusCode, payload: &T) -> (StatusCode, Value) {
    match serde_json::to_value(payload) {
        Ok(value) => (status, value),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::json!({ "message": e.to_string() }),
        ),
    }
}
