// Location: src/model/handle.rs

use std::time::Instant;

use tracing::{info, warn};

use super::backend::Seq2SeqBackend;
use super::tokenizer::TaskTokenizer;
use crate::error::{InferenceError, Result};
use crate::types::{GenerationConfig, InferenceResult, TaskKind};

/// A loaded task model: tokenizer plus decoder, shared read-only across requests
pub struct ModelHandle {
    task: TaskKind,
    tokenizer: TaskTokenizer,
    backend: Box<dyn Seq2SeqBackend>,
}

impl ModelHandle {
    pub fn new(
        task: TaskKind,
        tokenizer: TaskTokenizer,
        backend: impl Seq2SeqBackend + 'static,
    ) -> Self {
        Self {
            task,
            tokenizer,
            backend: Box::new(backend),
        }
    }

    pub fn task(&self) -> TaskKind {
        self.task
    }

    pub fn tokenizer(&self) -> &TaskTokenizer {
        &self.tokenizer
    }

    /// Tokenize `prompt`, generate and decode every requested sequence.
    ///
    /// Over-long prompts are truncated to the model's input length and the
    /// result carries a warning instead of failing.
    pub fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<InferenceResult> {
        let start = Instant::now();
        let encoded = self.tokenizer.encode(prompt)?;

        let truncation_warning = if encoded.truncated {
            let max_input_length = self.tokenizer.max_input_length();
            warn!(
                task = %self.task,
                max_input_length,
                "Prompt truncated to the model input length"
            );
            Some(truncation_message(max_input_length))
        } else {
            None
        };

        let input_ids = encoded.attended_ids();
        let generated = self.backend.generate(&input_ids, config)?;
        if generated.len() != config.num_return_sequences() {
            return Err(InferenceError::Decoding(format!(
                "expected {} sequences, model produced {}",
                config.num_return_sequences(),
                generated.len()
            )));
        }

        let sequences = self.tokenizer.decode_batch(&generated)?;

        info!(
            task = %self.task,
            input_tokens = input_ids.len(),
            sequences = sequences.len(),
            do_sample = config.do_sample(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Generation completed"
        );

        Ok(InferenceResult {
            sequences,
            truncation_warning,
        })
    }
}

pub(crate) fn truncation_message(max_input_length: usize) -> String {
    format!(
        "Input exceeded the model's maximum input length of {} tokens and was truncated.",
        max_input_length
    )
}
