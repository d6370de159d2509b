// Location: src/model/tokenizer.rs

use std::path::Path;

use tokenizers::{
    PaddingDirection, PaddingParams, PaddingStrategy, Tokenizer as HfTokenizer,
    TruncationDirection, TruncationParams, TruncationStrategy,
};

use crate::error::{InferenceError, LoadError};

const PAD_TOKEN: &str = "<pad>";

/// Tokenizer configured for fixed-length encoder input.
///
/// Prompts are right-padded to `max_input_length` and truncated on the right
/// when longer, the same way the adapters saw their training inputs.
#[derive(Clone)]
pub struct TaskTokenizer {
    /// HuggingFace tokenizer with padding and truncation enabled
    tokenizer: HfTokenizer,
    max_input_length: usize,
}

/// One encoded prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPrompt {
    /// Token ids, padded to the maximum input length
    pub ids: Vec<u32>,
    /// 1 for real tokens, 0 for padding
    pub attention_mask: Vec<u32>,
    /// Whether the prompt overflowed and lost tokens
    pub truncated: bool,
}

impl EncodedPrompt {
    /// Ids the encoder actually attends to
    pub fn attended_ids(&self) -> Vec<u32> {
        self.ids
            .iter()
            .zip(&self.attention_mask)
            .filter(|(_, mask)| **mask == 1)
            .map(|(id, _)| *id)
            .collect()
    }
}

impl TaskTokenizer {
    pub fn from_file(path: impl AsRef<Path>, max_input_length: usize) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let tokenizer = HfTokenizer::from_file(path).map_err(|e| LoadError::Tokenizer {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::new(tokenizer, max_input_length)
    }

    pub fn new(mut tokenizer: HfTokenizer, max_input_length: usize) -> Result<Self, LoadError> {
        let pad_id = tokenizer.token_to_id(PAD_TOKEN).unwrap_or(0);

        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_input_length,
                strategy: TruncationStrategy::LongestFirst,
                direction: TruncationDirection::Right,
                stride: 0,
            }))
            .map_err(|e| LoadError::Configuration {
                parameter: "max_input_length".to_string(),
                message: e.to_string(),
            })?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::Fixed(max_input_length),
            direction: PaddingDirection::Right,
            pad_id,
            pad_token: PAD_TOKEN.to_string(),
            ..Default::default()
        }));

        Ok(Self {
            tokenizer,
            max_input_length,
        })
    }

    /// Encode a prompt with special tokens, padding and truncation
    pub fn encode(&self, text: &str) -> Result<EncodedPrompt, InferenceError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| InferenceError::Tokenization(e.to_string()))?;

        Ok(EncodedPrompt {
            ids: encoding.get_ids().to_vec(),
            attention_mask: encoding.get_attention_mask().to_vec(),
            truncated: !encoding.get_overflowing().is_empty(),
        })
    }

    /// Decode generated sequences, dropping special tokens
    pub fn decode_batch(&self, sequences: &[Vec<u32>]) -> Result<Vec<String>, InferenceError> {
        let sequences: Vec<&[u32]> = sequences.iter().map(Vec::as_slice).collect();
        self.tokenizer
            .decode_batch(&sequences, true)
            .map_err(|e| InferenceError::Decoding(e.to_string()))
    }

    pub fn max_input_length(&self) -> usize {
        self.max_input_length
    }

    pub fn vocab_size(&self) -> usize {
        self.tokenizer.get_vocab_size(true)
    }
}
