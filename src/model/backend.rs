// Location: src/model/backend.rs

use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_transformers::generation::{LogitsProcessor, Sampling};
use candle_transformers::models::t5::{self, T5ForConditionalGeneration};
use tracing::debug;

use crate::error::Result;
use crate::types::GenerationConfig;

/// Sequence-to-sequence decoder behind a [`super::ModelHandle`].
///
/// Implementations must treat their weights as read-only: one backend serves
/// concurrent requests.
pub trait Seq2SeqBackend: Send + Sync {
    /// Generate `config.num_return_sequences()` token sequences for one
    /// encoded prompt, in generation order.
    fn generate(&self, input_ids: &[u32], config: &GenerationConfig) -> Result<Vec<Vec<u32>>>;
}

/// FLAN-T5 conditional generation on candle
pub struct T5Backend {
    model: T5ForConditionalGeneration,
    device: Device,
    decoder_start_token_id: u32,
    eos_token_id: u32,
    use_cache: bool,
    seed: Option<u64>,
}

impl T5Backend {
    pub fn new(
        model: T5ForConditionalGeneration,
        config: &t5::Config,
        device: Device,
        seed: Option<u64>,
    ) -> Self {
        Self {
            model,
            device,
            decoder_start_token_id: config
                .decoder_start_token_id
                .unwrap_or(config.pad_token_id) as u32,
            eos_token_id: config.eos_token_id as u32,
            use_cache: config.use_cache,
            seed,
        }
    }

    fn sampling(config: &GenerationConfig) -> Sampling {
        if config.do_sample() {
            Sampling::TopK {
                k: config.top_k(),
                temperature: config.temperature(),
            }
        } else {
            Sampling::ArgMax
        }
    }

    /// Run the decoder until EOS or `max_new_tokens`
    fn decode_sequence(
        &self,
        model: &mut T5ForConditionalGeneration,
        encoder_output: &Tensor,
        logits_processor: &mut LogitsProcessor,
        max_new_tokens: usize,
    ) -> Result<Vec<u32>> {
        model.clear_kv_cache();
        let mut output_ids = vec![self.decoder_start_token_id];

        for index in 0..max_new_tokens {
            let decoder_ids = if index == 0 || !self.use_cache {
                Tensor::new(output_ids.as_slice(), &self.device)?.unsqueeze(0)?
            } else {
                let last = output_ids[output_ids.len() - 1];
                Tensor::new(&[last], &self.device)?.unsqueeze(0)?
            };

            let logits = model
                .decode(&decoder_ids, encoder_output)?
                .squeeze(0)?
                .to_dtype(DType::F32)?;
            let next_token = logits_processor.sample(&logits)?;
            if next_token == self.eos_token_id {
                break;
            }
            output_ids.push(next_token);
        }

        // Drop the decoder start token
        output_ids.remove(0);
        Ok(output_ids)
    }
}

impl Seq2SeqBackend for T5Backend {
    fn generate(&self, input_ids: &[u32], config: &GenerationConfig) -> Result<Vec<Vec<u32>>> {
        let start = Instant::now();

        // Tensors are reference counted; the clone only gets its own KV cache.
        let mut model = self.model.clone();
        model.clear_kv_cache();

        let input = Tensor::new(input_ids, &self.device)?.unsqueeze(0)?;
        let encoder_output = model.encode(&input)?;

        let sampling = Self::sampling(config);
        let seed = self.seed.unwrap_or_else(rand::random);

        let mut sequences = Vec::with_capacity(config.num_return_sequences());
        for i in 0..config.num_return_sequences() {
            let mut logits_processor =
                LogitsProcessor::from_sampling(seed.wrapping_add(i as u64), sampling.clone());
            let ids = self.decode_sequence(
                &mut model,
                &encoder_output,
                &mut logits_processor,
                config.max_new_tokens(),
            )?;
            debug!(sequence = i, tokens = ids.len(), "Decoded sequence");
            sequences.push(ids);
        }

        debug!(
            input_tokens = input_ids.len(),
            sequences = sequences.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "T5 generation finished"
        );
        Ok(sequences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_nn::VarBuilder;

    fn tiny_config() -> t5::Config {
        serde_json::from_value(serde_json::json!({
            "vocab_size": 32,
            "d_model": 8,
            "d_kv": 4,
            "d_ff": 16,
            "num_layers": 1,
            "num_decoder_layers": 1,
            "num_heads": 2,
            "relative_attention_num_buckets": 8,
            "relative_attention_max_distance": 16,
            "dropout_rate": 0.0,
            "layer_norm_epsilon": 1e-6,
            "initializer_factor": 1.0,
            "feed_forward_proj": "relu",
            "tie_word_embeddings": true,
            "is_decoder": false,
            "is_encoder_decoder": true,
            "use_cache": true,
            "pad_token_id": 0,
            "eos_token_id": 1,
            "decoder_start_token_id": 0
        }))
        .unwrap()
    }

    fn zero_backend(seed: Option<u64>) -> T5Backend {
        let device = Device::Cpu;
        let config = tiny_config();
        let vb = VarBuilder::zeros(DType::F32, &device);
        let model = T5ForConditionalGeneration::load(vb, &config).unwrap();
        T5Backend::new(model, &config, device, seed)
    }

    #[test]
    fn test_greedy_generation_is_deterministic() {
        let backend = zero_backend(None);
        let config = GenerationConfig::new(1.0, 50, false, 1, 5).unwrap();

        let first = backend.generate(&[3, 4, 5, 1], &config).unwrap();
        let second = backend.generate(&[3, 4, 5, 1], &config).unwrap();

        assert_eq!(first.len(), 1);
        // Zero weights give flat logits; argmax never hits EOS.
        assert_eq!(first[0].len(), 5);
        assert_eq!(first, second);
    }

    #[test]
    fn test_sampling_returns_requested_sequences() {
        let backend = zero_backend(Some(7));
        let config = GenerationConfig::new(0.8, 4, true, 3, 4).unwrap();

        let sequences = backend.generate(&[3, 4, 1], &config).unwrap();
        assert_eq!(sequences.len(), 3);
        for ids in &sequences {
            assert!(ids.len() <= 4);
            assert!(ids.iter().all(|id| *id < 32 && *id != 1));
        }

        // A fixed seed makes sampling reproducible
        assert_eq!(sequences, backend.generate(&[3, 4, 1], &config).unwrap());
    }

    #[test]
    fn test_sampling_mode_selection() {
        let greedy = GenerationConfig::new(0.5, 10, false, 1, 8).unwrap();
        assert!(matches!(T5Backend::sampling(&greedy), Sampling::ArgMax));

        let sampled = GenerationConfig::new(0.5, 10, true, 2, 8).unwrap();
        match T5Backend::sampling(&sampled) {
            Sampling::TopK { k, temperature } => {
                assert_eq!(k, 10);
                assert_eq!(temperature, 0.5);
            }
            _ => panic!("expected top-k sampling"),
        }
    }
}
