#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use candle_transformers::models::t5::{self, T5ForConditionalGeneration};
use http_body_util::BodyExt;
use llm_task_engine::model::T5Backend;
use llm_task_engine::{
    create_router, AppState, GenerationConfig, HttpConfig, InferenceError, LimitsConfig,
    ModelHandle, Seq2SeqBackend, TaskEngine, TaskKind, TaskTokenizer,
};
use serde_json::{json, Value};
use tokenizers::Tokenizer;
use tower::ServiceExt;

// Same layout as the unit-test tokenizer: <pad>=0, </s>=1, <unk>=2, then
// WORDS from 3, so SELECT=18 COUNT=19 (=20 )=21 *=22 FROM=23 head=24.
const WORDS: &[&str] = &[
    "Given", "the", "SQL", "code", ".", "Generate", "to", "answer", "following", "question",
    "Answer", ":", "Summarize", "text", "Summary", "SELECT", "COUNT", "(", ")", "*", "FROM",
    "head", "one", "two", "three",
];

/// `SELECT COUNT ( * ) FROM head </s>`
pub const SQL_IDS: &[u32] = &[18, 19, 20, 22, 21, 23, 24, 1];

/// Word-level tokenizer: `<pad>`=0, `</s>`=1, `<unk>`=2, then `WORDS` in order
pub fn tokenizer(max_input_length: usize) -> TaskTokenizer {
    let mut vocab = serde_json::Map::new();
    for (id, token) in ["<pad>", "</s>", "<unk>"].iter().chain(WORDS).enumerate() {
        vocab.insert(token.to_string(), json!(id));
    }
    let special = |id: u32, content: &str| {
        json!({
            "id": id, "content": content, "single_word": false, "lstrip": false,
            "rstrip": false, "normalized": false, "special": true
        })
    };
    let config = json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [special(0, "<pad>"), special(1, "</s>"), special(2, "<unk>")],
        "normalizer": null,
        "pre_tokenizer": {"type": "Whitespace"},
        "post_processor": {
            "type": "TemplateProcessing",
            "single": [
                {"Sequence": {"id": "A", "type_id": 0}},
                {"SpecialToken": {"id": "</s>", "type_id": 0}}
            ],
            "pair": [
                {"Sequence": {"id": "A", "type_id": 0}},
                {"SpecialToken": {"id": "</s>", "type_id": 0}},
                {"Sequence": {"id": "B", "type_id": 0}},
                {"SpecialToken": {"id": "</s>", "type_id": 0}}
            ],
            "special_tokens": {
                "</s>": {"id": "</s>", "ids": [1], "tokens": ["</s>"]}
            }
        },
        "decoder": null,
        "model": {"type": "WordLevel", "vocab": vocab, "unk_token": "<unk>"}
    });

    let tokenizer = Tokenizer::from_bytes(config.to_string().as_bytes()).unwrap();
    TaskTokenizer::new(tokenizer, max_input_length).unwrap()
}

/// Returns the same canned ids for every requested sequence
pub struct CannedBackend(pub Vec<u32>);

impl Seq2SeqBackend for CannedBackend {
    fn generate(
        &self,
        _: &[u32],
        config: &GenerationConfig,
    ) -> llm_task_engine::Result<Vec<Vec<u32>>> {
        Ok(vec![self.0.clone(); config.num_return_sequences()])
    }
}

/// Echoes the encoder input back as the generated sequence
pub struct EchoBackend;

impl Seq2SeqBackend for EchoBackend {
    fn generate(
        &self,
        input_ids: &[u32],
        config: &GenerationConfig,
    ) -> llm_task_engine::Result<Vec<Vec<u32>>> {
        Ok(vec![input_ids.to_vec(); config.num_return_sequences()])
    }
}

pub struct FailingBackend;

impl Seq2SeqBackend for FailingBackend {
    fn generate(&self, _: &[u32], _: &GenerationConfig) -> llm_task_engine::Result<Vec<Vec<u32>>> {
        Err(InferenceError::Tokenization("input rejected by model".to_string()))
    }
}

/// Real candle T5 graph with all-zero weights
pub fn zero_t5_backend(seed: Option<u64>) -> T5Backend {
    let config: t5::Config = serde_json::from_value(json!({
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
    .unwrap();
    let device = Device::Cpu;
    let vb = VarBuilder::zeros(DType::F32, &device);
    let model = T5ForConditionalGeneration::load(vb, &config).unwrap();
    T5Backend::new(model, &config, device, seed)
}

pub fn router_with(sql: ModelHandle, summary: ModelHandle, http: HttpConfig) -> Router {
    let engine = TaskEngine::from_handles(sql, summary, LimitsConfig::default()).unwrap();
    create_router(AppState::new(engine, http))
}

/// Canned SQL model, echoing summary model, default routes
pub fn test_router() -> Router {
    router_with(
        ModelHandle::new(TaskKind::Sql, tokenizer(128), CannedBackend(SQL_IDS.to_vec())),
        ModelHandle::new(TaskKind::Summary, tokenizer(128), EchoBackend),
        HttpConfig::default(),
    )
}

pub fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()));
    (status, value)
}
