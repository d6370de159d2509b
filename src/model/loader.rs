use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use candle_transformers::models::t5::{self, T5ForConditionalGeneration};
use hf_hub::api::sync::ApiBuilder;
use hf_hub::{Repo, RepoType};
use tracing::{info, warn};

use super::backend::T5Backend;
use super::handle::ModelHandle;
use super::tokenizer::TaskTokenizer;
use crate::config::ModelConfig;
use crate::error::LoadError;
use crate::types::TaskKind;

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";

/// Files needed to build one task model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFiles {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: Vec<PathBuf>,
}

/// Resolve model files from a local directory, or download them from the hub.
pub fn resolve_model_files(config: &ModelConfig) -> Result<ModelFiles, LoadError> {
    match (&config.model_dir, &config.repo_id) {
        (Some(dir), _) => local_files(dir, &config.weight_files),
        (None, Some(repo_id)) => hub_files(repo_id, &config.revision, &config.weight_files),
        (None, None) => Err(LoadError::Configuration {
            parameter: "model_dir".to_string(),
            message: "Either model_dir or repo_id must be set".to_string(),
        }),
    }
}

fn local_files(dir: &Path, weight_files: &[String]) -> Result<ModelFiles, LoadError> {
    let existing = |name: &str| -> Result<PathBuf, LoadError> {
        let path = dir.join(name);
        std::fs::metadata(&path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    };

    Ok(ModelFiles {
        config: existing(CONFIG_FILE)?,
        tokenizer: existing(TOKENIZER_FILE)?,
        weights: weight_files
            .iter()
            .map(|name| existing(name.as_str()))
            .collect::<Result<Vec<_>, _>>()?,
    })
}

fn hub_files(repo_id: &str, revision: &str, weight_files: &[String]) -> Result<ModelFiles, LoadError> {
    let api = ApiBuilder::new()
        .with_progress(false)
        .build()
        .map_err(|e| LoadError::Hub {
            file: repo_id.to_string(),
            message: e.to_string(),
        })?;
    let repo = api.repo(Repo::with_revision(
        repo_id.to_string(),
        RepoType::Model,
        revision.to_string(),
    ));

    let fetch = |file: &str| {
        info!(repo_id, revision, file, "Fetching model file");
        repo.get(file).map_err(|e| LoadError::Hub {
            file: file.to_string(),
            message: e.to_string(),
        })
    };

    Ok(ModelFiles {
        config: fetch(CONFIG_FILE)?,
        tokenizer: fetch(TOKENIZER_FILE)?,
        weights: weight_files
            .iter()
            .map(|name| fetch(name.as_str()))
            .collect::<Result<Vec<_>, _>>()?,
    })
}

/// CUDA device when compiled in and present, CPU otherwise
pub fn select_device(device_id: usize) -> Result<Device, LoadError> {
    let device = Device::cuda_if_available(device_id)?;
    if device.is_cpu() {
        if cfg!(feature = "cuda") {
            warn!(device_id, "CUDA device unavailable, running on CPU");
        } else {
            info!("Running on CPU");
        }
    } else {
        info!(device_id, "Running on CUDA device");
    }
    Ok(device)
}

pub fn parse_dtype(dtype: &str) -> Result<DType, LoadError> {
    match dtype {
        "f32" => Ok(DType::F32),
        "bf16" => Ok(DType::BF16),
        "f16" => Ok(DType::F16),
        other => Err(LoadError::Configuration {
            parameter: "dtype".to_string(),
            message: format!("Unsupported dtype {}", other),
        }),
    }
}

fn read_t5_config(path: &Path) -> Result<t5::Config, LoadError> {
    let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| LoadError::ModelConfig {
        path: path.to_path_buf(),
        source,
    })
}

/// Load one task model. Blocking: call from a blocking thread.
pub fn load_model_handle(task: TaskKind, config: &ModelConfig) -> Result<ModelHandle, LoadError> {
    let start = Instant::now();

    let files = resolve_model_files(config)?;
    let device = select_device(config.device_id)?;
    let dtype = parse_dtype(&config.dtype)?;

    let t5_config = read_t5_config(&files.config)?;
    let tokenizer = TaskTokenizer::from_file(&files.tokenizer, config.max_input_length)?;

    // SAFETY: the weight files are not modified while mapped
    let vb = unsafe { VarBuilder::from_mmaped_safetensors(&files.weights, dtype, &device)? };
    let model = T5ForConditionalGeneration::load(vb, &t5_config)?;
    let backend = T5Backend::new(model, &t5_config, device, config.seed);

    info!(
        task = %task,
        vocab_size = tokenizer.vocab_size(),
        max_input_length = config.max_input_length,
        dtype = %config.dtype,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Model loaded"
    );

    Ok(ModelHandle::new(task, tokenizer, backend))
}
