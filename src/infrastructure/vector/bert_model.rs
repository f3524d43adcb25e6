//! BERT sentence-embedding model using candle-transformers
//!
//! Follows the sentence-transformers pipeline:
//! 1. Tokenize with padding and truncation to the model's max_seq_length
//! 2. BERT forward pass to get token embeddings
//! 3. Mean pooling weighted by attention mask
//! 4. L2 normalization to unit vectors
//!
//! Weights, tokenizer and config are fetched from the HuggingFace Hub and
//! cached under `~/.cache/huggingface/hub/`.

use crate::domain::errors::{RagError, RagResult};
use crate::domain::ports::EmbeddingModel;
use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokenizers::{
    PaddingDirection, PaddingParams, PaddingStrategy, Tokenizer, TruncationDirection,
    TruncationParams, TruncationStrategy,
};

/// Default sentence-transformers repository.
pub const DEFAULT_MODEL_REPO: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Subset of `sentence_bert_config.json` we read.
#[derive(Debug, Deserialize)]
struct SentenceBertConfig {
    max_seq_length: usize,
}

/// Loaded model state shared with blocking inference tasks.
struct BertPipeline {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    max_seq_length: usize,
}

/// Local BERT embedding model.
pub struct BertEmbeddingModel {
    pipeline: Arc<BertPipeline>,
    repo_id: String,
    dimensions: usize,
    max_input_tokens: usize,
}

impl std::fmt::Debug for BertEmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BertEmbeddingModel")
            .field("repo_id", &self.repo_id)
            .field("dimensions", &self.dimensions)
            .field("max_input_tokens", &self.max_input_tokens)
            .finish_non_exhaustive()
    }
}

impl BertEmbeddingModel {
    /// Load `repo_id` from the HuggingFace Hub, downloading on first use.
    ///
    /// `max_input_tokens` overrides the limit advertised by the model; it is
    /// never allowed to exceed the model's position embeddings.
    ///
    /// Blocking: call from `spawn_blocking` inside async code.
    pub fn load(repo_id: &str, max_input_tokens: Option<usize>) -> RagResult<Self> {
        let device = select_device();
        tracing::info!(model = repo_id, device = ?device, "loading BERT embedding model");

        let api = hf_hub::api::sync::Api::new()
            .map_err(|e| load_error("initialize HuggingFace API", e))?;
        let repo = api.model(repo_id.to_string());

        let fetch = |file: &str| -> RagResult<PathBuf> {
            repo.get(file)
                .map_err(|e| load_error(&format!("download {file}"), e))
        };

        let tokenizer_path = fetch("tokenizer.json")?;
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| load_error("load tokenizer", e))?;

        let config_file = std::fs::File::open(fetch("config.json")?)?;
        let config: Config = serde_json::from_reader(config_file)?;

        // Optional; absent for plain BERT checkpoints.
        let advertised = repo
            .get("sentence_bert_config.json")
            .ok()
            .and_then(|path| std::fs::read_to_string(path).ok())
            .and_then(|raw| serde_json::from_str::<SentenceBertConfig>(&raw).ok())
            .map(|c| c.max_seq_length);

        let max_seq_length = resolve_max_seq_length(
            config.max_position_embeddings,
            advertised,
            max_input_tokens,
        );

        let weights_path = fetch("model.safetensors")?;

        // SAFETY: the safetensors file is owned by the local HF cache and is not
        // modified while mapped.
        #[allow(unsafe_code)]
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)
                .map_err(|e| load_error("map model weights", e))?
        };

        let model = BertModel::load(vb, &config).map_err(|e| load_error("build BERT model", e))?;

        tracing::info!(
            model = repo_id,
            dimensions = config.hidden_size,
            layers = config.num_hidden_layers,
            max_seq_length,
            "BERT embedding model ready"
        );

        Ok(Self {
            pipeline: Arc::new(BertPipeline {
                model,
                tokenizer,
                device,
                max_seq_length,
            }),
            repo_id: repo_id.to_string(),
            dimensions: config.hidden_size,
            max_input_tokens: max_seq_length,
        })
    }
}

fn load_error(what: &str, err: impl std::fmt::Display) -> RagError {
    RagError::Collaborator(format!("Failed to {what}: {err}"))
}

fn inference_error(err: candle_core::Error) -> RagError {
    RagError::Collaborator(format!("BERT inference failed: {err}"))
}

/// The limit the model is run with: an explicit override, else the
/// sentence-transformers setting, else the position embedding count, never
/// above the position embedding count.
fn resolve_max_seq_length(
    position_embeddings: usize,
    advertised: Option<usize>,
    requested: Option<usize>,
) -> usize {
    requested
        .or(advertised)
        .unwrap_or(position_embeddings)
        .clamp(1, position_embeddings.max(1))
}

/// CUDA, then Metal, then CPU.
fn select_device() -> Device {
    if candle_core::utils::cuda_is_available() {
        match Device::new_cuda(0) {
            Ok(device) => return device,
            Err(e) => tracing::warn!("CUDA available but initialization failed: {e}. Falling back to CPU"),
        }
    }

    if candle_core::utils::metal_is_available() {
        match Device::new_metal(0) {
            Ok(device) => return device,
            Err(e) => tracing::warn!("Metal available but initialization failed: {e}. Falling back to CPU"),
        }
    }

    Device::Cpu
}

impl BertPipeline {
    fn embed_batch_sync(&self, texts: &[String]) -> RagResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let (input_ids, attention_mask) = self.tokenize(texts)?;
        let token_type_ids = input_ids.zeros_like().map_err(inference_error)?;

        let hidden_states = self
            .model
            .forward(&input_ids, &token_type_ids, None)
            .map_err(inference_error)?;

        let pooled = mean_pool(&hidden_states, &attention_mask).map_err(inference_error)?;
        let normalized = normalize_l2(&pooled).map_err(inference_error)?;

        normalized
            .to_dtype(DType::F32)
            .and_then(|t| t.to_vec2::<f32>())
            .map_err(inference_error)
    }

    /// Token ids and attention mask, padded to the batch's longest sequence.
    fn tokenize(&self, texts: &[String]) -> RagResult<(Tensor, Tensor)> {
        let mut tokenizer = self.tokenizer.clone();

        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            direction: PaddingDirection::Right,
            pad_to_multiple_of: None,
            pad_id: 0,
            pad_type_id: 0,
            pad_token: "[PAD]".to_string(),
        }));

        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: self.max_seq_length,
                strategy: TruncationStrategy::LongestFirst,
                stride: 0,
                direction: TruncationDirection::Right,
            }))
            .map_err(|e| RagError::InvalidInput(format!("tokenizer truncation: {e}")))?;

        let encodings = tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| RagError::InvalidInput(format!("tokenizer rejected input: {e}")))?;

        let batch_size = encodings.len();
        let seq_len = encodings.first().map_or(0, |e| e.get_ids().len());

        let ids: Vec<u32> = encodings
            .iter()
            .flat_map(|e| e.get_ids().iter().copied())
            .collect();
        let mask: Vec<u32> = encodings
            .iter()
            .flat_map(|e| e.get_attention_mask().iter().copied())
            .collect();

        if ids.len() != batch_size * seq_len {
            return Err(RagError::InvalidInput(
                "tokenizer produced ragged batch despite padding".to_string(),
            ));
        }

        let input_ids =
            Tensor::from_vec(ids, (batch_size, seq_len), &self.device).map_err(inference_error)?;
        let attention_mask = Tensor::from_vec(mask, (batch_size, seq_len), &self.device)
            .and_then(|t| t.to_dtype(DType::F32))
            .map_err(inference_error)?;

        Ok((input_ids, attention_mask))
    }
}

/// Mean of token embeddings, ignoring padding.
///
/// `hidden_states` is `[batch, seq, hidden]`, `attention_mask` is `[batch, seq]`.
fn mean_pool(hidden_states: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
    let mask = attention_mask
        .unsqueeze(2)?
        .broadcast_as(hidden_states.shape())?;
    let summed = hidden_states.mul(&mask)?.sum(1)?;
    let counts = mask.sum(1)?.clamp(1e-9, f32::MAX)?;
    summed.div(&counts)
}

/// Scale each row to unit length.
fn normalize_l2(embeddings: &Tensor) -> candle_core::Result<Tensor> {
    let norms = embeddings
        .sqr()?
        .sum_keepdim(1)?
        .sqrt()?
        .clamp(1e-12, f32::MAX)?;
    embeddings.broadcast_div(&norms)
}

#[async_trait]
impl EmbeddingModel for BertEmbeddingModel {
    async fn embed(&self, text: &str) -> RagResult<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| RagError::Collaborator("Expected 1 embedding, got 0".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> RagResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let pipeline = Arc::clone(&self.pipeline);
        let texts = texts.to_vec();

        // CPU-bound; keep it off the async workers.
        tokio::task::spawn_blocking(move || pipeline.embed_batch_sync(&texts)).await?
    }

    fn max_input_tokens(&self) -> usize {
        self.max_input_tokens
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        &self.repo_id
    }
}
