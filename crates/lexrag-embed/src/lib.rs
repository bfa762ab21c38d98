//! lexrag-embed
//!
//! Sentence embeddings for chunks and queries. [`SentenceEmbedder`] runs a
//! BERT-family sentence-transformer with candle (masked mean pooling, optional
//! L2 normalization). [`HashEmbedder`] is a deterministic bag-of-tokens
//! stand-in used in tests and offline development.

pub mod device;
pub mod pool;
pub mod tokenize;

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use lexrag_core::config::{expand_path, EmbeddingSettings};
use lexrag_core::traits::Embedder;
use lexrag_core::{Error, Result};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};
use twox_hash::XxHash64;

pub use device::select_device;
pub use pool::{l2_normalize, masked_mean, masked_mean_l2};
use tokenize::{tokenize_batch, to_embedding_error};

pub struct SentenceEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
    batch_size: usize,
    pad_id: u32,
}

impl SentenceEmbedder {
    /// Load `tokenizer.json`, `config.json` and the weights
    /// (`model.safetensors` or `pytorch_model.bin`) from `model_dir`.
    pub fn load(model_dir: &Path, max_len: usize, batch_size: usize) -> Result<Self> {
        let device = select_device();
        info!(model_dir = %model_dir.display(), "loading sentence embedding model");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            Error::Embedding(format!("Failed to load tokenizer from {}: {e}", tokenizer_path.display()))
        })?;
        let config_path = model_dir.join("config.json");
        let config: BertConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;
        let weights = load_weights(model_dir, &device)?;
        let vb = VarBuilder::from_tensors(weights, DTYPE, &device);
        let model = BertModel::load(vb, &config).map_err(to_embedding_error)?;
        let pad_id = tokenizer
            .get_padding()
            .map(|p| p.pad_id)
            .or_else(|| tokenizer.token_to_id("<pad>"))
            .or_else(|| tokenizer.token_to_id("[PAD]"))
            .unwrap_or(0);

        let mut embedder = Self { model, tokenizer, device, dim: 0, max_len: max_len.max(8), batch_size: batch_size.max(1), pad_id };
        // The output width is a property of the checkpoint; probe it once.
        let probe = embedder.forward_batch(&["dimension probe".to_string()], true)?;
        embedder.dim = probe.first().map(Vec::len).unwrap_or(0);
        if embedder.dim == 0 {
            return Err(Error::Embedding("model produced empty embeddings".into()));
        }
        info!(dim = embedder.dim, "sentence embedding model loaded");
        Ok(embedder)
    }

    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self> {
        let model_dir = resolve_model_dir(settings)?;
        Self::load(&model_dir, settings.max_len, settings.batch_size)
    }

    fn forward_batch(&self, texts: &[String], normalize: bool) -> Result<Vec<Vec<f32>>> {
        let (input_ids, attention_mask) =
            tokenize_batch(&self.tokenizer, texts, self.max_len, self.pad_id, &self.device)?;
        let token_type_ids = input_ids.zeros_like().map_err(to_embedding_error)?;
        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .map_err(to_embedding_error)?;
        let pooled = if normalize {
            masked_mean_l2(&hidden, &attention_mask)
        } else {
            masked_mean(&hidden, &attention_mask)
        }
        .map_err(to_embedding_error)?;
        pooled
            .to_device(&Device::Cpu)
            .and_then(|t| t.to_dtype(DType::F32))
            .and_then(|t| t.to_vec2::<f32>())
            .map_err(to_embedding_error)
    }
}

impl Embedder for SentenceEmbedder {
    fn dim(&self) -> usize { self.dim }

    fn encode(&self, texts: &[String], normalize: bool) -> Result<Vec<Vec<f32>>> {
        let start = Instant::now();
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            out.extend(self.forward_batch(batch, normalize)?);
        }
        debug!(texts = texts.len(), elapsed_ms = start.elapsed().as_millis() as u64, "encoded batch");
        Ok(out)
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        return candle_core::safetensors::load(&safetensors, device).map_err(to_embedding_error);
    }
    let pickle = model_dir.join("pytorch_model.bin");
    if pickle.exists() {
        let weights = candle_core::pickle::read_all(&pickle).map_err(to_embedding_error)?;
        return Ok(weights.into_iter().collect());
    }
    Err(Error::NotFound(format!("no model weights under {}", model_dir.display())))
}

/// Deterministic bag-of-tokens embedder: each lowercased word is hashed into a
/// bucket. Texts sharing words get a positive inner product.
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    fn embed_one(&self, text: &str, normalize: bool) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        let lowered = text.to_lowercase();
        let tokens = lowered.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty());
        for (i, token) in tokens.enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        if normalize {
            let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
            for x in &mut v { *x /= norm; }
        }
        v
    }
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize { self.dim }

    fn encode(&self, texts: &[String], normalize: bool) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t, normalize)).collect())
    }
}

/// Pick the embedder named by configuration. `APP_USE_FAKE_EMBEDDINGS=1`
/// forces the hashing embedder regardless of settings.
pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>> {
    let forced = std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if forced || settings.use_hash_embedder {
        warn!(dim = settings.hash_dim, "using hashing embedder; retrieval quality is lexical only");
        return Ok(Box::new(HashEmbedder::new(settings.hash_dim)));
    }
    Ok(Box::new(SentenceEmbedder::from_settings(settings)?))
}

/// Locate the model directory: `embedding.model_dir`, then `APP_MODEL_DIR`,
/// then `MODEL_DIR`, then `models/<model name>` relative to the working dir.
pub fn resolve_model_dir(settings: &EmbeddingSettings) -> Result<PathBuf> {
    let candidates = settings
        .model_dir
        .clone()
        .into_iter()
        .chain(std::env::var("APP_MODEL_DIR").ok())
        .chain(std::env::var("MODEL_DIR").ok());
    for dir in candidates {
        let p = expand_path(&dir);
        if p.exists() {
            return Ok(p);
        }
        warn!(path = %p.display(), "configured model dir does not exist");
    }
    let short_name = settings.model.rsplit('/').next().unwrap_or(&settings.model);
    let local = Path::new("models").join(short_name);
    if local.exists() {
        return Ok(local);
    }
    Err(Error::NotFound(format!("could not locate model directory for '{}'", settings.model)))
}
