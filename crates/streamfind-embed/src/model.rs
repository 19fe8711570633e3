use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use streamfind_core::traits::Embedder;

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::tokenize::tokenize_on_device;

/// Sentence-transformer style encoder (BERT family) with mean pooling.
///
/// Expects `config.json`, `tokenizer.json` and either `model.safetensors` or
/// `pytorch_model.bin` in the model directory.
pub struct SentenceEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
    id: String,
}

impl SentenceEmbedder {
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "loading sentence embedding model");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let config_path = model_dir.join("config.json");
        let config: BertConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;
        let vb = load_weights(model_dir, &device)?;
        let model = BertModel::load(vb, &config)?;
        let dim = config.hidden_size;
        let max_len = max_len.min(config.max_position_embeddings);
        let name = model_dir.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_else(|| "model".to_string());
        info!(dim, max_len, "sentence embedding model loaded");
        Ok(Self { model, tokenizer, device, dim, max_len, id: format!("bert:{name}:d{dim}") })
    }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize_on_device(&self.tokenizer, text, self.max_len, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let v: Vec<f32> = pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1()?;
        if v.len() != self.dim { return Err(anyhow!("model produced {} dims, expected {}", v.len(), self.dim)); }
        let elapsed = start.elapsed().as_millis();
        if elapsed > 100 { warn!(elapsed_ms = elapsed as u64, "slow embedding"); } else { debug!(elapsed_ms = elapsed as u64, "embedded text"); }
        Ok(v)
    }
}

impl Embedder for SentenceEmbedder {
    fn model_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> { texts.iter().map(|t| self.embed_text(t)).collect() }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        // SAFETY: the weights file is not modified while the model is alive.
        return Ok(unsafe { VarBuilder::from_mmaped_safetensors(&[safetensors], DType::F32, device)? });
    }
    let pth = model_dir.join("pytorch_model.bin");
    let weights = candle_core::pickle::read_all(&pth)?;
    let weights_map: HashMap<String, Tensor> = weights.into_iter().collect();
    Ok(VarBuilder::from_tensors(weights_map, DType::F32, device))
}

/// `APP_MODEL_DIR`, then `MODEL_DIR`, then the configured directory, then `models/all-MiniLM-L6-v2`.
pub fn resolve_model_dir(configured: Option<&str>) -> Result<PathBuf> {
    let candidates = [
        std::env::var("APP_MODEL_DIR").ok(),
        std::env::var("MODEL_DIR").ok(),
        configured.map(|s| streamfind_core::config::expand_path(s).to_string_lossy().to_string()),
        Some("models/all-MiniLM-L6-v2".to_string()),
    ];
    for dir in candidates.into_iter().flatten() {
        let p = PathBuf::from(&dir);
        if p.exists() { info!(dir = %p.display(), "using model dir"); return Ok(p); }
    }
    Err(anyhow!("Could not locate sentence embedding model directory"))
}
