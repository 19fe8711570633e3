//! streamfind-embed
//!
//! Embedding providers behind `streamfind_core::traits::Embedder`: a local
//! sentence-transformer model run with candle, and a hashed fake that keeps
//! tests and development model-free.
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use streamfind_core::config::EmbedSettings;
use streamfind_core::traits::Embedder;

pub mod device;
pub mod fake;
pub mod model;
pub mod pool;
pub mod tokenize;

pub use fake::FakeEmbedder;
pub use model::SentenceEmbedder;
pub use pool::masked_mean_l2;

/// Pick the embedder for this process. `APP_USE_FAKE_EMBEDDINGS=1` or
/// `embed.use_fake` selects the fake; otherwise the local model is loaded.
pub fn get_default_embedder(settings: &EmbedSettings) -> Result<Arc<dyn Embedder>> {
    let env_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false);
    if settings.use_fake || env_fake {
        info!(dim = settings.fake_dim, "using FakeEmbedder");
        return Ok(Arc::new(FakeEmbedder::new(settings.fake_dim)));
    }
    let dir = model::resolve_model_dir(settings.model_dir.as_deref())?;
    Ok(Arc::new(SentenceEmbedder::load(&dir, settings.max_len)?))
}
