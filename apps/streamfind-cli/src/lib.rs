//! Shared plumbing for the `streamfind` binaries: artifact layout, startup
//! loading with validation, logging setup and result printing.
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use streamfind_core::config::{expand_path, AppConfig};
use streamfind_core::{Corpus, Error};
use streamfind_embed::get_default_embedder;
use streamfind_hybrid::{EntityResult, SearchContext};
use streamfind_latent::LatentModel;
use streamfind_text::LexicalIndex;
use streamfind_vector::store::METADATA_FILE;
use streamfind_vector::VectorIndex;

pub const LEXICAL_FILE: &str = "lexical.json";
pub const LATENT_FILE: &str = "latent.json";

/// `RUST_LOG` wins; otherwise `info`, or `debug` with `--verbose`.
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

/// Where each persisted artifact lives under the index directory.
#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }
    pub fn from_config(config: &AppConfig) -> Self { Self::new(expand_path(&config.data.index_dir)) }
    pub fn lexical(&self) -> PathBuf { self.root.join(LEXICAL_FILE) }
    pub fn latent(&self) -> PathBuf { self.root.join(LATENT_FILE) }
    pub fn vectors(&self) -> &Path { &self.root }
    pub fn has_vectors(&self) -> bool { self.root.join(METADATA_FILE).exists() }
}

pub fn load_corpus(config: &AppConfig, override_path: Option<&Path>) -> Result<Corpus> {
    let path = override_path.map_or_else(|| expand_path(&config.data.corpus_path), Path::to_path_buf);
    Ok(Corpus::load(&path)?)
}

/// Stale or mismatched artifacts stop startup; the only fix is a rebuild.
fn rebuild_hint(err: anyhow::Error) -> anyhow::Error {
    match err.downcast_ref::<Error>() {
        Some(Error::IndexMismatch(_) | Error::IndexDimensionMismatch { .. }) => {
            err.context("persisted indexes do not match the corpus or model; run `streamfind-indexer` to rebuild")
        }
        _ => err,
    }
}

/// Load every artifact present under `paths` and validate it against the
/// corpus and the serving embedder.
pub async fn load_context(config: &AppConfig, corpus: Corpus, paths: &IndexPaths) -> Result<SearchContext> {
    let lexical_path = paths.lexical();
    if !lexical_path.exists() {
        anyhow::bail!("no lexical index at {}; run `streamfind-indexer` first", lexical_path.display());
    }
    let lexical = LexicalIndex::load(&lexical_path, &corpus).map_err(|e| rebuild_hint(e.into()))?;
    let mut context = SearchContext::new(corpus, lexical, config.search.clone())?;

    if paths.has_vectors() {
        match get_default_embedder(&config.embed) {
            Ok(embedder) => {
                let index = VectorIndex::load(paths.vectors()).await.map_err(rebuild_hint)?;
                context = context.with_vectors(index, embedder).map_err(|e| rebuild_hint(e.into()))?;
            }
            Err(e) => warn!(error = %e, "embedding model unavailable; serving without the vector index"),
        }
    }

    let latent_path = paths.latent();
    if latent_path.exists() {
        let model = LatentModel::load(&latent_path, context.corpus()).map_err(|e| rebuild_hint(e.into()))?;
        context = context.with_latent(model).map_err(|e| rebuild_hint(e.into()))?;
    }
    info!(index_dir = %paths.root.display(), "indexes loaded");
    Ok(context)
}

pub fn format_json(results: &[EntityResult]) -> Result<String> {
    serde_json::to_string_pretty(results).context("serializing results")
}

pub fn format_human(query: &str, results: &[EntityResult]) -> String {
    let mut out = String::new();
    if results.is_empty() {
        let _ = writeln!(out, "No results for \"{query}\"");
        return out;
    }
    let _ = writeln!(out, "Results for \"{query}\":");
    for (rank, entity) in results.iter().enumerate() {
        let _ = writeln!(out, "\n{}. {}  (top {:.2})", rank + 1, entity.name, entity.top_score);
        for doc in &entity.documents {
            let _ = writeln!(out, "   [{}] {:>7.2}  {}", doc.source_kind, doc.score, doc.preview);
            if !doc.concepts.is_empty() {
                let concepts: Vec<String> = doc.concepts.iter().map(|c| format!("{} ({:.2})", c.label, c.contribution)).collect();
                let _ = writeln!(out, "            concepts: {}", concepts.join(", "));
            }
        }
    }
    out
}
