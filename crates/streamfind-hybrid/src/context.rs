use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use streamfind_core::config::SearchSettings;
use streamfind_core::traits::Embedder;
use streamfind_core::{Corpus, Error, RankingStrategy, Result};
use streamfind_latent::LatentModel;
use streamfind_text::LexicalIndex;
use streamfind_vector::VectorIndex;

use crate::fusion::{fuse, group, FusionParams};
use crate::result::EntityResult;
use crate::semantic::{score_hits, SemanticPass};

struct DenseBackend {
    index: VectorIndex,
    embedder: Arc<dyn Embedder>,
}

/// Everything one query needs, built once and never mutated.
///
/// Every index attached here has been checked against `corpus`, so a
/// `DocId` from any pass resolves to the same document.
pub struct SearchContext {
    corpus: Corpus,
    lexical: LexicalIndex,
    dense: Option<DenseBackend>,
    latent: Option<LatentModel>,
    settings: SearchSettings,
}

impl SearchContext {
    pub fn new(corpus: Corpus, lexical: LexicalIndex, settings: SearchSettings) -> Result<Self> {
        settings.validate()?;
        if lexical.doc_count() != corpus.len() {
            return Err(Error::IndexMismatch(format!("lexical index covers {} documents, corpus has {}", lexical.doc_count(), corpus.len())));
        }
        corpus.check_fingerprint("lexical index", lexical.fingerprint())?;
        Ok(Self { corpus, lexical, dense: None, latent: None, settings })
    }

    /// Attach the embedding index; the serving model must be the one that built it.
    pub fn with_vectors(mut self, index: VectorIndex, embedder: Arc<dyn Embedder>) -> Result<Self> {
        index.check_embedder(embedder.as_ref())?;
        index.check_corpus(&self.corpus)?;
        if index.model_id() != embedder.model_id() {
            return Err(Error::IndexMismatch(format!("vectors were built with '{}', serving model is '{}'", index.model_id(), embedder.model_id())));
        }
        self.dense = Some(DenseBackend { index, embedder });
        Ok(self)
    }

    pub fn with_latent(mut self, model: LatentModel) -> Result<Self> {
        model.check_corpus(&self.corpus)?;
        self.latent = Some(model);
        Ok(self)
    }

    pub fn corpus(&self) -> &Corpus { &self.corpus }

    pub fn settings(&self) -> &SearchSettings { &self.settings }

    pub fn has_vectors(&self) -> bool { self.dense.is_some() }

    pub fn has_latent(&self) -> bool { self.latent.is_some() }

    /// Configured strategy, or `latent_semantic` when a latent model is
    /// attached and `hybrid` otherwise.
    pub fn strategy(&self) -> RankingStrategy {
        self.settings.strategy.unwrap_or(if self.latent.is_some() { RankingStrategy::LatentSemantic } else { RankingStrategy::Hybrid })
    }

    /// Passes the strategy wants but this context cannot run.
    pub fn missing_backends(&self) -> Vec<&'static str> {
        let strategy = self.strategy();
        let mut missing = Vec::new();
        if strategy.uses_embeddings() && self.dense.is_none() { missing.push("vector index"); }
        if strategy.uses_latent() && self.latent.is_none() { missing.push("latent model"); }
        missing
    }

    pub async fn search(&self, query: &str) -> Vec<EntityResult> { self.search_with(query, self.strategy()).await }

    /// Never fails: a semantic pass that errors or times out contributes no
    /// scores and the query ranks on what remains.
    pub async fn search_with(&self, query: &str, strategy: RankingStrategy) -> Vec<EntityResult> {
        if query.trim().is_empty() { return Vec::new(); }
        let lexical = async {
            if strategy.uses_lexical() { self.lexical.search(&self.corpus, query) } else { Vec::new() }
        };
        let semantic = async {
            if strategy.uses_embeddings() {
                self.embedding_pass(query).await
            } else if strategy.uses_latent() {
                self.latent_pass(query)
            } else {
                SemanticPass::default()
            }
        };
        let (lexical, semantic) = tokio::join!(lexical, semantic);

        let params = FusionParams::from(&self.settings);
        let fused = fuse(&self.corpus, &lexical, &semantic.hits, &params);
        debug!(?strategy, lexical = lexical.len(), semantic = semantic.hits.len(), fused = fused.len(), "query fused");
        group(&self.corpus, fused, &semantic, &params)
    }

    async fn embedding_pass(&self, query: &str) -> SemanticPass {
        let Some(dense) = &self.dense else { return SemanticPass::default() };
        let embedder = Arc::clone(&dense.embedder);
        let text = query.to_string();
        let limit = Duration::from_millis(self.settings.embed_timeout_ms);
        let vector = match tokio::time::timeout(limit, tokio::task::spawn_blocking(move || embedder.embed_one(&text))).await {
            Ok(Ok(Ok(vector))) => vector,
            Ok(Ok(Err(e))) => return degraded(Error::Encoding(e.to_string())),
            Ok(Err(join)) => return degraded(Error::Encoding(join.to_string())),
            Err(_) => return degraded(Error::Encoding(format!("timed out after {}ms", self.settings.embed_timeout_ms))),
        };
        match dense.index.search(&vector, self.settings.top_k) {
            Ok(hits) => SemanticPass { hits: score_hits(&self.corpus, self.lexical.analyzer(), query, hits), ..SemanticPass::default() },
            Err(e) => degraded(e),
        }
    }

    fn latent_pass(&self, query: &str) -> SemanticPass {
        let Some(model) = &self.latent else { return SemanticPass::default() };
        let hits = model.search(query, self.settings.top_k);
        let scored = score_hits(&self.corpus, self.lexical.analyzer(), query, hits.iter().map(|h| (h.doc, h.similarity)));
        SemanticPass { hits: scored, explanations: hits.into_iter().map(|h| (h.doc, h.concepts)).collect() }
    }
}

fn degraded(err: Error) -> SemanticPass {
    warn!("{err}; ranking this query without the embedding pass");
    SemanticPass::default()
}
