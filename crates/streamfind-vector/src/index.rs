use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::info;

use streamfind_core::traits::Embedder;
use streamfind_core::{Corpus, DocId, Error, SourceKind};

/// Metadata row aligned 1:1 with a matrix row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorEntry {
    pub doc: DocId,
    pub kind: SourceKind,
    pub entity: String,
    pub text: String,
    pub source_weight: f32,
}

/// Flat nearest-neighbor index over unit-length document embeddings.
///
/// Invariant: `matrix.len() == entries.len() * dim`, rows L2-normalized,
/// produced by the model named `model_id`.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    model_id: String,
    dim: usize,
    /// `Corpus::fingerprint` of the corpus the rows were embedded from.
    fingerprint: u64,
    entries: Vec<VectorEntry>,
    matrix: Vec<f32>,
}

impl VectorIndex {
    /// Embed every corpus document in batches of `batch_size`.
    pub fn build(corpus: &Corpus, embedder: &dyn Embedder, batch_size: usize) -> Result<Self> {
        let dim = embedder.dim();
        let batch_size = batch_size.max(1);
        let docs: Vec<_> = corpus.iter().collect();
        info!(documents = docs.len(), dim, model = embedder.model_id(), "building vector index");
        let pb = ProgressBar::new(docs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} docs ({percent}%) {msg}")?
                .progress_chars("#>-"),
        );
        let mut entries = Vec::with_capacity(docs.len());
        let mut matrix = Vec::with_capacity(docs.len() * dim);
        for batch in docs.chunks(batch_size) {
            let texts: Vec<String> = batch.iter().map(|(_, d)| d.embedding_text().into_owned()).collect();
            let vectors = embedder.embed_batch(&texts)?;
            if vectors.len() != batch.len() {
                anyhow::bail!("embedder returned {} vectors for {} texts", vectors.len(), batch.len());
            }
            for ((id, doc), mut v) in batch.iter().zip(vectors) {
                if v.len() != dim { return Err(Error::IndexDimensionMismatch { index: dim, model: v.len() }.into()); }
                normalize(&mut v);
                matrix.extend_from_slice(&v);
                entries.push(VectorEntry { doc: *id, kind: doc.kind(), entity: doc.entity().to_string(), text: doc.text().to_string(), source_weight: doc.source_weight() });
            }
            pb.inc(batch.len() as u64);
        }
        pb.finish_with_message("vector index built");
        Ok(Self { model_id: embedder.model_id().to_string(), dim, fingerprint: corpus.fingerprint(), entries, matrix })
    }

    pub fn from_parts(model_id: String, dim: usize, fingerprint: u64, entries: Vec<VectorEntry>, matrix: Vec<f32>) -> streamfind_core::Result<Self> {
        if matrix.len() != entries.len() * dim {
            return Err(Error::IndexMismatch(format!("{} matrix values for {} rows of dim {}", matrix.len(), entries.len(), dim)));
        }
        Ok(Self { model_id, dim, fingerprint, entries, matrix })
    }

    pub fn model_id(&self) -> &str { &self.model_id }
    pub fn dim(&self) -> usize { self.dim }
    pub fn fingerprint(&self) -> u64 { self.fingerprint }
    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
    pub fn entries(&self) -> &[VectorEntry] { &self.entries }
    pub fn row(&self, i: usize) -> &[f32] { &self.matrix[i * self.dim..(i + 1) * self.dim] }

    /// The serving model must produce vectors of the indexed width.
    pub fn check_embedder(&self, embedder: &dyn Embedder) -> streamfind_core::Result<()> {
        if embedder.dim() != self.dim { return Err(Error::IndexDimensionMismatch { index: self.dim, model: embedder.dim() }); }
        Ok(())
    }

    /// Every metadata row must point at the same document in `corpus`, and
    /// the rows must have been embedded from its current text.
    pub fn check_corpus(&self, corpus: &Corpus) -> streamfind_core::Result<()> {
        if self.entries.len() != corpus.len() {
            return Err(Error::IndexMismatch(format!("vector index has {} rows, corpus has {} documents", self.entries.len(), corpus.len())));
        }
        for entry in &self.entries {
            match corpus.get(entry.doc) {
                Some(doc) if doc.kind() == entry.kind && doc.entity() == entry.entity => {}
                _ => return Err(Error::IndexMismatch(format!("row for document {} does not match corpus", entry.doc.0))),
            }
        }
        corpus.check_fingerprint("vector index", self.fingerprint)
    }

    /// Exact top-k by inner product; similarities are cosine values clamped to `[0, 1]`.
    pub fn search(&self, query: &[f32], top_k: usize) -> streamfind_core::Result<Vec<(DocId, f32)>> {
        if query.len() != self.dim { return Err(Error::IndexDimensionMismatch { index: self.dim, model: query.len() }); }
        let mut q = query.to_vec();
        normalize(&mut q);
        let mut scored: Vec<(usize, f32)> = (0..self.entries.len()).map(|i| (i, dot(self.row(i), &q).clamp(0.0, 1.0))).collect();
        let by_score = |a: &(usize, f32), b: &(usize, f32)| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0));
        if top_k < scored.len() {
            if top_k == 0 { return Ok(Vec::new()); }
            scored.select_nth_unstable_by(top_k - 1, by_score);
            scored.truncate(top_k);
        }
        scored.sort_by(by_score);
        Ok(scored.into_iter().map(|(i, s)| (self.entries[i].doc, s)).collect())
    }
}

pub fn dot(a: &[f32], b: &[f32]) -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() }

pub fn normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 1e-12 { for x in v.iter_mut() { *x /= norm; } }
}
