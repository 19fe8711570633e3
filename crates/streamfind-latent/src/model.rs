use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;
use tracing::{debug, info};

use streamfind_core::config::LatentSettings;
use streamfind_core::{Corpus, DocId, Error, Result};

use crate::svd::{randomized_svd, SvdParams};
use crate::tfidf::TfidfVectorizer;

const LABEL_TERMS: usize = 3;
const EXPLAIN_CONCEPTS: usize = 3;
const MIN_LABEL_WEIGHT: f32 = 1e-6;

/// One concept dimension's share of a hit's similarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptContribution {
    pub label: String,
    pub contribution: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LatentHit {
    pub doc: DocId,
    /// Cosine similarity in concept space, clamped to `[0, 1]`.
    pub similarity: f32,
    pub concepts: Vec<ConceptContribution>,
}

/// TF-IDF vocabulary plus the truncated factorization `U·diag(S)·Vᵗ`.
///
/// Only the normalized rows of `U` are kept for documents; queries are
/// projected through `Vᵗ` and scaled by `S`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatentModel {
    vectorizer: TfidfVectorizer,
    doc_count: usize,
    #[serde(default)]
    fingerprint: u64,
    singular_values: Vec<f32>,
    /// concepts × vocabulary, row-major
    components: Vec<f32>,
    /// documents × concepts, unit rows
    doc_concepts: Vec<f32>,
    labels: Vec<String>,
}

impl LatentModel {
    pub fn build(corpus: &Corpus, settings: &LatentSettings) -> Result<Self> {
        let texts: Vec<&str> = corpus.documents().iter().map(|d| d.text()).collect();
        let (vectorizer, matrix) = TfidfVectorizer::fit_transform(&texts, settings.min_df, settings.max_df);
        if matrix.cols == 0 || matrix.rows.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "latent model has an empty vocabulary (min_df={}, max_df={}, documents={})",
                settings.min_df, settings.max_df, corpus.len()
            )));
        }
        info!(documents = matrix.rows.len(), terms = matrix.cols, nnz = matrix.nnz(), "tf-idf matrix built");

        let svd = randomized_svd(&matrix, SvdParams {
            components: settings.components,
            oversample: settings.oversample,
            power_iterations: settings.power_iterations,
            seed: settings.seed,
        });
        let k = svd.s.len();
        if k < settings.components { info!(requested = settings.components, effective = k, "concept count clamped to matrix shape"); }

        let components: Vec<f32> = svd.vt.data.iter().map(|&x| x as f32).collect();
        let mut doc_concepts: Vec<f32> = svd.u.data.iter().map(|&x| x as f32).collect();
        for row in doc_concepts.chunks_mut(k) { normalize(row); }

        let terms = vectorizer.terms();
        let labels = (0..k).map(|c| label_for(c, &components[c * matrix.cols..(c + 1) * matrix.cols], &terms)).collect::<Vec<_>>();
        debug!(?labels, "concept labels");
        info!(concepts = k, top_singular_value = svd.s.first().copied().unwrap_or(0.0), "latent model built");

        Ok(Self {
            vectorizer,
            doc_count: corpus.len(),
            fingerprint: corpus.fingerprint(),
            singular_values: svd.s.iter().map(|&x| x as f32).collect(),
            components,
            doc_concepts,
            labels,
        })
    }

    pub fn concepts(&self) -> usize { self.singular_values.len() }

    pub fn doc_count(&self) -> usize { self.doc_count }

    pub fn labels(&self) -> &[String] { &self.labels }

    pub fn singular_values(&self) -> &[f32] { &self.singular_values }

    fn doc_row(&self, i: usize) -> &[f32] { &self.doc_concepts[i * self.concepts()..(i + 1) * self.concepts()] }

    /// `query_tfidf · V`, scaled by `S`, unit length. `None` when nothing in
    /// the query is in the vocabulary.
    pub fn project(&self, query: &str) -> Option<Vec<f32>> {
        let q = self.vectorizer.transform(query);
        if q.is_empty() { return None; }
        let vocab = self.vectorizer.vocabulary_len();
        let mut concept: Vec<f32> = (0..self.concepts())
            .map(|c| {
                let row = &self.components[c * vocab..(c + 1) * vocab];
                q.iter().map(|&(t, w)| w * row[t]).sum::<f32>() * self.singular_values[c]
            })
            .collect();
        normalize(&mut concept).then_some(concept)
    }

    /// Top-k documents by cosine similarity in concept space. Documents with
    /// no positive similarity are not returned.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<LatentHit> {
        let Some(q) = self.project(query) else { return Vec::new() };
        let mut scored: Vec<(usize, f32)> = (0..self.doc_count)
            .map(|i| (i, dot(self.doc_row(i), &q).min(1.0)))
            .filter(|&(_, s)| s > 0.0)
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
        scored.truncate(top_k);
        scored
            .into_iter()
            .map(|(i, similarity)| LatentHit { doc: DocId(i as u32), similarity, concepts: self.explain(i, &q) })
            .collect()
    }

    /// Top concepts by `doc_concept[c] * query_concept[c]`.
    fn explain(&self, doc: usize, query: &[f32]) -> Vec<ConceptContribution> {
        let mut parts: Vec<(usize, f32)> = self.doc_row(doc).iter().zip(query).map(|(d, q)| d * q).enumerate().collect();
        parts.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        parts
            .into_iter()
            .take(EXPLAIN_CONCEPTS)
            .map(|(c, contribution)| ConceptContribution { label: self.labels[c].clone(), contribution })
            .collect()
    }

    pub fn check_corpus(&self, corpus: &Corpus) -> Result<()> {
        if self.doc_count != corpus.len() {
            return Err(Error::IndexMismatch(format!("latent model covers {} documents, corpus has {}", self.doc_count, corpus.len())));
        }
        corpus.check_fingerprint("latent model", self.fingerprint)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() { std::fs::create_dir_all(parent)?; }
        let file = std::io::BufWriter::new(std::fs::File::create(path)?);
        serde_json::to_writer(file, self)?;
        info!(path = %path.display(), concepts = self.concepts(), "latent model saved");
        Ok(())
    }

    pub fn load(path: &Path, corpus: &Corpus) -> Result<Self> {
        let file = std::io::BufReader::new(std::fs::File::open(path)?);
        let model: Self = serde_json::from_reader(file)?;
        let k = model.concepts();
        let vocab = model.vectorizer.vocabulary_len();
        if k == 0 || model.components.len() != k * vocab || model.doc_concepts.len() != model.doc_count * k || model.labels.len() != k {
            return Err(Error::IndexMismatch(format!("latent model at {} has inconsistent shapes", path.display())));
        }
        model.check_corpus(corpus)?;
        info!(path = %path.display(), concepts = k, terms = vocab, "latent model loaded");
        Ok(model)
    }
}

/// First two qualifying unigrams among the top-weighted terms, or a
/// positional name when none qualify. A concept past the corpus rank has an
/// all-zero row and is never named after vocabulary terms.
fn label_for(concept: usize, weights: &[f32], terms: &[&str]) -> String {
    let positional = || format!("Dimension {}", concept + 1);
    if weights.iter().all(|&w| w <= MIN_LABEL_WEIGHT) { return positional(); }
    let mut order: Vec<usize> = (0..weights.len()).collect();
    order.sort_by(|&a, &b| weights[b].partial_cmp(&weights[a]).unwrap_or(Ordering::Equal));
    let picked: Vec<&str> = order
        .into_iter()
        .take(LABEL_TERMS)
        .filter(|&t| weights[t] > MIN_LABEL_WEIGHT)
        .filter_map(|t| terms.get(t).copied())
        .filter(|t| !t.contains(' ') && t.chars().count() > 2)
        .take(2)
        .collect();
    if picked.is_empty() { positional() } else { picked.join(" + ") }
}

fn dot(a: &[f32], b: &[f32]) -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() }

/// Scale to unit length; false when the vector is zero.
fn normalize(v: &mut [f32]) -> bool {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm <= 1e-12 { return false; }
    for x in v.iter_mut() { *x /= norm; }
    true
}
