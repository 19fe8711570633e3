use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use streamfind_core::{Corpus, DocId, Error, Result};

use crate::analyzer::Analyzer;

/// Inverted index `term → posting list`.
///
/// Posting lists hold `DocId`s in ascending order with no duplicates; a
/// `DocId` resolves to its `(source_kind, entity, position)` coordinates
/// through the corpus the index was built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexicalIndex {
    doc_count: usize,
    #[serde(default)]
    fingerprint: u64,
    postings: HashMap<String, Vec<DocId>>,
    #[serde(skip)]
    analyzer: Analyzer,
}

impl LexicalIndex {
    pub fn build(corpus: &Corpus) -> Self {
        let analyzer = Analyzer::lexical();
        let mut postings: HashMap<String, Vec<DocId>> = HashMap::new();
        let mut tokenless = 0usize;
        for (id, doc) in corpus.iter() {
            let tokens = analyzer.tokens(doc.text());
            if tokens.is_empty() { tokenless += 1; continue; }
            for token in tokens {
                let list = postings.entry(token).or_default();
                if list.last() != Some(&id) { list.push(id); }
            }
        }
        if tokenless > 0 { debug!(tokenless, "documents without indexable terms"); }
        info!(documents = corpus.len(), terms = postings.len(), "lexical index built");
        Self { doc_count: corpus.len(), fingerprint: corpus.fingerprint(), postings, analyzer }
    }

    pub fn analyzer(&self) -> &Analyzer { &self.analyzer }

    pub fn doc_count(&self) -> usize { self.doc_count }

    pub fn fingerprint(&self) -> u64 { self.fingerprint }

    pub fn term_count(&self) -> usize { self.postings.len() }

    pub fn postings(&self, term: &str) -> &[DocId] { self.postings.get(term).map(Vec::as_slice).unwrap_or(&[]) }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() { std::fs::create_dir_all(parent)?; }
        let file = std::io::BufWriter::new(std::fs::File::create(path)?);
        serde_json::to_writer(file, self)?;
        info!(path = %path.display(), terms = self.postings.len(), "lexical index saved");
        Ok(())
    }

    /// Load a persisted index and check it was built from this exact corpus.
    pub fn load(path: &Path, corpus: &Corpus) -> Result<Self> {
        let file = std::io::BufReader::new(std::fs::File::open(path)?);
        let index: Self = serde_json::from_reader(file)?;
        if index.doc_count != corpus.len() {
            return Err(Error::IndexMismatch(format!("lexical index covers {} documents, corpus has {}", index.doc_count, corpus.len())));
        }
        corpus.check_fingerprint("lexical index", index.fingerprint)?;
        if let Some(bad) = index.postings.values().flatten().find(|id| id.index() >= corpus.len()) {
            return Err(Error::IndexMismatch(format!("posting {} out of corpus range", bad.0)));
        }
        Ok(index)
    }
}
