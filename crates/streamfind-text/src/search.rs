use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

use streamfind_core::scoring::{occurrences, source_bonus, LEXICAL_FREQUENCY_POINTS, LEXICAL_PHRASE_BONUS, TERM_MATCH_POINTS};
use streamfind_core::{Corpus, DocId, ScoredDoc};

use crate::index::LexicalIndex;

impl LexicalIndex {
    /// Keyword retrieval and scoring.
    ///
    /// `score = matched_terms*15 + Σ occurrences*5 + source_bonus + 50 if the
    /// joined query terms appear verbatim`. Ties keep discovery order.
    ///
    /// A single-term query is not a phrase: every candidate already contains
    /// the term, so the phrase bonus only applies from two terms up.
    pub fn search(&self, corpus: &Corpus, query: &str) -> Vec<ScoredDoc> {
        let terms = self.analyzer().distinct_tokens(query);
        if terms.is_empty() { return Vec::new(); }

        let mut order: Vec<DocId> = Vec::new();
        let mut matched: HashMap<DocId, usize> = HashMap::new();
        for term in &terms {
            for &id in self.postings(term) {
                let count = matched.entry(id).or_insert_with(|| { order.push(id); 0 });
                *count += 1;
            }
        }

        let phrase = terms.join(" ");
        let mut scored: Vec<ScoredDoc> = order
            .into_iter()
            .filter_map(|id| {
                let doc = corpus.get(id)?;
                let text = doc.text().to_lowercase();
                let mut score = matched[&id] as f32 * TERM_MATCH_POINTS;
                score += terms.iter().map(|t| occurrences(&text, t) as f32 * LEXICAL_FREQUENCY_POINTS).sum::<f32>();
                score += source_bonus(doc.kind(), doc.source_weight());
                if terms.len() > 1 && text.contains(&phrase) { score += LEXICAL_PHRASE_BONUS; }
                Some(ScoredDoc { doc: id, score })
            })
            .collect();
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        debug!(terms = terms.len(), hits = scored.len(), "lexical search");
        scored
    }
}
