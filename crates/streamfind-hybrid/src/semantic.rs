//! Scoring for the semantic passes (embedding or latent).
//!
//! Both passes produce a cosine similarity per document; it is put on the
//! same 0 to 100 scale and given the same source and phrase bonuses so that
//! fusion sees values comparable to lexical scores.
use std::cmp::Ordering;
use std::collections::HashMap;

use streamfind_core::scoring::{occurrences, source_bonus, SEMANTIC_FREQUENCY_POINTS, SEMANTIC_PHRASE_BONUS};
use streamfind_core::{Corpus, DocId, ScoredDoc};
use streamfind_latent::ConceptContribution;
use streamfind_text::Analyzer;

/// Output of one semantic pass. Empty when the pass was skipped or degraded.
#[derive(Debug, Clone, Default)]
pub struct SemanticPass {
    pub hits: Vec<ScoredDoc>,
    pub explanations: HashMap<DocId, Vec<ConceptContribution>>,
}

impl SemanticPass {
    pub fn is_empty(&self) -> bool { self.hits.is_empty() }
}

/// `similarity*100 + source_bonus + 30 if the raw query appears verbatim +
/// 1 per query-term occurrence`, sorted descending.
pub fn score_hits(corpus: &Corpus, analyzer: &Analyzer, query: &str, hits: impl IntoIterator<Item = (DocId, f32)>) -> Vec<ScoredDoc> {
    let raw = query.trim().to_lowercase();
    let terms = analyzer.distinct_tokens(query);
    let mut scored: Vec<ScoredDoc> = hits
        .into_iter()
        .filter_map(|(id, similarity)| {
            let doc = corpus.get(id)?;
            let text = doc.embedding_text().to_lowercase();
            let mut score = similarity.clamp(0.0, 1.0) * 100.0 + source_bonus(doc.kind(), doc.source_weight());
            if !raw.is_empty() && text.contains(&raw) { score += SEMANTIC_PHRASE_BONUS; }
            score += terms.iter().map(|t| occurrences(&text, t) as f32 * SEMANTIC_FREQUENCY_POINTS).sum::<f32>();
            Some(ScoredDoc { doc: id, score })
        })
        .collect();
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn similarity_scale_and_bonuses() {
        let corpus = Corpus::from_value(&json!({
            "twitter": { "a": ["late night valorant"] },
            "wiki": { "b": { "wikipedia_summary": "A streamer." } }
        }))
        .unwrap();
        let hits = score_hits(&corpus, &Analyzer::lexical(), "valorant", [(DocId(0), 0.5), (DocId(1), 0.5)]);
        // 50 + 0 bonus + 30 phrase + 1 occurrence
        assert_eq!(hits[0], ScoredDoc { doc: DocId(0), score: 81.0 });
        // 50 + 15 summary bonus
        assert_eq!(hits[1], ScoredDoc { doc: DocId(1), score: 65.0 });
    }

    #[test]
    fn entity_name_counts_for_summaries() {
        let corpus = Corpus::from_value(&json!({ "wiki": { "Pokimane": { "wikipedia_summary": "A streamer." } } })).unwrap();
        let hits = score_hits(&corpus, &Analyzer::lexical(), "Pokimane", [(DocId(0), 0.0)]);
        assert_eq!(hits[0].score, 15.0 + 30.0 + 1.0);
    }
}
