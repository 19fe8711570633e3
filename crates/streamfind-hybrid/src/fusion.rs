//! Score fusion and entity grouping.
//!
//! Every strategy ends here: a lexical score set and a semantic score set
//! (either may be empty) are merged per canonical document key, combined
//! with the weighted rule or the single-signal threshold, then grouped by
//! entity and truncated.
use std::cmp::Ordering;
use std::collections::HashMap;

use streamfind_core::config::SearchSettings;
use streamfind_core::{Corpus, DocId, DocKey, ScoredDoc};

use crate::result::{preview, EntityResult, ResultDocument};
use crate::semantic::SemanticPass;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionParams {
    pub lexical_weight: f32,
    pub semantic_weight: f32,
    pub min_single_signal: f32,
    pub docs_per_entity: usize,
    pub max_entities: usize,
}

impl From<&SearchSettings> for FusionParams {
    fn from(s: &SearchSettings) -> Self {
        Self {
            lexical_weight: s.lexical_weight,
            semantic_weight: s.semantic_weight,
            min_single_signal: s.min_single_signal,
            docs_per_entity: s.docs_per_entity,
            max_entities: s.max_entities,
        }
    }
}

impl Default for FusionParams {
    fn default() -> Self { Self::from(&SearchSettings::default()) }
}

/// Combined score for one key, or `None` if the document is dropped.
///
/// Non-positive scores count as absent. Two signals are blended with the
/// weights; a lone signal survives only above `min_single_signal`.
pub fn combine(lexical: Option<f32>, semantic: Option<f32>, params: &FusionParams) -> Option<f32> {
    let lexical = lexical.filter(|s| *s > 0.0);
    let semantic = semantic.filter(|s| *s > 0.0);
    let fused = match (lexical, semantic) {
        (Some(l), Some(s)) => l * params.lexical_weight + s * params.semantic_weight,
        (Some(single), None) | (None, Some(single)) if single > params.min_single_signal => single,
        _ => return None,
    };
    (fused > 0.0).then_some(fused)
}

#[derive(Debug, Clone, PartialEq)]
pub struct FusedDoc {
    pub doc: DocId,
    pub key: DocKey,
    pub lexical: Option<f32>,
    pub semantic: Option<f32>,
    pub fused: f32,
}

/// Merge both passes per `DocKey`, keeping the maximum score each pass gave.
/// Output keeps first-seen order (lexical ranking, then semantic-only).
pub fn fuse(corpus: &Corpus, lexical: &[ScoredDoc], semantic: &[ScoredDoc], params: &FusionParams) -> Vec<FusedDoc> {
    let mut order: Vec<DocKey> = Vec::new();
    let mut slots: HashMap<DocKey, (DocId, Option<f32>, Option<f32>)> = HashMap::new();
    for (hits, is_lexical) in [(lexical, true), (semantic, false)] {
        for hit in hits {
            let Some(doc) = corpus.get(hit.doc) else { continue };
            let key = doc.key();
            let slot = slots.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                (hit.doc, None, None)
            });
            let score = if is_lexical { &mut slot.1 } else { &mut slot.2 };
            *score = Some(score.map_or(hit.score, |s| s.max(hit.score)));
        }
    }
    order
        .into_iter()
        .filter_map(|key| {
            let (doc, lexical, semantic) = slots.remove(&key)?;
            let fused = combine(lexical, semantic, params)?;
            Some(FusedDoc { doc, key, lexical, semantic, fused })
        })
        .collect()
}

/// Group by entity, sort entities by their best document and documents by
/// fused score, then apply both caps.
pub fn group(corpus: &Corpus, fused: Vec<FusedDoc>, semantic: &SemanticPass, params: &FusionParams) -> Vec<EntityResult> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<FusedDoc>> = HashMap::new();
    for doc in fused {
        let entity = doc.key.entity.clone();
        groups.entry(entity.clone()).or_insert_with(|| { order.push(entity); Vec::new() }).push(doc);
    }

    let by_fused = |a: &f32, b: &f32| b.partial_cmp(a).unwrap_or(Ordering::Equal);
    let mut entities: Vec<EntityResult> = order
        .into_iter()
        .filter_map(|name| {
            let mut docs = groups.remove(&name)?;
            docs.sort_by(|a, b| by_fused(&a.fused, &b.fused));
            let top_score = docs.first()?.fused;
            docs.truncate(params.docs_per_entity);
            let documents = docs.into_iter().filter_map(|d| result_document(corpus, &d, semantic)).collect();
            Some(EntityResult { name, top_score, documents })
        })
        .collect();
    entities.sort_by(|a, b| by_fused(&a.top_score, &b.top_score));
    entities.truncate(params.max_entities);
    entities
}

fn result_document(corpus: &Corpus, fused: &FusedDoc, semantic: &SemanticPass) -> Option<ResultDocument> {
    let doc = corpus.get(fused.doc)?;
    Some(ResultDocument {
        source_kind: doc.kind(),
        preview: preview(doc.text()),
        score: fused.fused,
        stable_id: fused.key.stable_id.clone(),
        source_weight: doc.source_weight(),
        concepts: semantic.explanations.get(&fused.doc).cloned().unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn corpus() -> Corpus {
        Corpus::from_value(&json!({
            "twitter": { "X": ["x one", "x two", "x three"], "Y": ["y one"], "Z": ["z one"] }
        }))
        .unwrap()
    }

    fn sd(doc: u32, score: f32) -> ScoredDoc { ScoredDoc { doc: DocId(doc), score } }

    #[test]
    fn both_signals_use_weights() {
        let p = FusionParams { lexical_weight: 0.3, semantic_weight: 1.2, ..FusionParams::default() };
        let fused = combine(Some(40.0), Some(60.0), &p).unwrap();
        assert!((fused - (40.0 * 0.3 + 60.0 * 1.2)).abs() < 1e-4);
    }

    #[test]
    fn single_signal_threshold_is_strict() {
        let p = FusionParams::default();
        assert_eq!(combine(Some(5.0), None, &p), None);
        assert_eq!(combine(None, Some(5.5), &p), Some(5.5));
        assert_eq!(combine(Some(0.0), Some(0.0), &p), None);
        assert_eq!(combine(Some(80.0), Some(0.0), &p), Some(80.0));
    }

    #[test]
    fn zero_weights_drop_documents() {
        let p = FusionParams { lexical_weight: 0.0, semantic_weight: 0.0, ..FusionParams::default() };
        assert_eq!(combine(Some(50.0), Some(50.0), &p), None);
    }

    #[test]
    fn single_signal_scenario() {
        let corpus = corpus();
        let p = FusionParams::default();
        // X: lexical 80 / semantic 0, Y: semantic 70 only
        let fused = fuse(&corpus, &[sd(0, 80.0)], &[sd(0, 0.0), sd(3, 70.0)], &p);
        let grouped = group(&corpus, fused, &SemanticPass::default(), &p);
        let names: Vec<&str> = grouped.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["X", "Y"]);
        assert_eq!(grouped[0].top_score, 80.0);
        assert_eq!(grouped[1].top_score, 70.0);
    }

    #[test]
    fn max_score_per_key_per_pass() {
        let corpus = corpus();
        let fused = fuse(&corpus, &[sd(1, 10.0), sd(1, 30.0)], &[sd(1, 20.0)], &FusionParams::default());
        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].lexical, Some(30.0));
        assert_eq!(fused[0].fused, 25.0);
    }

    #[test]
    fn groups_are_sorted_and_capped() {
        let corpus = corpus();
        let p = FusionParams { docs_per_entity: 2, max_entities: 2, ..FusionParams::default() };
        let lexical = [sd(0, 10.0), sd(1, 30.0), sd(2, 20.0), sd(3, 25.0), sd(4, 40.0)];
        let grouped = group(&corpus, fuse(&corpus, &lexical, &[], &p), &SemanticPass::default(), &p);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].name, "Z");
        assert_eq!(grouped[1].name, "X");
        let scores: Vec<f32> = grouped[1].documents.iter().map(|d| d.score).collect();
        assert_eq!(scores, vec![30.0, 20.0]);
        assert_eq!(grouped[1].top_score, 30.0);
    }
}
