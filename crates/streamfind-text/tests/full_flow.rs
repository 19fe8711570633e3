use serde_json::json;
use tempfile::TempDir;

use streamfind_core::{Corpus, Document, Error};
use streamfind_text::{Analyzer, LexicalIndex};

fn corpus() -> Corpus {
    Corpus::from_value(&json!({
        "reddit": {
            "Kai Cenat": [ { "Title": "Kai Cenat goes live", "Score": 1000, "ID": "t3_a" } ]
        },
        "twitter": {
            "Pokimane": [ "Valorant tonight with friends", "just chatting then valorant ranked" ],
            "xQc": [ "react content all day" ]
        },
        "wiki": {
            "Pokimane": { "wikipedia_summary": "Imane Anys, known as Pokimane, plays Valorant and League of Legends." }
        },
        "details": {
            "xQc": { "Description": "Variety streamer, former Overwatch pro" }
        }
    }))
    .unwrap()
}

#[test]
fn single_term_titled_post_score() {
    let corpus = corpus();
    let index = LexicalIndex::build(&corpus);
    let hits = index.search(&corpus, "kai");
    assert_eq!(hits.len(), 1);
    // 1 matched term * 15 + 1 occurrence * 5 + min(1000/500, 20)
    assert!((hits[0].score - 22.0).abs() < 1e-4, "score={}", hits[0].score);
}

#[test]
fn every_hit_contains_a_query_term() {
    let corpus = corpus();
    let index = LexicalIndex::build(&corpus);
    let analyzer = Analyzer::lexical();
    for q in ["valorant", "react streamer", "Overwatch PRO", "league legends"] {
        let terms = analyzer.tokens(q);
        let hits = index.search(&corpus, q);
        assert!(!hits.is_empty(), "q='{q}'");
        for hit in hits {
            let doc_terms = analyzer.tokens(corpus.get(hit.doc).unwrap().text());
            assert!(terms.iter().any(|t| doc_terms.contains(t)), "q='{q}'");
        }
    }
}

#[test]
fn results_sorted_with_phrase_and_source_bonus() {
    let corpus = corpus();
    let index = LexicalIndex::build(&corpus);
    let hits = index.search(&corpus, "valorant ranked");
    let scores: Vec<f32> = hits.iter().map(|h| h.score).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    let top = corpus.get(hits[0].doc).unwrap();
    // 2 terms * 15 + 2 occurrences * 5 + 50 phrase bonus
    assert_eq!(top.text(), "just chatting then valorant ranked");
    assert!((hits[0].score - 90.0).abs() < 1e-4);
    let summary = hits.iter().find(|h| matches!(corpus.get(h.doc), Some(Document::Summary { .. }))).unwrap();
    // 1 term * 15 + 1 occurrence * 5 + 15 summary bonus
    assert!((summary.score - 35.0).abs() < 1e-4);
}

#[test]
fn repeated_query_terms_count_once() {
    let corpus = corpus();
    let index = LexicalIndex::build(&corpus);
    let once = index.search(&corpus, "react");
    let twice = index.search(&corpus, "react REACT react");
    assert_eq!(once, twice);
}

#[test]
fn ties_keep_discovery_order() {
    let corpus = Corpus::from_value(&json!({ "twitter": { "a": ["same words"], "b": ["same words"], "c": ["same words"] } })).unwrap();
    let index = LexicalIndex::build(&corpus);
    let entities: Vec<&str> = index.search(&corpus, "same").iter().map(|h| corpus.get(h.doc).unwrap().entity()).collect();
    assert_eq!(entities, vec!["a", "b", "c"]);
}

#[test]
fn empty_and_unknown_queries_return_nothing() {
    let corpus = corpus();
    let index = LexicalIndex::build(&corpus);
    assert!(index.search(&corpus, "").is_empty());
    assert!(index.search(&corpus, "   !!! ").is_empty());
    assert!(index.search(&corpus, "zzzunknown").is_empty());
}

#[test]
fn persisted_index_reloads_and_checks_corpus() {
    let corpus = corpus();
    let index = LexicalIndex::build(&corpus);
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("lexical.json");
    index.save(&path).unwrap();

    let loaded = LexicalIndex::load(&path, &corpus).expect("reload");
    assert_eq!(loaded.term_count(), index.term_count());
    assert_eq!(loaded.search(&corpus, "valorant"), index.search(&corpus, "valorant"));

    let smaller = Corpus::from_value(&json!({ "twitter": { "a": ["one"] } })).unwrap();
    assert!(matches!(LexicalIndex::load(&path, &smaller), Err(Error::IndexMismatch(_))));
}

#[test]
fn same_size_edited_corpus_is_rejected() {
    let original = Corpus::from_value(&json!({ "twitter": { "a": ["valorant ranked"], "b": ["cooking pasta"] } })).unwrap();
    let edited = Corpus::from_value(&json!({ "twitter": { "a": ["minecraft speedrun"], "b": ["cooking pasta"] } })).unwrap();
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("lexical.json");
    LexicalIndex::build(&original).save(&path).unwrap();

    assert_eq!(original.len(), edited.len());
    assert!(LexicalIndex::load(&path, &original).is_ok());
    assert!(matches!(LexicalIndex::load(&path, &edited), Err(Error::IndexMismatch(_))));
}
