use serde_json::json;
use tempfile::TempDir;

use streamfind_core::config::LatentSettings;
use streamfind_core::{Corpus, Error};
use streamfind_latent::LatentModel;

fn corpus() -> Corpus {
    Corpus::from_value(&json!({
        "twitter": {
            "Pokimane": [ "valorant ranked grind", "valorant tournament clutch", "valorant ranked clutch" ],
            "xQc": [ "cooking pasta stream", "cooking stream tonight", "pasta cooking recipe" ]
        }
    }))
    .unwrap()
}

fn settings(components: usize) -> LatentSettings { LatentSettings { components, ..LatentSettings::default() } }

#[test]
fn query_lands_in_its_topic() {
    let corpus = corpus();
    let model = LatentModel::build(&corpus, &settings(2)).expect("build");
    assert_eq!(model.concepts(), 2);
    let hits = model.search("valorant ranked", 10);
    assert!(hits.len() >= 3);
    for hit in &hits[..3] {
        assert_eq!(corpus.get(hit.doc).unwrap().entity(), "Pokimane");
    }
    assert!(hits.windows(2).all(|w| w[0].similarity >= w[1].similarity));
    assert!(hits.iter().all(|h| h.similarity > 0.0 && h.similarity <= 1.0));
}

#[test]
fn document_text_finds_its_own_entity() {
    let corpus = corpus();
    let model = LatentModel::build(&corpus, &settings(2)).unwrap();
    for (_, doc) in corpus.iter() {
        let hits = model.search(doc.text(), 1);
        assert_eq!(corpus.get(hits[0].doc).unwrap().entity(), doc.entity(), "q='{}'", doc.text());
    }
}

#[test]
fn hits_explain_top_concepts() {
    let corpus = corpus();
    let model = LatentModel::build(&corpus, &settings(2)).unwrap();
    let hit = &model.search("cooking pasta", 1)[0];
    assert_eq!(hit.concepts.len(), 2);
    assert!(hit.concepts[0].contribution >= hit.concepts[1].contribution);
    assert!(model.labels().contains(&hit.concepts[0].label));
}

#[test]
fn concept_count_is_clamped() {
    let model = LatentModel::build(&corpus(), &settings(30)).unwrap();
    assert!(model.concepts() <= 6);
    assert!(model.singular_values().windows(2).all(|w| w[0] >= w[1]));
    for (sigma, label) in model.singular_values().iter().zip(model.labels()) {
        if *sigma == 0.0 { assert!(label.starts_with("Dimension "), "label={label}"); }
    }
}

#[test]
fn unknown_and_empty_queries_return_nothing() {
    let model = LatentModel::build(&corpus(), &settings(2)).unwrap();
    assert!(model.search("", 5).is_empty());
    assert!(model.search("minecraft speedrun", 5).is_empty());
}

#[test]
fn vocabulary_without_shared_terms_is_rejected() {
    let corpus = Corpus::from_value(&json!({ "twitter": { "a": ["alpha"], "b": ["bravo"] } })).unwrap();
    assert!(matches!(LatentModel::build(&corpus, &settings(2)), Err(Error::InvalidConfig(_))));
}

#[test]
fn persisted_model_round_trips() {
    let corpus = corpus();
    let model = LatentModel::build(&corpus, &settings(2)).unwrap();
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("latent.json");
    model.save(&path).unwrap();

    let loaded = LatentModel::load(&path, &corpus).expect("load");
    assert_eq!(loaded.labels(), model.labels());
    assert_eq!(loaded.search("valorant clutch", 4), model.search("valorant clutch", 4));

    let other = Corpus::from_value(&json!({ "twitter": { "a": ["one"] } })).unwrap();
    assert!(matches!(LatentModel::load(&path, &other), Err(Error::IndexMismatch(_))));
}

#[test]
fn same_size_edited_corpus_is_rejected() {
    let corpus = corpus();
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("latent.json");
    LatentModel::build(&corpus, &settings(2)).unwrap().save(&path).unwrap();

    let edited = Corpus::from_value(&json!({
        "twitter": {
            "Pokimane": [ "valorant ranked grind", "valorant tournament clutch", "minecraft speedrun clutch" ],
            "xQc": [ "cooking pasta stream", "cooking stream tonight", "pasta cooking recipe" ]
        }
    }))
    .unwrap();
    assert_eq!(edited.len(), corpus.len());
    assert!(matches!(LatentModel::load(&path, &edited), Err(Error::IndexMismatch(_))));
}
