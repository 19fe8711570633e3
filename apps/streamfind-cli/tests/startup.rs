use serde_json::json;
use tempfile::TempDir;

use streamfind_cli::{load_context, IndexPaths};
use streamfind_core::config::AppConfig;
use streamfind_core::{Corpus, RankingStrategy};
use streamfind_embed::FakeEmbedder;
use streamfind_latent::LatentModel;
use streamfind_text::LexicalIndex;
use streamfind_vector::VectorIndex;

fn config() -> AppConfig {
    let mut config = AppConfig::default();
    config.embed.use_fake = true;
    config.embed.fake_dim = 32;
    config.latent.components = 2;
    config
}

fn corpus() -> Corpus {
    Corpus::from_value(&json!({
        "twitter": {
            "Pokimane": [ "valorant ranked grind", "valorant tournament clutch", "valorant ranked clutch" ],
            "xQc": [ "cooking pasta stream", "cooking stream tonight", "pasta cooking recipe" ]
        }
    }))
    .unwrap()
}

async fn build_all(config: &AppConfig, corpus: &Corpus, paths: &IndexPaths) {
    LexicalIndex::build(corpus).save(&paths.lexical()).unwrap();
    let embedder = FakeEmbedder::new(config.embed.fake_dim);
    VectorIndex::build(corpus, &embedder, config.embed.batch_size).unwrap().save(paths.vectors()).await.unwrap();
    LatentModel::build(corpus, &config.latent).unwrap().save(&paths.latent()).unwrap();
}

#[tokio::test]
async fn persisted_artifacts_serve_queries() {
    let tmp = TempDir::new().unwrap();
    let paths = IndexPaths::new(tmp.path());
    let config = config();
    build_all(&config, &corpus(), &paths).await;

    let context = load_context(&config, corpus(), &paths).await.expect("load");
    assert!(context.has_vectors() && context.has_latent());
    assert_eq!(context.strategy(), RankingStrategy::LatentSemantic);
    assert_eq!(context.search("valorant ranked").await[0].name, "Pokimane");
    assert_eq!(context.search_with("cooking pasta", RankingStrategy::Hybrid).await[0].name, "xQc");
}

#[tokio::test]
async fn changed_corpus_requires_rebuild() {
    let tmp = TempDir::new().unwrap();
    let paths = IndexPaths::new(tmp.path());
    let config = config();
    build_all(&config, &corpus(), &paths).await;

    let grown = Corpus::from_value(&json!({ "twitter": { "a": ["one"], "b": ["two"] } })).unwrap();
    let err = load_context(&config, grown, &paths).await.err().expect("stale indexes must not load");
    assert!(format!("{err:#}").contains("rebuild"));
}

#[tokio::test]
async fn missing_lexical_index_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let err = load_context(&config(), corpus(), &IndexPaths::new(tmp.path())).await.err().expect("nothing to load");
    assert!(err.to_string().contains("streamfind-indexer"));
}

#[tokio::test]
async fn edited_corpus_of_the_same_size_requires_rebuild() {
    let tmp = TempDir::new().unwrap();
    let paths = IndexPaths::new(tmp.path());
    let config = config();
    build_all(&config, &corpus(), &paths).await;

    let edited = Corpus::from_value(&json!({
        "twitter": {
            "Pokimane": [ "minecraft speedrun grind", "valorant tournament clutch", "valorant ranked clutch" ],
            "xQc": [ "cooking pasta stream", "cooking stream tonight", "pasta cooking recipe" ]
        }
    }))
    .unwrap();
    assert_eq!(edited.len(), corpus().len());
    let err = load_context(&config, edited, &paths).await.err().expect("edited corpus must not serve old postings");
    assert!(format!("{err:#}").contains("rebuild"));
}
