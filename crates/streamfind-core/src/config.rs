//! Configuration loader and path helpers.
//!
//! Uses Figment to merge `streamfind.toml` + `streamfind.<env>.toml` + `APP_*`
//! env vars (`__` separates nested keys, e.g. `APP_SEARCH__TOP_K=20`), then
//! extracts the typed `AppConfig` with defaults for every knob.
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::types::RankingStrategy;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::file("streamfind.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("streamfind.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("streamfind.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("streamfind.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));
        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    pub fn settings(&self) -> Result<AppConfig> {
        let settings: AppConfig = self.figment.extract().map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataSettings,
    pub search: SearchSettings,
    pub latent: LatentSettings,
    pub embed: EmbedSettings,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        self.search.validate()?;
        self.latent.validate()?;
        if self.embed.batch_size == 0 { return Err(Error::InvalidConfig("embed.batch_size must be at least 1".into())); }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub corpus_path: String,
    pub index_dir: String,
}

impl Default for DataSettings {
    fn default() -> Self { Self { corpus_path: "data/init.json".to_string(), index_dir: "data/indexes".to_string() } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub lexical_weight: f32,
    pub semantic_weight: f32,
    /// Candidates retrieved per semantic strategy before fusion.
    pub top_k: usize,
    /// A document found by only one pass must score strictly above this.
    pub min_single_signal: f32,
    pub docs_per_entity: usize,
    pub max_entities: usize,
    /// `None` (or `"auto"`) picks `latent_semantic` when a latent model is
    /// present, else `hybrid`.
    #[serde(deserialize_with = "strategy_or_auto")]
    pub strategy: Option<RankingStrategy>,
    pub embed_timeout_ms: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            lexical_weight: 0.5,
            semantic_weight: 0.5,
            top_k: 50,
            min_single_signal: 5.0,
            docs_per_entity: 5,
            max_entities: 10,
            strategy: None,
            embed_timeout_ms: 2000,
        }
    }
}

impl SearchSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.lexical_weight >= 0.0 && self.semantic_weight >= 0.0) {
            return Err(Error::InvalidConfig("search weights must be non-negative".into()));
        }
        if self.top_k == 0 || self.docs_per_entity == 0 || self.max_entities == 0 {
            return Err(Error::InvalidConfig("search.top_k, docs_per_entity and max_entities must be at least 1".into()));
        }
        if !self.min_single_signal.is_finite() {
            return Err(Error::InvalidConfig("search.min_single_signal must be finite".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatentSettings {
    /// Number of concept dimensions `k`.
    pub components: usize,
    /// Minimum number of documents a term must appear in.
    pub min_df: usize,
    /// Maximum share of documents a term may appear in.
    pub max_df: f32,
    pub oversample: usize,
    pub power_iterations: usize,
    pub seed: u64,
}

impl Default for LatentSettings {
    fn default() -> Self { Self { components: 30, min_df: 2, max_df: 0.5, oversample: 10, power_iterations: 4, seed: 42 } }
}

impl LatentSettings {
    pub fn validate(&self) -> Result<()> {
        if self.components == 0 { return Err(Error::InvalidConfig("latent.components must be at least 1".into())); }
        if !(self.max_df > 0.0 && self.max_df <= 1.0) { return Err(Error::InvalidConfig("latent.max_df must be in (0, 1]".into())); }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedSettings {
    pub model_dir: Option<String>,
    pub use_fake: bool,
    pub fake_dim: usize,
    pub batch_size: usize,
    pub max_len: usize,
}

impl Default for EmbedSettings {
    fn default() -> Self { Self { model_dir: None, use_fake: false, fake_dim: 384, batch_size: 32, max_len: 256 } }
}

fn strategy_or_auto<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<RankingStrategy>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("auto") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = AppConfig::default();
        settings.validate().unwrap();
        assert_eq!(settings.search.max_entities, 10);
        assert_eq!(settings.latent.components, 30);
    }

    #[test]
    fn toml_and_env_layers_override_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("streamfind.toml", "[search]\ntop_k = 20\nstrategy = \"lexical_only\"\n")?;
            jail.set_env("APP_SEARCH__DOCS_PER_ENTITY", "3");
            let config = Config::load().map_err(|e| e.to_string())?;
            let settings = config.settings().map_err(|e| e.to_string())?;
            assert_eq!(settings.search.top_k, 20);
            assert_eq!(settings.search.docs_per_entity, 3);
            assert_eq!(settings.search.strategy, Some(RankingStrategy::LexicalOnly));
            assert_eq!(settings.search.lexical_weight, 0.5);
            Ok(())
        });
    }

    #[test]
    fn auto_strategy_means_unset() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("streamfind.toml", "[search]\nstrategy = \"auto\"\n")?;
            let settings = Config::load().map_err(|e| e.to_string())?.settings().map_err(|e| e.to_string())?;
            assert_eq!(settings.search.strategy, None);

            jail.set_env("APP_SEARCH__STRATEGY", "hybrid");
            let settings = Config::load().map_err(|e| e.to_string())?.settings().map_err(|e| e.to_string())?;
            assert_eq!(settings.search.strategy, Some(RankingStrategy::Hybrid));

            jail.set_env("APP_SEARCH__STRATEGY", "AUTO");
            let settings = Config::load().map_err(|e| e.to_string())?.settings().map_err(|e| e.to_string())?;
            assert_eq!(settings.search.strategy, None);
            Ok(())
        });
    }

    #[test]
    fn unknown_strategy_is_invalid_config() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("streamfind.toml", "[search]\nstrategy = \"fastest\"\n")?;
            assert!(matches!(Config::load(), Err(Error::InvalidConfig(_))));
            Ok(())
        });
    }

    #[test]
    fn negative_weight_is_rejected() {
        let mut settings = AppConfig::default();
        settings.search.semantic_weight = -1.0;
        assert!(matches!(settings.validate(), Err(Error::InvalidConfig(_))));
    }
}
