//! Domain types used by the lexical, vector and latent engines.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Which platform a document was collected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    ShortPost,
    TitledPost,
    Summary,
    ProfileDescription,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::ShortPost => "short_post",
            SourceKind::TitledPost => "titled_post",
            SourceKind::Summary => "summary",
            SourceKind::ProfileDescription => "profile_description",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Position of a document inside a loaded `Corpus`.
///
/// Ids are dense (`0..corpus.len()`) and every persisted index artifact is
/// aligned to them, so a corpus change always means a full rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocId(pub u32);

impl DocId {
    pub fn index(self) -> usize { self.0 as usize }
}

/// Identity of a document inside its entity and source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StableId {
    /// Source-native id (e.g. a post id).
    Native(String),
    Position(usize),
}

impl fmt::Display for StableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StableId::Native(id) => f.write_str(id),
            StableId::Position(p) => write!(f, "#{p}"),
        }
    }
}

/// Canonical fusion key: `(source_kind, entity_name, stable_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocKey {
    pub kind: SourceKind,
    pub entity: String,
    pub stable_id: StableId,
}

/// One validated document. Each variant carries only the fields its source has.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source_kind", rename_all = "snake_case")]
pub enum Document {
    ShortPost { entity: String, position: usize, text: String },
    TitledPost { entity: String, position: usize, post_id: Option<String>, title: String, upvotes: i64 },
    Summary { entity: String, position: usize, text: String },
    ProfileDescription { entity: String, position: usize, text: String },
}

impl Document {
    pub fn kind(&self) -> SourceKind {
        match self {
            Document::ShortPost { .. } => SourceKind::ShortPost,
            Document::TitledPost { .. } => SourceKind::TitledPost,
            Document::Summary { .. } => SourceKind::Summary,
            Document::ProfileDescription { .. } => SourceKind::ProfileDescription,
        }
    }

    pub fn entity(&self) -> &str {
        match self {
            Document::ShortPost { entity, .. }
            | Document::TitledPost { entity, .. }
            | Document::Summary { entity, .. }
            | Document::ProfileDescription { entity, .. } => entity,
        }
    }

    pub fn position(&self) -> usize {
        match self {
            Document::ShortPost { position, .. }
            | Document::TitledPost { position, .. }
            | Document::Summary { position, .. }
            | Document::ProfileDescription { position, .. } => *position,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Document::TitledPost { title, .. } => title,
            Document::ShortPost { text, .. } | Document::Summary { text, .. } | Document::ProfileDescription { text, .. } => text,
        }
    }

    /// Popularity/priority signal: upvotes for titled posts, a fixed constant otherwise.
    pub fn source_weight(&self) -> f32 {
        match self {
            Document::TitledPost { upvotes, .. } => *upvotes as f32,
            Document::ShortPost { .. } => 1.0,
            Document::Summary { .. } => 2.0,
            Document::ProfileDescription { .. } => 3.0,
        }
    }

    pub fn stable_id(&self) -> StableId {
        match self {
            Document::TitledPost { post_id: Some(id), .. } => StableId::Native(id.clone()),
            other => StableId::Position(other.position()),
        }
    }

    pub fn key(&self) -> DocKey {
        DocKey { kind: self.kind(), entity: self.entity().to_string(), stable_id: self.stable_id() }
    }

    /// Text handed to the embedding model. Summaries and profile descriptions
    /// carry the entity name so that name-only queries land on them.
    pub fn embedding_text(&self) -> Cow<'_, str> {
        match self {
            Document::Summary { entity, text, .. } | Document::ProfileDescription { entity, text, .. } => {
                Cow::Owned(format!("{text} {entity}"))
            }
            other => Cow::Borrowed(other.text()),
        }
    }
}

/// A document with an engine-specific score. Higher is always better.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredDoc {
    pub doc: DocId,
    pub score: f32,
}

/// Which retrieval passes feed the fusion step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingStrategy {
    LexicalOnly,
    SemanticOnly,
    LatentSemantic,
    Hybrid,
}

impl RankingStrategy {
    pub fn uses_lexical(self) -> bool { !matches!(self, RankingStrategy::SemanticOnly) }
    pub fn uses_embeddings(self) -> bool { matches!(self, RankingStrategy::SemanticOnly | RankingStrategy::Hybrid) }
    pub fn uses_latent(self) -> bool { matches!(self, RankingStrategy::LatentSemantic) }
}

impl FromStr for RankingStrategy {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "lexical_only" | "lexical" => Ok(RankingStrategy::LexicalOnly),
            "semantic_only" | "semantic" => Ok(RankingStrategy::SemanticOnly),
            "latent_semantic" | "latent" => Ok(RankingStrategy::LatentSemantic),
            "hybrid" => Ok(RankingStrategy::Hybrid),
            other => Err(crate::Error::InvalidConfig(format!("unknown ranking strategy '{other}'"))),
        }
    }
}
