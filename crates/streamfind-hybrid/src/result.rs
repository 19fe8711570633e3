use serde::{Deserialize, Serialize};

use streamfind_core::{SourceKind, StableId};
use streamfind_latent::ConceptContribution;

const PREVIEW_CHARS: usize = 150;

/// One representative document inside an entity's result group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultDocument {
    pub source_kind: SourceKind,
    pub preview: String,
    /// Fused score.
    pub score: f32,
    pub stable_id: StableId,
    pub source_weight: f32,
    /// Latent concepts behind the match, strongest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub concepts: Vec<ConceptContribution>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityResult {
    pub name: String,
    /// Highest fused score among the entity's documents.
    pub top_score: f32,
    pub documents: Vec<ResultDocument>,
}

/// First 150 characters, with `...` appended when anything was cut.
pub fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
