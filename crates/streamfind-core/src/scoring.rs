//! Score components shared by the lexical and semantic passes.
use crate::types::SourceKind;

pub const TERM_MATCH_POINTS: f32 = 15.0;
pub const LEXICAL_FREQUENCY_POINTS: f32 = 5.0;
pub const LEXICAL_PHRASE_BONUS: f32 = 50.0;
pub const SEMANTIC_PHRASE_BONUS: f32 = 30.0;
pub const SEMANTIC_FREQUENCY_POINTS: f32 = 1.0;

/// Per-source boost; titled posts scale with upvotes up to 20 points.
pub fn source_bonus(kind: SourceKind, source_weight: f32) -> f32 {
    match kind {
        SourceKind::TitledPost => (source_weight / 500.0).min(20.0),
        SourceKind::Summary => 15.0,
        SourceKind::ProfileDescription => 10.0,
        SourceKind::ShortPost => 0.0,
    }
}

/// Non-overlapping occurrences of `needle` in `haystack` (both already lowercased).
pub fn occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() { return 0; }
    haystack.matches(needle).count()
}
