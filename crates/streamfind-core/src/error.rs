use std::path::PathBuf;

use thiserror::Error;

use crate::types::SourceKind;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Corpus not found: {0}")]
    CorpusMissing(PathBuf),

    #[error("Corpus unreadable ({path}): {reason}")]
    CorpusUnreadable { path: String, reason: String },

    #[error("Index dimension mismatch: index has {index}, model produces {model}; rebuild required")]
    IndexDimensionMismatch { index: usize, model: usize },

    #[error("Index artifacts out of sync: {0}; rebuild required")]
    IndexMismatch(String),

    #[error("Malformed {kind} document for '{entity}' at position {position}: {reason}")]
    MalformedDocument { kind: SourceKind, entity: String, position: usize, reason: String },

    #[error("Embedding failed: {0}")]
    Encoding(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
