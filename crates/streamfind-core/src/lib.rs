//! streamfind-core
//!
//! Shared document/entity model, corpus snapshot loading, configuration and
//! the error taxonomy used by every engine crate in the workspace.

pub mod config;
pub mod corpus;
pub mod error;
pub mod scoring;
pub mod traits;
pub mod types;

pub use corpus::Corpus;
pub use error::{Error, Result};
pub use types::{DocId, DocKey, Document, RankingStrategy, ScoredDoc, SourceKind, StableId};
