//! streamfind-hybrid
//!
//! Query-time orchestration: runs the lexical pass and one semantic pass
//! (embedding or latent) for the configured `RankingStrategy`, fuses the two
//! score sets per document and groups the survivors by entity.
pub mod context;
pub mod fusion;
pub mod result;
pub mod semantic;
pub mod service;

pub use context::SearchContext;
pub use fusion::FusionParams;
pub use result::{EntityResult, ResultDocument};
pub use service::SearchService;
