//! streamfind-latent
//!
//! Latent-semantic ranking: a TF-IDF term/document matrix factored with a
//! randomized truncated SVD into a small concept space. Queries are projected
//! into the same space and compared by cosine similarity.
pub mod model;
pub mod svd;
pub mod tfidf;

pub use model::{ConceptContribution, LatentHit, LatentModel};
pub use tfidf::TfidfVectorizer;
