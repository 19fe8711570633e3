//! streamfind-vector
//!
//! Dense embedding index: vectors are built from the corpus with any
//! `Embedder`, searched exactly by inner product in memory, and persisted as a
//! Lance table plus a JSON metadata sidecar.
pub mod index;
pub mod schema;
pub mod store;

pub use index::{VectorEntry, VectorIndex};
