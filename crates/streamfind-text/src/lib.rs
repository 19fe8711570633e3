//! streamfind-text
//!
//! Lexical side of the engine: the shared tokenization rule (tantivy analyzer
//! pipeline) and an inverted index with keyword scoring over the corpus.
pub mod analyzer;
pub mod index;
pub mod search;

pub use analyzer::Analyzer;
pub use index::LexicalIndex;
