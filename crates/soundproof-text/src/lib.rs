//! soundproof-text
//!
//! TF-IDF corpus index and cosine-similarity matcher over the remediation
//! catalog. Build a [`CorpusIndex`] once, then call [`search`] per diagnosis.

pub mod tokenizer;
pub mod index;
pub mod search;

pub use index::{CorpusIndex, SparseVector, Vocabulary};
pub use search::{search, DEFAULT_TOP_K};
pub use tokenizer::Analyzer;
