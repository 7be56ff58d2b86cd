//! Offline document retrieval for curriculum content, PDFs, and text.
//!
//! Provides an in-memory document store with two ranking paths: keyword
//! and metadata scoring (the default) and TF-IDF cosine similarity.
//! No network access and no model downloads.

pub mod chunker;
pub mod pdf;
pub mod store;
pub mod types;
pub mod vectorizer;

// Re-export commonly used types
pub use store::DocumentStore;
pub use types::{CurriculumTopic, Document, SourceType};
pub use vectorizer::{SparseVector, TfidfVectorizer};
