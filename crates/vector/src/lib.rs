//! Persistent vector storage for the sabaq pipeline.
//!
//! Wraps a LanceDB database with sanitized collection naming,
//! subprocess-isolated inserts, and a JSON fallback path used when the
//! engine or its worker is unavailable.

pub mod lance;
pub mod payload;
pub mod sanitize;
pub mod store;

// Re-export commonly used types
pub use payload::{PayloadDocument, WorkerPayload};
pub use sanitize::sanitize_collection_name;
pub use store::{CollectionStats, QueryResult, VectorStore};
