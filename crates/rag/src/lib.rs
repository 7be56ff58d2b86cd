//! Retrieval-augmented generation for the sabaq pipeline.
//!
//! Composes embedding providers, the vector store, and a
//! subprocess-isolated answer generator into a single query flow with an
//! always-answer degrade policy.

pub mod embeddings;
pub mod engine;
pub mod generate;
pub mod ollama;
pub mod prompt;

// Re-export commonly used types
pub use embeddings::{create_provider, EmbeddingProvider};
pub use engine::{IndexDocument, RagAnswer, RagEngine, RagSource, FALLBACK_PREFIX};
pub use generate::{AnswerGenerator, GeneratePayload, GenerateOutput, WorkerGenerator};
