//! Embedding generation for the RAG pipeline.
//!
//! Provider-agnostic embedding behind the [`EmbeddingProvider`] trait,
//! selected by configuration.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
