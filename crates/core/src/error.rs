//! Error types for the sabaq retrieval pipeline.
//!
//! This module defines a unified error enum covering all error categories
//! in the system: configuration, I/O, document extraction, vector storage,
//! embeddings, and answer generation.

use thiserror::Error;

/// Unified error type for the sabaq pipeline.
///
/// All fallible functions return `Result<T, AppError>`.
/// We never panic — errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document extraction and local retrieval errors
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Vector store errors (collections, inserts, search)
    #[error("Vector store error: {0}")]
    Vector(String),

    /// Embedding generation errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Answer generation errors (worker spawn, timeout, bad output)
    #[error("Generation error: {0}")]
    Generation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
