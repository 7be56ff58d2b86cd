//! Wire types for the vector insert worker.
//!
//! The worker is invoked as `sabaq-vector-worker <db_path> <payload_json>`
//! and reads a [`WorkerPayload`] from the payload file. Exit code 0 means
//! the insert succeeded; 2 means the storage backend could not be
//! initialized; 3 means a runtime failure. Diagnostics go to stderr.

use serde::{Deserialize, Serialize};

/// Worker exited successfully.
pub const EXIT_OK: i32 = 0;

/// Worker could not initialize the storage backend.
pub const EXIT_BACKEND_UNAVAILABLE: i32 = 2;

/// Worker failed while inserting.
pub const EXIT_RUNTIME_FAILURE: i32 = 3;

/// Payload handed to the vector insert worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerPayload {
    /// Sanitized collection name
    pub collection_name: String,

    /// Documents to insert
    pub documents: Vec<PayloadDocument>,
}

/// A single document record in the worker payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadDocument {
    /// Record id, unique within the collection
    pub id: String,

    /// Text content
    pub content: String,

    /// Embedding vector
    pub embeddings: Vec<f32>,

    /// Free-form metadata
    #[serde(default)]
    pub metadata: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_round_trip() {
        let payload = WorkerPayload {
            collection_name: "pets".to_string(),
            documents: vec![PayloadDocument {
                id: "pets_0".to_string(),
                content: "The cat sat on the mat".to_string(),
                embeddings: vec![0.1, 0.2, 0.3],
                metadata: serde_json::json!({"source": "pets"}),
            }],
        };

        let json = serde_json::to_string(&payload).unwrap();
        let back: WorkerPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back.collection_name, "pets");
        assert_eq!(back.documents.len(), 1);
        assert_eq!(back.documents[0].embeddings.len(), 3);
    }

    #[test]
    fn test_payload_missing_metadata_defaults() {
        let json = r#"{"collection_name":"c","documents":[{"id":"c_0","content":"x","embeddings":[1.0]}]}"#;
        let payload: WorkerPayload = serde_json::from_str(json).unwrap();
        assert!(payload.documents[0].metadata.is_null());
    }
}
