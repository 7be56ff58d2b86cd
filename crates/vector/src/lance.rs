//! LanceDB table plumbing: schema, record batches, row extraction.

use crate::payload::PayloadDocument;
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
};
use arrow_schema::{DataType, Field, Schema};
use lancedb::{Connection, Table};
use sabaq_core::{AppError, AppResult};
use std::path::Path;
use std::sync::Arc;

/// Connect to the LanceDB database under `db_path`.
pub async fn connect(db_path: &Path) -> AppResult<Connection> {
    std::fs::create_dir_all(db_path)
        .map_err(|e| AppError::Vector(format!("Failed to create db directory: {}", e)))?;

    let uri = db_path.to_string_lossy().to_string();
    lancedb::connect(&uri)
        .execute()
        .await
        .map_err(|e| AppError::Vector(format!("Failed to connect to LanceDB: {}", e)))
}

/// Open a collection table, creating it with an empty batch if missing.
pub async fn open_or_create_table(
    conn: &Connection,
    name: &str,
    embedding_dim: usize,
) -> AppResult<Table> {
    let table_names = conn
        .table_names()
        .execute()
        .await
        .map_err(|e| AppError::Vector(format!("Failed to list tables: {}", e)))?;

    if table_names.contains(&name.to_string()) {
        conn.open_table(name)
            .execute()
            .await
            .map_err(|e| AppError::Vector(format!("Failed to open table '{}': {}", name, e)))
    } else {
        let schema = collection_schema(embedding_dim);
        let empty_batch = RecordBatch::new_empty(schema.clone());

        conn.create_table(
            name,
            RecordBatchIterator::new(vec![Ok(empty_batch)], schema),
        )
        .execute()
        .await
        .map_err(|e| AppError::Vector(format!("Failed to create table '{}': {}", name, e)))
    }
}

/// Arrow schema for a collection table.
pub fn collection_schema(embedding_dim: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("content", DataType::Utf8, false),
        Field::new(
            "embedding",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, true)),
                embedding_dim as i32,
            ),
            false,
        ),
        Field::new("metadata", DataType::Utf8, false),
    ]))
}

/// Convert payload documents to a single RecordBatch.
pub fn documents_to_batch(
    documents: &[PayloadDocument],
    embedding_dim: usize,
) -> AppResult<RecordBatch> {
    let schema = collection_schema(embedding_dim);

    let mut ids = Vec::with_capacity(documents.len());
    let mut contents = Vec::with_capacity(documents.len());
    let mut metadata = Vec::with_capacity(documents.len());
    let mut embedding_values = Vec::with_capacity(documents.len() * embedding_dim);

    for doc in documents {
        if doc.embeddings.len() != embedding_dim {
            return Err(AppError::Vector(format!(
                "Embedding dimension mismatch for '{}': expected {}, got {}",
                doc.id,
                embedding_dim,
                doc.embeddings.len()
            )));
        }

        ids.push(doc.id.as_str());
        contents.push(doc.content.as_str());
        metadata.push(serde_json::to_string(&doc.metadata)?);
        embedding_values.extend_from_slice(&doc.embeddings);
    }

    let metadata_refs: Vec<&str> = metadata.iter().map(|s| s.as_str()).collect();

    let embedding_array = FixedSizeListArray::new(
        Arc::new(Field::new("item", DataType::Float32, true)),
        embedding_dim as i32,
        Arc::new(Float32Array::from(embedding_values)),
        None,
    );

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(StringArray::from(contents)),
            Arc::new(embedding_array),
            Arc::new(StringArray::from(metadata_refs)),
        ],
    )
    .map_err(|e| AppError::Vector(format!("Failed to create RecordBatch: {}", e)))
}

/// Append payload documents to a collection table.
pub async fn append_documents(
    table: &Table,
    documents: &[PayloadDocument],
    embedding_dim: usize,
) -> AppResult<()> {
    if documents.is_empty() {
        return Ok(());
    }

    let batch = documents_to_batch(documents, embedding_dim)?;
    let schema = batch.schema();

    table
        .add(RecordBatchIterator::new(vec![Ok(batch)], schema))
        .execute()
        .await
        .map_err(|e| AppError::Vector(format!("Failed to append documents: {}", e)))
}

/// A single row read back from a collection table.
#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub content: String,
    pub embedding: Vec<f32>,
    pub metadata: serde_json::Value,
}

/// Extract one row from a RecordBatch.
pub fn batch_to_record(batch: &RecordBatch, row_idx: usize) -> AppResult<StoredRecord> {
    let content = batch
        .column(1)
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| AppError::Vector("Invalid content column".to_string()))?
        .value(row_idx)
        .to_string();

    let embedding_list = batch
        .column(2)
        .as_any()
        .downcast_ref::<FixedSizeListArray>()
        .ok_or_else(|| AppError::Vector("Invalid embedding column".to_string()))?;

    let embedding_values = embedding_list.value(row_idx);
    let embedding_values = embedding_values
        .as_any()
        .downcast_ref::<Float32Array>()
        .ok_or_else(|| AppError::Vector("Invalid embedding values".to_string()))?;

    let embedding: Vec<f32> = (0..embedding_values.len())
        .map(|i| embedding_values.value(i))
        .collect();

    let metadata_json = batch
        .column(3)
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| AppError::Vector("Invalid metadata column".to_string()))?
        .value(row_idx);

    let metadata: serde_json::Value = serde_json::from_str(metadata_json)
        .map_err(|e| AppError::Vector(format!("Failed to parse metadata: {}", e)))?;

    Ok(StoredRecord {
        content,
        embedding,
        metadata,
    })
}

/// Cosine similarity between two dense vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_basic() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[0.0, 1.0])).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_documents_to_batch_and_back() {
        let docs = vec![
            PayloadDocument {
                id: "c_0".to_string(),
                content: "first".to_string(),
                embeddings: vec![1.0, 0.0, 0.0],
                metadata: serde_json::json!({"page": 1}),
            },
            PayloadDocument {
                id: "c_1".to_string(),
                content: "second".to_string(),
                embeddings: vec![0.0, 1.0, 0.0],
                metadata: serde_json::json!({"page": 2}),
            },
        ];

        let batch = documents_to_batch(&docs, 3).unwrap();
        assert_eq!(batch.num_rows(), 2);

        let record = batch_to_record(&batch, 1).unwrap();
        assert_eq!(record.content, "second");
        assert_eq!(record.embedding, vec![0.0, 1.0, 0.0]);
        assert_eq!(record.metadata["page"], 2);
    }

    #[test]
    fn test_documents_to_batch_dim_mismatch() {
        let docs = vec![PayloadDocument {
            id: "c_0".to_string(),
            content: "bad".to_string(),
            embeddings: vec![1.0, 0.0],
            metadata: serde_json::Value::Null,
        }];

        assert!(documents_to_batch(&docs, 3).is_err());
    }
}
