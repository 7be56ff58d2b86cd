//! Persistent vector store with subprocess-isolated writes.
//!
//! Inserts run in a dedicated worker process so native-library crashes
//! cannot take down the caller. When the worker fails for any reason the
//! payload is persisted verbatim as a JSON fallback file, and searches
//! against that collection fall back to brute-force cosine similarity
//! over the stored embeddings.

use crate::lance;
use crate::payload::{PayloadDocument, WorkerPayload};
use crate::sanitize::sanitize_collection_name;
use chrono::{DateTime, Utc};
use lancedb::{Connection, Table};
use sabaq_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

/// A search hit from the vector store.
///
/// `distance` is `1 - cosine_similarity` on both the engine and the
/// fallback path, so lower is better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub content: String,
    pub metadata: serde_json::Value,
    pub distance: f32,
}

/// Statistics for a registered collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionStats {
    pub name: String,
    pub count: usize,
    pub created_at: DateTime<Utc>,
}

struct RegisteredCollection {
    table: Table,
    created_at: DateTime<Utc>,
}

/// Vector store over a LanceDB database directory.
pub struct VectorStore {
    db_path: PathBuf,
    conn: Connection,
    worker_path: PathBuf,
    worker_timeout: Duration,
    embedding_dim: usize,
    collections: HashMap<String, RegisteredCollection>,
}

impl VectorStore {
    /// Open (or create) the vector database under `db_path`.
    ///
    /// `worker_path` is the insert worker binary; `worker_timeout` bounds
    /// each insert invocation.
    pub async fn new(
        db_path: impl Into<PathBuf>,
        worker_path: PathBuf,
        worker_timeout: Duration,
        embedding_dim: usize,
    ) -> AppResult<Self> {
        let db_path = db_path.into();
        let conn = lance::connect(&db_path).await?;

        Ok(Self {
            db_path,
            conn,
            worker_path,
            worker_timeout,
            embedding_dim,
            collections: HashMap::new(),
        })
    }

    /// Sanitize `name` and get-or-create the collection under the
    /// sanitized name, registering it in-process. Returns the sanitized
    /// name actually used for storage.
    pub async fn create_collection(&mut self, name: &str) -> AppResult<String> {
        let sanitized = sanitize_collection_name(name);
        if sanitized != name {
            tracing::info!("Collection name sanitized: '{}' -> '{}'", name, sanitized);
        }

        if !self.collections.contains_key(&sanitized) {
            let table =
                lance::open_or_create_table(&self.conn, &sanitized, self.embedding_dim).await?;
            self.collections.insert(
                sanitized.clone(),
                RegisteredCollection {
                    table,
                    created_at: Utc::now(),
                },
            );
        }

        Ok(sanitized)
    }

    /// Add documents to a collection via the insert worker.
    ///
    /// The payload is written to `<db_path>/_payloads/` and the worker is
    /// spawned with a bounded timeout. On success the collection is
    /// registered so subsequent searches go to the engine rather than a
    /// stale fallback. On any worker failure the payload is persisted to
    /// `<db_path>/fallback/<collection>.json` and the call still
    /// succeeds; an error is returned only when the fallback write fails
    /// too.
    pub async fn add_documents(
        &mut self,
        collection_name: &str,
        documents: Vec<PayloadDocument>,
    ) -> AppResult<()> {
        let sanitized = sanitize_collection_name(collection_name);

        let documents: Vec<PayloadDocument> = documents
            .into_iter()
            .enumerate()
            .map(|(i, mut doc)| {
                let base = if doc.id.is_empty() {
                    i.to_string()
                } else {
                    doc.id.clone()
                };
                doc.id = format!("{}_{}", sanitized, base);
                if doc.metadata.is_null() {
                    doc.metadata = serde_json::json!({
                        "source": sanitized,
                        "doc_index": i,
                    });
                }
                doc
            })
            .collect();

        let payload = WorkerPayload {
            collection_name: sanitized.clone(),
            documents,
        };

        match self.insert_via_worker(&sanitized, &payload).await {
            Ok(()) => {
                // Register so searches do not fall through to a stale
                // or absent fallback file
                self.create_collection(&sanitized).await?;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    "Vector worker insert failed for '{}', persisting fallback: {}",
                    sanitized,
                    e
                );
                self.write_fallback(&sanitized, &payload).map_err(|e2| {
                    AppError::Vector(format!(
                        "Failed to add documents to vector store and fallback failed: {}; fallback error: {}",
                        e, e2
                    ))
                })?;
                Ok(())
            }
        }
    }

    /// Search a collection for the `top_k` nearest documents.
    ///
    /// Registered collections are queried through the engine; otherwise a
    /// fallback JSON file is searched by brute-force cosine similarity.
    /// Backend failures degrade to the fallback file and then to an empty
    /// result set, logged at warn.
    pub async fn search(
        &self,
        collection_name: &str,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Vec<QueryResult> {
        let sanitized = sanitize_collection_name(collection_name);

        if let Some(registered) = self.collections.get(&sanitized) {
            match self
                .search_registered(&registered.table, query_embedding, top_k)
                .await
            {
                Ok(results) => return results,
                Err(e) => {
                    tracing::warn!(
                        "Engine search failed for '{}', trying fallback: {}",
                        sanitized,
                        e
                    );
                }
            }
        }

        self.search_fallback(&sanitized, query_embedding, top_k)
    }

    /// Names of all registered collections.
    pub fn list_collections(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.keys().cloned().collect();
        names.sort();
        names
    }

    /// Statistics for a registered collection, or None if unknown.
    pub async fn collection_stats(&self, name: &str) -> AppResult<Option<CollectionStats>> {
        let sanitized = sanitize_collection_name(name);

        let Some(registered) = self.collections.get(&sanitized) else {
            return Ok(None);
        };

        let count = registered
            .table
            .count_rows(None)
            .await
            .map_err(|e| AppError::Vector(format!("Failed to count rows: {}", e)))?;

        Ok(Some(CollectionStats {
            name: sanitized,
            count,
            created_at: registered.created_at,
        }))
    }

    /// Collection names persisted on disk: engine tables plus fallback
    /// files. Unlike [`Self::list_collections`], this survives process
    /// restarts.
    pub async fn persisted_collections(&self) -> AppResult<Vec<String>> {
        let mut names = self
            .conn
            .table_names()
            .execute()
            .await
            .map_err(|e| AppError::Vector(format!("Failed to list tables: {}", e)))?;

        let fallback_dir = self.db_path.join("fallback");
        if fallback_dir.exists() {
            for entry in std::fs::read_dir(&fallback_dir)
                .map_err(|e| AppError::Vector(format!("Failed to read fallback dir: {}", e)))?
            {
                let entry =
                    entry.map_err(|e| AppError::Vector(format!("Failed to read entry: {}", e)))?;
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    if !names.iter().any(|n| n == stem) {
                        names.push(stem.to_string());
                    }
                }
            }
        }

        names.sort();
        Ok(names)
    }

    /// Path of the fallback file for a sanitized collection name.
    pub fn fallback_path(&self, sanitized: &str) -> PathBuf {
        self.db_path.join("fallback").join(format!("{}.json", sanitized))
    }

    async fn insert_via_worker(&self, sanitized: &str, payload: &WorkerPayload) -> AppResult<()> {
        let payload_dir = self.db_path.join("_payloads");
        std::fs::create_dir_all(&payload_dir)
            .map_err(|e| AppError::Vector(format!("Failed to create payload directory: {}", e)))?;

        let payload_path = payload_dir.join(format!("payload_{}.json", sanitized));
        let json = serde_json::to_string(payload)?;
        std::fs::write(&payload_path, json)
            .map_err(|e| AppError::Vector(format!("Failed to write payload: {}", e)))?;

        self.run_worker(&payload_path).await
    }

    async fn run_worker(&self, payload_path: &Path) -> AppResult<()> {
        let mut cmd = tokio::process::Command::new(&self.worker_path);
        cmd.arg(&self.db_path)
            .arg(payload_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            AppError::Vector(format!(
                "Failed to spawn vector worker {:?}: {}",
                self.worker_path, e
            ))
        })?;

        let output = tokio::time::timeout(self.worker_timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                AppError::Vector(format!(
                    "Vector worker timed out after {}s",
                    self.worker_timeout.as_secs()
                ))
            })?
            .map_err(|e| AppError::Vector(format!("Vector worker I/O failure: {}", e)))?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let diagnostics = if stderr.trim().is_empty() { stdout } else { stderr };
            return Err(AppError::Vector(format!(
                "Vector worker failed with code {}: {}",
                code,
                diagnostics.trim()
            )));
        }

        Ok(())
    }

    fn write_fallback(&self, sanitized: &str, payload: &WorkerPayload) -> AppResult<PathBuf> {
        let fallback_dir = self.db_path.join("fallback");
        std::fs::create_dir_all(&fallback_dir)
            .map_err(|e| AppError::Vector(format!("Failed to create fallback directory: {}", e)))?;

        let final_path = self.fallback_path(sanitized);

        // Write to a temp file and rename so a concurrent reader never
        // sees a half-written payload
        let tmp = tempfile::NamedTempFile::new_in(&fallback_dir)
            .map_err(|e| AppError::Vector(format!("Failed to create fallback temp file: {}", e)))?;
        serde_json::to_writer(&tmp, payload)?;
        tmp.persist(&final_path)
            .map_err(|e| AppError::Vector(format!("Failed to persist fallback file: {}", e)))?;

        tracing::info!("Persisted fallback payload at {:?}", final_path);
        Ok(final_path)
    }

    async fn search_registered(
        &self,
        table: &Table,
        query_embedding: &[f32],
        top_k: usize,
    ) -> AppResult<Vec<QueryResult>> {
        use futures::TryStreamExt;
        use lancedb::query::{ExecutableQuery, QueryBase};

        let batches = table
            .query()
            .nearest_to(query_embedding.to_vec())
            .map_err(|e| AppError::Vector(format!("Failed to create query: {}", e)))?
            .limit(top_k)
            .execute()
            .await
            .map_err(|e| AppError::Vector(format!("Failed to execute search: {}", e)))?
            .try_collect::<Vec<_>>()
            .await
            .map_err(|e| AppError::Vector(format!("Failed to collect results: {}", e)))?;

        let mut results = Vec::new();
        for batch in &batches {
            for row_idx in 0..batch.num_rows() {
                let record = match lance::batch_to_record(batch, row_idx) {
                    Ok(record) => record,
                    Err(e) => {
                        tracing::warn!("Skipping unreadable row {}: {}", row_idx, e);
                        continue;
                    }
                };

                let similarity = lance::cosine_similarity(query_embedding, &record.embedding);
                results.push(QueryResult {
                    content: record.content,
                    metadata: record.metadata,
                    distance: 1.0 - similarity,
                });
            }
        }

        results.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal));
        results.truncate(top_k);

        tracing::debug!("Engine search returned {} results (top-{})", results.len(), top_k);
        Ok(results)
    }

    fn search_fallback(
        &self,
        sanitized: &str,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Vec<QueryResult> {
        let path = self.fallback_path(sanitized);
        if !path.exists() {
            return vec![];
        }

        let data = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Failed to read fallback file {:?}: {}", path, e);
                return vec![];
            }
        };

        let payload: WorkerPayload = match serde_json::from_str(&data) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("Malformed fallback file {:?}: {}", path, e);
                return vec![];
            }
        };

        let mut scored: Vec<(usize, f32)> = payload
            .documents
            .iter()
            .enumerate()
            .map(|(idx, doc)| {
                (idx, lance::cosine_similarity(query_embedding, &doc.embeddings))
            })
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(top_k);

        scored
            .into_iter()
            .map(|(idx, similarity)| QueryResult {
                content: payload.documents[idx].content.clone(),
                metadata: payload.documents[idx].metadata.clone(),
                distance: 1.0 - similarity,
            })
            .collect()
    }
}
