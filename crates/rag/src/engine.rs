//! RAG orchestration: indexing, retrieval, and answer generation.

use crate::embeddings::EmbeddingProvider;
use crate::generate::AnswerGenerator;
use crate::prompt;
use sabaq_core::{AppError, AppResult};
use sabaq_vector::{PayloadDocument, QueryResult, VectorStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Prefix marking an extractive fallback answer.
pub const FALLBACK_PREFIX: &str = "(Fallback) ";

/// Characters of context returned in a fallback answer.
const FALLBACK_CONTEXT_CHARS: usize = 400;

/// Characters of source content included per answer source.
const SOURCE_EXCERPT_CHARS: usize = 200;

/// Answer returned when retrieval finds nothing.
const NO_DOCUMENTS_ANSWER: &str = "No relevant documents found.";

/// A document to be indexed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDocument {
    pub content: String,

    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// A source reference attached to an answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagSource {
    /// Source content excerpt (truncated)
    pub content: String,

    /// Source metadata
    pub metadata: serde_json::Value,
}

/// Result of a full RAG query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagAnswer {
    pub answer: String,
    pub sources: Vec<RagSource>,
    pub question: String,
    pub num_retrieved: usize,
}

/// RAG engine composing embeddings, the vector store, and generation.
///
/// Constructed once at startup and passed to consumers; holds no global
/// state.
pub struct RagEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    vector_store: VectorStore,
    generator: Box<dyn AnswerGenerator>,
    max_new_tokens: u32,
}

impl RagEngine {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        vector_store: VectorStore,
        generator: Box<dyn AnswerGenerator>,
        max_new_tokens: u32,
    ) -> Self {
        Self {
            embedder,
            vector_store,
            generator,
            max_new_tokens,
        }
    }

    /// Access the underlying vector store.
    pub fn vector_store(&self) -> &VectorStore {
        &self.vector_store
    }

    /// Embed and index documents into a collection.
    ///
    /// Returns the sanitized collection name actually used. Insertion
    /// failures are wrapped with the collection context and propagated;
    /// there is no partial-success signaling beyond that.
    ///
    /// The store registers the collection only after a successful
    /// insert, so a failed insert leaves searches on the fallback path
    /// instead of an empty engine collection.
    pub async fn index_documents(
        &mut self,
        collection_name: &str,
        documents: Vec<IndexDocument>,
    ) -> AppResult<String> {
        let sanitized = sabaq_vector::sanitize_collection_name(collection_name);

        let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let payload_docs: Vec<PayloadDocument> = documents
            .into_iter()
            .zip(embeddings)
            .map(|(doc, embeddings)| PayloadDocument {
                id: uuid::Uuid::new_v4().to_string(),
                content: doc.content,
                embeddings,
                metadata: doc.metadata,
            })
            .collect();

        let count = payload_docs.len();
        self.vector_store
            .add_documents(&sanitized, payload_docs)
            .await
            .map_err(|e| {
                AppError::Vector(format!("Failed to index into '{}': {}", sanitized, e))
            })?;

        tracing::info!("Indexed {} documents into '{}'", count, sanitized);
        Ok(sanitized)
    }

    /// Retrieve the `top_k` most relevant documents for a query.
    pub async fn retrieve(
        &self,
        collection_name: &str,
        query: &str,
        top_k: usize,
    ) -> AppResult<Vec<QueryResult>> {
        let query_embedding = self.embedder.embed(query).await?;
        Ok(self
            .vector_store
            .search(collection_name, &query_embedding, top_k)
            .await)
    }

    /// Generate an answer for a question given retrieved context.
    ///
    /// Never fails: any generation error (worker crash, timeout, bad
    /// output) degrades to an extractive answer built from the context.
    /// The pipeline must always answer something.
    pub async fn generate_answer(&self, context: &str, question: &str) -> String {
        let result = match prompt::render_qa_prompt(context, question) {
            Ok(rendered) => self.generator.generate(&rendered, self.max_new_tokens).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!("Answer generation degraded to extractive fallback: {}", e);
                let excerpt: String = context.chars().take(FALLBACK_CONTEXT_CHARS).collect();
                format!("{}{}", FALLBACK_PREFIX, excerpt.trim())
            }
        }
    }

    /// Complete RAG pipeline: retrieve then generate.
    ///
    /// When retrieval is empty the generation step is skipped entirely
    /// and `num_retrieved` is 0.
    pub async fn query(
        &self,
        collection_name: &str,
        question: &str,
        top_k: usize,
    ) -> AppResult<RagAnswer> {
        let retrieved = self.retrieve(collection_name, question, top_k).await?;

        if retrieved.is_empty() {
            tracing::info!("No documents retrieved for '{}'", collection_name);
            return Ok(RagAnswer {
                answer: NO_DOCUMENTS_ANSWER.to_string(),
                sources: vec![],
                question: question.to_string(),
                num_retrieved: 0,
            });
        }

        let context = retrieved
            .iter()
            .map(|doc| doc.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let answer = self.generate_answer(&context, question).await;

        let sources = retrieved
            .iter()
            .map(|doc| RagSource {
                content: doc.content.chars().take(SOURCE_EXCERPT_CHARS).collect(),
                metadata: doc.metadata.clone(),
            })
            .collect();

        let num_retrieved = retrieved.len();
        Ok(RagAnswer {
            answer,
            sources,
            question: question.to_string(),
            num_retrieved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::mock::MockProvider;
    use crate::embeddings::providers::trigram::TrigramProvider;
    use sabaq_core::AppError;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingGenerator {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl AnswerGenerator for CountingGenerator {
        async fn generate(&self, _prompt: &str, _max_new_tokens: u32) -> AppResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("generated answer".to_string())
        }
    }

    struct FailingGenerator;

    #[async_trait::async_trait]
    impl AnswerGenerator for FailingGenerator {
        async fn generate(&self, _prompt: &str, _max_new_tokens: u32) -> AppResult<String> {
            Err(AppError::Generation("worker crashed".to_string()))
        }
    }

    async fn vector_store(dir: &Path, dim: usize) -> VectorStore {
        // Worker path is intentionally unavailable so inserts land in
        // the JSON fallback path, which keeps tests hermetic
        VectorStore::new(
            dir.join("vector_db"),
            PathBuf::from("/nonexistent/sabaq-vector-worker"),
            Duration::from_secs(5),
            dim,
        )
        .await
        .unwrap()
    }

    fn docs(contents: &[&str]) -> Vec<IndexDocument> {
        contents
            .iter()
            .map(|c| IndexDocument {
                content: c.to_string(),
                metadata: serde_json::Value::Null,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_query_empty_retrieval_skips_generation() {
        let temp = tempfile::TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = RagEngine::new(
            Arc::new(MockProvider::new(16)),
            vector_store(temp.path(), 16).await,
            Box::new(CountingGenerator {
                calls: Arc::clone(&calls),
            }),
            64,
        );

        let result = engine.query("empty-collection", "anything?", 3).await.unwrap();

        assert_eq!(result.num_retrieved, 0);
        assert_eq!(result.answer, "No relevant documents found.");
        assert!(result.sources.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_query_invokes_generator_once() {
        let temp = tempfile::TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut engine = RagEngine::new(
            Arc::new(MockProvider::new(16)),
            vector_store(temp.path(), 16).await,
            Box::new(CountingGenerator {
                calls: Arc::clone(&calls),
            }),
            64,
        );

        engine
            .index_documents("pets", docs(&["The cat sat on the mat", "Dogs bark loudly"]))
            .await
            .unwrap();

        let result = engine.query("pets", "where did the cat sit?", 3).await.unwrap();

        assert_eq!(result.num_retrieved, 2);
        assert_eq!(result.answer, "generated answer");
        assert_eq!(result.sources.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_query_source_excerpts_truncated() {
        let temp = tempfile::TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut engine = RagEngine::new(
            Arc::new(MockProvider::new(16)),
            vector_store(temp.path(), 16).await,
            Box::new(CountingGenerator { calls }),
            64,
        );

        let long_content = "x".repeat(600);
        engine
            .index_documents("long", docs(&[long_content.as_str()]))
            .await
            .unwrap();

        let result = engine.query("long", "question?", 1).await.unwrap();
        assert_eq!(result.sources[0].content.chars().count(), 200);
    }

    #[tokio::test]
    async fn test_generate_answer_fallback_on_failure() {
        let temp = tempfile::TempDir::new().unwrap();
        let engine = RagEngine::new(
            Arc::new(MockProvider::new(16)),
            vector_store(temp.path(), 16).await,
            Box::new(FailingGenerator),
            64,
        );

        let context = "The water cycle describes how water evaporates. ".repeat(20);
        let answer = engine.generate_answer(&context, "what is it?").await;

        assert!(answer.starts_with(FALLBACK_PREFIX));
        let expected_excerpt: String = context.chars().take(400).collect();
        assert!(answer.contains(expected_excerpt.trim()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_generate_answer_fallback_on_worker_timeout() {
        use crate::generate::WorkerGenerator;
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::TempDir::new().unwrap();
        let worker = temp.path().join("slow-worker.sh");
        std::fs::write(&worker, "#!/bin/sh\nsleep 5\n").unwrap();
        std::fs::set_permissions(&worker, std::fs::Permissions::from_mode(0o755)).unwrap();

        let engine = RagEngine::new(
            Arc::new(MockProvider::new(16)),
            vector_store(temp.path(), 16).await,
            Box::new(WorkerGenerator::new(worker, Duration::from_millis(100))),
            64,
        );

        let context = "Chapter one covers the structure of the atom in detail. ".repeat(20);
        let answer = engine.generate_answer(&context, "what is covered?").await;

        assert!(answer.starts_with(FALLBACK_PREFIX));
        let expected_excerpt: String = context.chars().take(400).collect();
        assert!(answer.contains(expected_excerpt.trim()));
    }

    #[tokio::test]
    async fn test_retrieve_pets_scenario() {
        let temp = tempfile::TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut engine = RagEngine::new(
            Arc::new(TrigramProvider::new(384)),
            vector_store(temp.path(), 384).await,
            Box::new(CountingGenerator { calls }),
            64,
        );

        engine
            .index_documents("pets", docs(&["The cat sat on the mat", "Dogs bark loudly"]))
            .await
            .unwrap();

        let results = engine.retrieve("pets", "cat mat", 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "The cat sat on the mat");
    }
}
