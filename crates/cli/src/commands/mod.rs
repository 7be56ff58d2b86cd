//! CLI command implementations.

mod ask;
mod collections;
mod search;
mod upload;

pub use ask::AskCommand;
pub use collections::CollectionsCommand;
pub use search::SearchCommand;
pub use upload::UploadCommand;

use sabaq_core::{AppConfig, AppResult};
use sabaq_rag::{RagEngine, WorkerGenerator};
use sabaq_vector::VectorStore;
use std::time::Duration;

/// Build the RAG engine from configuration.
///
/// All services are constructed here and passed down by value; there are
/// no process-wide singletons.
pub(crate) async fn build_engine(config: &AppConfig) -> AppResult<RagEngine> {
    let embedder = sabaq_rag::create_provider(&config.embedding)?;

    let vector_store = VectorStore::new(
        config.vector_db_path(),
        config.workers.vector_worker_path()?,
        Duration::from_secs(config.workers.vector_timeout_secs),
        config.embedding.dimensions,
    )
    .await?;

    let generator = WorkerGenerator::new(
        config.workers.generate_worker_path()?,
        Duration::from_secs(config.generation.timeout_secs),
    )
    .with_env("SABAQ_GEN_ENDPOINT", &config.generation.endpoint)
    .with_env("SABAQ_GEN_MODEL", &config.generation.model);

    Ok(RagEngine::new(
        embedder,
        vector_store,
        Box::new(generator),
        config.generation.max_new_tokens,
    ))
}
