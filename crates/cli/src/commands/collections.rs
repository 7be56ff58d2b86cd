//! Collections command: list persisted collections.

use clap::Args;
use sabaq_core::{AppConfig, AppResult};

/// List collections persisted under the workspace vector database.
#[derive(Args, Debug)]
pub struct CollectionsCommand {}

impl CollectionsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let engine = super::build_engine(config).await?;
        let store = engine.vector_store();

        let names = store.persisted_collections().await?;

        if names.is_empty() {
            println!("No collections.");
            return Ok(());
        }

        for name in names {
            let storage = if store.fallback_path(&name).exists() {
                "fallback"
            } else {
                "engine"
            };
            println!("{}  [{}]", name, storage);
        }

        Ok(())
    }
}
