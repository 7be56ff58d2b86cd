//! Ask command: full RAG query against an indexed collection.

use clap::Args;
use sabaq_core::{AppConfig, AppResult};

/// Ask a question against an indexed collection.
#[derive(Args, Debug)]
pub struct AskCommand {
    /// Collection to query
    collection: String,

    /// The question to answer
    question: String,

    /// Number of documents to retrieve
    #[arg(long, default_value_t = 3)]
    top_k: usize,

    /// Print the full result as JSON instead of plain text
    #[arg(long)]
    json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let engine = super::build_engine(config).await?;

        let result = engine
            .query(&self.collection, &self.question, self.top_k)
            .await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
            return Ok(());
        }

        println!("{}", result.answer);

        if !result.sources.is_empty() {
            println!();
            println!("Sources ({} retrieved):", result.num_retrieved);
            for (i, source) in result.sources.iter().enumerate() {
                println!("  {}. {}", i + 1, source.content.replace('\n', " "));
            }
        }

        Ok(())
    }
}
