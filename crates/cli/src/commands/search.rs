//! Search command: keyword search over documents loaded for the session.

use clap::Args;
use sabaq_core::{AppConfig, AppResult};
use sabaq_retrieval::DocumentStore;
use std::path::PathBuf;

/// Keyword search over the given PDFs and text files.
///
/// Builds the in-memory document store for this invocation, so sources
/// must be passed explicitly.
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Search query
    query: String,

    /// PDF files to load
    #[arg(long)]
    pdf: Vec<PathBuf>,

    /// Plain text files to load
    #[arg(long)]
    text: Vec<PathBuf>,

    /// Number of results to return
    #[arg(long, default_value_t = 3)]
    top_k: usize,

    /// Minimum normalized score
    #[arg(long, default_value_t = 0.0)]
    min_score: f32,

    /// Rank by TF-IDF cosine similarity instead of keyword scoring
    #[arg(long)]
    semantic: bool,
}

impl SearchCommand {
    pub async fn execute(&self, _config: &AppConfig) -> AppResult<()> {
        let mut store = DocumentStore::new();

        for pdf_path in &self.pdf {
            let name = pdf_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("document");
            if !store.add_pdf(pdf_path, name) {
                tracing::warn!("Skipped unreadable PDF {:?}", pdf_path);
            }
        }

        for text_path in &self.text {
            let name = text_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("document")
                .to_string();
            let text = std::fs::read_to_string(text_path)?;
            store.add_text(&text, &name);
        }

        tracing::info!("Loaded {} document chunks", store.len());

        let results = if self.semantic {
            store.semantic_search(&self.query, self.top_k)
        } else {
            store.search(&self.query, self.top_k, self.min_score)
        };

        if results.is_empty() {
            println!("No matches.");
            return Ok(());
        }

        for (i, (doc, score)) in results.iter().enumerate() {
            println!("{}. [{:.3}] {}", i + 1, score, doc.source);
            let excerpt: String = doc.content.chars().take(200).collect();
            println!("   {}", excerpt.replace('\n', " "));
        }

        Ok(())
    }
}
