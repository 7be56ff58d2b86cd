//! Upload command: extract, chunk, and index PDF documents.

use clap::Args;
use sabaq_core::{AppConfig, AppError, AppResult};
use sabaq_rag::{IndexDocument, RagEngine};
use sabaq_retrieval::{chunker, pdf};
use serde::Serialize;
use std::path::Path;
use walkdir::WalkDir;

/// Characters per indexed chunk for uploaded PDFs.
const UPLOAD_CHUNK_SIZE: usize = 1000;

/// Upload one PDF or a directory of PDFs into the vector store.
#[derive(Args, Debug)]
pub struct UploadCommand {
    /// PDF file (or directory with --dir)
    path: std::path::PathBuf,

    /// Collection name (defaults to the file stem)
    #[arg(long)]
    collection: Option<String>,

    /// Treat the path as a directory and upload every PDF inside
    #[arg(long)]
    dir: bool,
}

/// Result of one upload, printed as JSON per file.
#[derive(Debug, Serialize)]
struct UploadReceipt {
    success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    collection_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    num_chunks: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl UploadCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let mut engine = super::build_engine(config).await?;

        if self.dir {
            if !self.path.is_dir() {
                return Err(AppError::Retrieval(format!(
                    "Not a directory: {:?}",
                    self.path
                )));
            }

            for entry in WalkDir::new(&self.path)
                .follow_links(false)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let entry_path = entry.path();
                let is_pdf = entry_path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
                if entry_path.is_file() && is_pdf {
                    let receipt = upload_pdf(&mut engine, entry_path, None).await;
                    print_receipt(&receipt)?;
                }
            }
        } else {
            let receipt = upload_pdf(&mut engine, &self.path, self.collection.as_deref()).await;
            print_receipt(&receipt)?;
        }

        Ok(())
    }
}

/// Extract, chunk, and index one PDF.
async fn upload_pdf(
    engine: &mut RagEngine,
    pdf_path: &Path,
    collection: Option<&str>,
) -> UploadReceipt {
    let default_name = pdf_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document")
        .to_string();
    let collection_name = collection.map(String::from).unwrap_or(default_name);

    let pages = match pdf::extract_pages(pdf_path) {
        Ok(pages) => pages,
        Err(e) => {
            return UploadReceipt {
                success: false,
                collection_name: None,
                num_chunks: None,
                error: Some(e.to_string()),
            };
        }
    };

    let mut documents = Vec::new();
    for (page_idx, page) in pages.iter().enumerate() {
        for chunk in chunker::chunk_text(page, UPLOAD_CHUNK_SIZE) {
            documents.push(IndexDocument {
                content: chunk,
                metadata: serde_json::json!({
                    "page": page_idx + 1,
                    "document": collection_name,
                }),
            });
        }
    }

    let num_chunks = documents.len();
    match engine.index_documents(&collection_name, documents).await {
        Ok(sanitized) => {
            tracing::info!("Indexed '{}' as '{}'", collection_name, sanitized);
            UploadReceipt {
                success: true,
                collection_name: Some(sanitized),
                num_chunks: Some(num_chunks),
                error: None,
            }
        }
        Err(e) => UploadReceipt {
            success: false,
            collection_name: Some(collection_name),
            num_chunks: None,
            error: Some(e.to_string()),
        },
    }
}

fn print_receipt(receipt: &UploadReceipt) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(receipt)?);
    Ok(())
}
