//! PDF text extraction.

use sabaq_core::{AppError, AppResult};
use std::path::Path;

/// Extract text from a PDF, split per page.
///
/// The extractor emits a form feed between pages; pages that yield no
/// text are dropped. Returns an error when the file cannot be parsed
/// at all.
pub fn extract_pages(path: &Path) -> AppResult<Vec<String>> {
    let text = pdf_extract::extract_text(path)
        .map_err(|e| AppError::Retrieval(format!("PDF extraction failed for {:?}: {}", path, e)))?;

    let pages: Vec<String> = text
        .split('\u{000C}')
        .filter(|page| !page.trim().is_empty())
        .map(|page| page.to_string())
        .collect();

    tracing::debug!("Extracted {} non-empty pages from {:?}", pages.len(), path);

    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_missing_file() {
        let result = extract_pages(Path::new("/nonexistent/file.pdf"));
        assert!(result.is_err());
    }

    #[test]
    fn test_extract_invalid_pdf() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), b"not a pdf").unwrap();
        let result = extract_pages(temp.path());
        assert!(result.is_err());
    }
}
