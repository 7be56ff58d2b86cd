//! Fixed-size character chunking.

/// Split text into fixed-size character chunks with no overlap.
///
/// Chunk boundaries are pushed back to valid UTF-8 boundaries, so a
/// chunk may be slightly shorter than `chunk_size` bytes. Chunks that
/// are blank after trimming are dropped.
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<String> {
    if text.trim().is_empty() || chunk_size == 0 {
        return vec![];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + chunk_size).min(text.len());
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }
        if end == start {
            // Single char longer than chunk_size bytes; take it whole
            end = (start + chunk_size).min(text.len());
            while end < text.len() && !text.is_char_boundary(end) {
                end += 1;
            }
        }

        let chunk = &text[start..end];
        if !chunk.trim().is_empty() {
            chunks.push(chunk.to_string());
        }

        start = end;
    }

    tracing::debug!("Chunked text into {} chunks (size: {})", chunks.len(), chunk_size);

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_exact_split() {
        let text = "a".repeat(300);
        let chunks = chunk_text(&text, 100);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.len() == 100));
    }

    #[test]
    fn test_chunk_remainder() {
        let text = "a".repeat(250);
        let chunks = chunk_text(&text, 100);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].len(), 50);
    }

    #[test]
    fn test_chunk_empty() {
        assert!(chunk_text("", 100).is_empty());
        assert!(chunk_text("   \n  ", 100).is_empty());
    }

    #[test]
    fn test_chunk_blank_chunks_dropped() {
        let mut text = "x".repeat(100);
        text.push_str(&" ".repeat(100));
        let chunks = chunk_text(&text, 100);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_chunk_utf8_boundary() {
        // Multi-byte characters must not be split mid-codepoint
        let text = "ہر طالب علم کے لیے سبق ".repeat(40);
        let chunks = chunk_text(&text, 100);
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.len() <= 100);
        }
        // No chunk in this input is blank, so concatenation is lossless
        assert_eq!(chunks.concat(), text);
    }
}
