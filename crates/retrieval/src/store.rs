//! In-memory document store with keyword and TF-IDF ranking.
//!
//! Holds content chunks from curriculum topics, uploaded PDFs, and raw
//! text. The default `search` ranks by keyword/metadata scoring;
//! `semantic_search` ranks by TF-IDF cosine similarity and also serves
//! as the backstop when keyword scoring matches nothing.

use crate::chunker::chunk_text;
use crate::pdf;
use crate::types::{CurriculumTopic, Document, SourceType};
use crate::vectorizer::{SparseVector, TfidfVectorizer};
use std::cmp::Ordering;
use std::path::Path;

/// Characters per chunk for PDF pages.
const PDF_CHUNK_SIZE: usize = 1000;

/// Characters per chunk for raw text.
const TEXT_CHUNK_SIZE: usize = 500;

/// Score bonus for an exact phrase match.
const PHRASE_BONUS: f32 = 5.0;

/// Score bonus per query word found in content.
const WORD_BONUS: f32 = 1.0;

/// Score bonus per metadata keyword matching the query.
const KEYWORD_BONUS: f32 = 2.0;

/// Score bonus per partial keyword/word overlap.
const PARTIAL_KEYWORD_BONUS: f32 = 0.5;

/// Multiplier applied to curriculum-sourced documents.
const CURRICULUM_BOOST: f32 = 1.1;

/// Offline document store combining curriculum and user documents.
///
/// The TF-IDF index is rebuilt lazily: additions mark it dirty and the
/// rebuild runs before the next semantic lookup, so bulk uploads do not
/// pay a rebuild per chunk.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: Vec<Document>,
    vectorizer: TfidfVectorizer,
    vectors: Vec<SparseVector>,
    index_dirty: bool,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed document chunks.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Extract and index a PDF document.
    ///
    /// Pages are split into fixed-size chunks with page metadata.
    /// Returns false when extraction fails; chunks appended before a
    /// failure are kept (no rollback).
    pub fn add_pdf(&mut self, pdf_path: &Path, document_name: &str) -> bool {
        let pages = match pdf::extract_pages(pdf_path) {
            Ok(pages) => pages,
            Err(e) => {
                tracing::warn!("Could not extract {:?}: {}", pdf_path, e);
                return false;
            }
        };

        let mut chunk_count = 0;
        for (page_idx, page) in pages.iter().enumerate() {
            for chunk in chunk_text(page, PDF_CHUNK_SIZE) {
                let mut doc = Document::new(
                    chunk,
                    format!("{} (Page {})", document_name, page_idx + 1),
                    SourceType::Pdf,
                );
                doc.metadata = serde_json::json!({
                    "page": page_idx + 1,
                    "document": document_name,
                });
                self.documents.push(doc);
                chunk_count += 1;
            }
        }

        self.index_dirty = true;
        tracing::info!(
            "Indexed PDF '{}': {} pages, {} chunks",
            document_name,
            pages.len(),
            chunk_count
        );
        true
    }

    /// Add a raw text document. Blank input is a no-op.
    pub fn add_text(&mut self, text: &str, source_name: &str) {
        if text.trim().is_empty() {
            return;
        }

        for chunk in chunk_text(text, TEXT_CHUNK_SIZE) {
            self.documents
                .push(Document::new(chunk, source_name, SourceType::Text));
        }

        self.index_dirty = true;
    }

    /// Index a curriculum topic as a single searchable document.
    pub fn add_curriculum_topic(&mut self, topic: &CurriculumTopic) {
        let mut content_parts = vec![
            format!("Topic: {}", topic.name),
            format!("Chapter: {}", topic.chapter),
            format!("Subject: {}", topic.subject),
        ];

        if let Some(description) = &topic.description {
            content_parts.push(format!("Description: {}", description));
        }

        if !topic.objectives.is_empty() {
            content_parts.push("Learning Objectives:".to_string());
            for objective in &topic.objectives {
                content_parts.push(format!("  - {}", objective));
            }
        }

        if !topic.keywords.is_empty() {
            content_parts.push(format!("Keywords: {}", topic.keywords.join(", ")));
        }

        let mut doc = Document::new(
            content_parts.join("\n"),
            format!("{}/{}", topic.subject, topic.chapter),
            SourceType::Curriculum,
        );
        doc.topic = Some(topic.name.clone());
        doc.chapter = Some(topic.chapter.clone());
        doc.grade = Some(topic.grade);
        doc.metadata = serde_json::json!({
            "subject": topic.subject,
            "keywords": topic.keywords,
        });

        self.documents.push(doc);
        self.index_dirty = true;
    }

    /// Search documents by keyword and metadata scoring.
    ///
    /// Scoring per document: +5 for an exact substring match of the full
    /// lowercased query, +1 per query word present in the content, +2 per
    /// metadata keyword that contains or is contained in the query, +0.5
    /// per keyword/word partial overlap, and a 1.1x multiplier for
    /// curriculum documents. Results are sorted descending (ties keep
    /// insertion order) and normalized by the top score, so the best
    /// match always scores 1.0. `min_score` filters after normalization.
    ///
    /// When keyword scoring matches nothing, the TF-IDF path is tried as
    /// a backstop. No match returns an empty list, never an error.
    pub fn search(&mut self, query: &str, top_k: usize, min_score: f32) -> Vec<(Document, f32)> {
        if self.documents.is_empty() {
            return vec![];
        }

        let query_lower = query.to_lowercase();
        let query_words: Vec<&str> = query_lower.split_whitespace().collect();

        let mut scored: Vec<(usize, f32)> = Vec::new();
        for (idx, doc) in self.documents.iter().enumerate() {
            let content_lower = doc.content.to_lowercase();
            let mut score = 0.0f32;

            if !query_lower.is_empty() && content_lower.contains(&query_lower) {
                score += PHRASE_BONUS;
            }

            for word in &query_words {
                if content_lower.contains(word) {
                    score += WORD_BONUS;
                }
            }

            for keyword in doc.keywords() {
                let keyword_lower = keyword.to_lowercase();
                if !query_lower.is_empty()
                    && (keyword_lower.contains(&query_lower) || query_lower.contains(&keyword_lower))
                {
                    score += KEYWORD_BONUS;
                }
                for word in &query_words {
                    if keyword_lower.contains(word) {
                        score += PARTIAL_KEYWORD_BONUS;
                    }
                }
            }

            if doc.source_type == SourceType::Curriculum {
                score *= CURRICULUM_BOOST;
            }

            if score > 0.0 {
                scored.push((idx, score));
            }
        }

        // Stable sort keeps insertion order for equal scores
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(top_k);

        if scored.is_empty() {
            return self.semantic_search(query, top_k);
        }

        let max_score = scored[0].1;
        scored
            .into_iter()
            .map(|(idx, score)| (idx, score / max_score))
            .filter(|(_, score)| *score >= min_score)
            .map(|(idx, score)| (self.documents[idx].clone(), score))
            .collect()
    }

    /// Search by TF-IDF cosine similarity.
    ///
    /// Rebuilds the vocabulary first if documents were added since the
    /// last semantic lookup.
    pub fn semantic_search(&mut self, query: &str, top_k: usize) -> Vec<(Document, f32)> {
        if self.documents.is_empty() {
            return vec![];
        }

        self.ensure_index();

        let query_vec = self.vectorizer.vectorize(query);
        if query_vec.is_empty() {
            return vec![];
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(idx, vec)| (idx, TfidfVectorizer::cosine_similarity(&query_vec, vec)))
            .filter(|(_, score)| *score > 0.0)
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(top_k);

        scored
            .into_iter()
            .map(|(idx, score)| (self.documents[idx].clone(), score))
            .collect()
    }

    /// Search curriculum documents by topic or chapter name.
    pub fn search_by_topic(&self, topic_name: &str, grade: Option<u8>) -> Vec<&Document> {
        let topic_lower = topic_name.to_lowercase();

        self.documents
            .iter()
            .filter(|doc| doc.source_type == SourceType::Curriculum)
            .filter(|doc| {
                let topic_match = doc
                    .topic
                    .as_ref()
                    .is_some_and(|t| t.to_lowercase().contains(&topic_lower));
                let chapter_match = doc
                    .chapter
                    .as_ref()
                    .is_some_and(|c| c.to_lowercase().contains(&topic_lower));
                topic_match || chapter_match
            })
            .filter(|doc| grade.is_none() || doc.grade == grade)
            .collect()
    }

    /// Build a formatted context block answering a query.
    ///
    /// Includes up to `top_k` sources with confidence percentages and
    /// 500-character excerpts.
    pub fn get_answer_context(&mut self, query: &str, top_k: usize) -> String {
        let results = self.search(query, top_k, 0.0);

        if results.is_empty() {
            return "No relevant information found in knowledge base.".to_string();
        }

        let mut parts = vec!["## Relevant Information\n".to_string()];

        for (i, (doc, score)) in results.iter().enumerate() {
            parts.push(format!("\n### Source {}: {}", i + 1, doc.source));
            parts.push(format!("**Confidence:** {:.1}%\n", score * 100.0));

            let excerpt: String = doc.content.chars().take(500).collect();
            parts.push(excerpt);
            if doc.content.chars().count() > 500 {
                parts.push("...\n".to_string());
            }
        }

        parts.push("\n---\n".to_string());
        parts.concat()
    }

    /// Rebuild the TF-IDF index if documents changed.
    ///
    /// Rebuilding the vocabulary invalidates every cached vector, so all
    /// documents are re-vectorized in the same pass.
    fn ensure_index(&mut self) {
        if !self.index_dirty {
            return;
        }

        let contents: Vec<&str> = self.documents.iter().map(|d| d.content.as_str()).collect();
        self.vectorizer.build_vocab(&contents);

        self.vectors = self
            .documents
            .iter()
            .map(|d| self.vectorizer.vectorize(&d.content))
            .collect();

        self.index_dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(name: &str, keywords: Vec<&str>) -> CurriculumTopic {
        CurriculumTopic {
            name: name.to_string(),
            chapter: "Algebra".to_string(),
            subject: "Mathematics".to_string(),
            grade: 9,
            description: Some(format!("Introduction to {}", name)),
            objectives: vec!["Solve basic problems".to_string()],
            keywords: keywords.into_iter().map(String::from).collect(),
        }
    }

    #[test]
    fn test_search_empty_store() {
        let mut store = DocumentStore::new();
        assert!(store.search("anything", 5, 0.0).is_empty());
        assert!(store.semantic_search("anything", 5).is_empty());
    }

    #[test]
    fn test_search_no_match() {
        let mut store = DocumentStore::new();
        store.add_text("The cat sat on the mat", "pets");
        assert!(store.search("zebra quagga", 5, 0.0).is_empty());
    }

    #[test]
    fn test_search_top_result_normalized() {
        let mut store = DocumentStore::new();
        store.add_text("The cat sat on the mat", "pets");
        store.add_text("Dogs bark loudly", "pets");

        let results = store.search("cat mat", 1, 0.0);
        assert_eq!(results.len(), 1);
        assert!(results[0].0.content.contains("cat sat"));
        assert!((results[0].1 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_search_phrase_beats_words() {
        let mut store = DocumentStore::new();
        store.add_text("quadratic equations are solved here", "a");
        store.add_text("equations and also quadratic things", "b");

        let results = store.search("quadratic equations", 2, 0.0);
        assert_eq!(results.len(), 2);
        // Exact phrase gets the +5 bonus and ranks first
        assert!(results[0].0.content.starts_with("quadratic equations"));
        assert!(results[0].1 > results[1].1);
    }

    #[test]
    fn test_search_curriculum_boost_and_keywords() {
        let mut store = DocumentStore::new();
        store.add_text("algebra notes from class", "notes");
        store.add_curriculum_topic(&topic("Linear Equations", vec!["algebra", "equations"]));

        let results = store.search("algebra", 2, 0.0);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0.source_type, SourceType::Curriculum);
        assert_eq!(results[0].1, 1.0);
    }

    #[test]
    fn test_search_ties_keep_insertion_order() {
        let mut store = DocumentStore::new();
        store.add_text("photosynthesis happens in leaves", "first");
        store.add_text("photosynthesis requires sunlight", "second");

        let results = store.search("photosynthesis", 2, 0.0);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0.source, "first");
        assert_eq!(results[1].0.source, "second");
    }

    #[test]
    fn test_search_min_score_filters() {
        let mut store = DocumentStore::new();
        store.add_text("the cat sat on the mat quietly", "a");
        store.add_text("a mat was here", "b");

        let all = store.search("cat sat mat", 5, 0.0);
        assert_eq!(all.len(), 2);

        let filtered = store.search("cat sat mat", 5, 0.9);
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_semantic_search_ranks_by_cosine() {
        let mut store = DocumentStore::new();
        store.add_text("photosynthesis converts light energy", "bio");
        store.add_text("newton described laws of motion", "physics");
        store.add_text("cells divide during mitosis", "bio");

        let results = store.semantic_search("photosynthesis light", 3);
        assert!(!results.is_empty());
        assert!(results[0].0.content.contains("photosynthesis"));
    }

    #[test]
    fn test_add_text_blank_is_noop() {
        let mut store = DocumentStore::new();
        store.add_text("   ", "blank");
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_text_chunks_long_input() {
        let mut store = DocumentStore::new();
        store.add_text(&"word ".repeat(300), "long");
        assert!(store.len() > 1);
    }

    #[test]
    fn test_add_pdf_missing_file_returns_false() {
        let mut store = DocumentStore::new();
        assert!(!store.add_pdf(Path::new("/nonexistent.pdf"), "missing"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_search_by_topic() {
        let mut store = DocumentStore::new();
        store.add_curriculum_topic(&topic("Quadratic Equations", vec![]));
        store.add_text("quadratic equations in my notes", "notes");

        let results = store.search_by_topic("quadratic", None);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source_type, SourceType::Curriculum);

        assert!(store.search_by_topic("quadratic", Some(10)).is_empty());
        assert_eq!(store.search_by_topic("quadratic", Some(9)).len(), 1);
    }

    #[test]
    fn test_get_answer_context() {
        let mut store = DocumentStore::new();
        store.add_text("The water cycle moves water through evaporation", "science-notes");

        let context = store.get_answer_context("water cycle", 3);
        assert!(context.contains("Relevant Information"));
        assert!(context.contains("science-notes"));
        assert!(context.contains("Confidence"));
    }

    #[test]
    fn test_get_answer_context_empty() {
        let mut store = DocumentStore::new();
        let context = store.get_answer_context("anything", 3);
        assert_eq!(context, "No relevant information found in knowledge base.");
    }

    #[test]
    fn test_lazy_rebuild_covers_new_documents() {
        let mut store = DocumentStore::new();
        store.add_text("mitochondria produce cellular energy", "bio");
        store.add_text("newton described laws of motion", "physics");
        let _ = store.semantic_search("mitochondria", 1);

        store.add_text("ribosomes synthesize proteins", "bio");
        let results = store.semantic_search("ribosomes proteins", 1);
        assert!(!results.is_empty());
        assert!(results[0].0.content.contains("ribosomes"));
    }
}
