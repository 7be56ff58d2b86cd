//! Document store type definitions.

use serde::{Deserialize, Serialize};

/// Where a document chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Curriculum topic entries
    Curriculum,

    /// Chunks extracted from an uploaded PDF
    Pdf,

    /// Chunks from raw text input
    Text,
}

impl SourceType {
    /// Canonical string form, matching the serialized representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Curriculum => "curriculum",
            Self::Pdf => "pdf",
            Self::Text => "text",
        }
    }
}

/// A searchable document chunk.
///
/// Created at index time and immutable thereafter; owned exclusively by
/// the in-memory document list of one store instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Chunk text content
    pub content: String,

    /// Human-readable source label (e.g. "physics-notes.pdf (Page 3)")
    pub source: String,

    /// Source category
    pub source_type: SourceType,

    /// Curriculum topic name, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,

    /// Curriculum chapter name, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter: Option<String>,

    /// Grade level, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<u8>,

    /// Free-form metadata (keywords, page numbers, source ids)
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl Document {
    /// Create a document with empty metadata.
    pub fn new(content: impl Into<String>, source: impl Into<String>, source_type: SourceType) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
            source_type,
            topic: None,
            chapter: None,
            grade: None,
            metadata: serde_json::json!({}),
        }
    }

    /// Metadata keywords, when present.
    pub fn keywords(&self) -> Vec<&str> {
        self.metadata
            .get("keywords")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|k| k.as_str()).collect())
            .unwrap_or_default()
    }
}

/// A curriculum topic to be indexed into the document store.
///
/// The store renders this into a single searchable content block; the
/// actual curriculum tables live outside this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurriculumTopic {
    /// Topic name (e.g. "Quadratic Equations")
    pub name: String,

    /// Chapter the topic belongs to
    pub chapter: String,

    /// Subject name (e.g. "Mathematics")
    pub subject: String,

    /// Grade level
    pub grade: u8,

    /// Optional topic description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Learning objectives
    #[serde(default)]
    pub objectives: Vec<String>,

    /// Keywords used for metadata boosting during search
    #[serde(default)]
    pub keywords: Vec<String>,
}
