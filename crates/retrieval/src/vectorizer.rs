//! Sparse TF-IDF vectorizer for offline document retrieval.
//!
//! Builds a vocabulary over a document set and produces sparse
//! term-index → weight vectors. Rebuilding the vocabulary invalidates
//! every previously produced vector; the document store re-vectorizes
//! its corpus after each rebuild.

use std::collections::{BTreeMap, HashMap, HashSet};

/// Sparse vector keyed by term index.
pub type SparseVector = BTreeMap<usize, f32>;

/// TF-IDF vectorizer with a stable, sorted term index assignment.
#[derive(Debug, Default)]
pub struct TfidfVectorizer {
    /// Term → index, indices assigned in sorted term order
    vocab: HashMap<String, usize>,

    /// IDF weight per term index
    idf: Vec<f32>,
}

impl TfidfVectorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct terms in the vocabulary.
    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    /// Build the vocabulary and IDF table from a document corpus.
    ///
    /// Replaces any previous vocabulary. IDF is `ln(N / (1 + df))` where
    /// `df` is the number of documents containing the term.
    pub fn build_vocab(&mut self, documents: &[&str]) {
        let total_docs = documents.len();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let unique: HashSet<String> = tokenize(doc).into_iter().collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let mut terms: Vec<&String> = doc_freq.keys().collect();
        terms.sort();

        self.vocab = terms
            .iter()
            .enumerate()
            .map(|(idx, term)| ((*term).clone(), idx))
            .collect();

        self.idf = vec![0.0; self.vocab.len()];
        for (term, df) in &doc_freq {
            let idx = self.vocab[term];
            self.idf[idx] = (total_docs as f32 / (1 + df) as f32).ln();
        }

        tracing::debug!(
            "Built vocabulary: {} terms over {} documents",
            self.vocab.len(),
            total_docs
        );
    }

    /// Convert text to a sparse TF-IDF vector.
    ///
    /// Term frequency is normalized by the token count of the text;
    /// only non-zero entries are returned. Terms outside the vocabulary
    /// are ignored.
    pub fn vectorize(&self, text: &str) -> SparseVector {
        let tokens = tokenize(text);
        let doc_length = tokens.len().max(1) as f32;

        let mut counts: BTreeMap<usize, f32> = BTreeMap::new();
        for token in &tokens {
            if let Some(&idx) = self.vocab.get(token) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        counts
            .into_iter()
            .map(|(idx, tf)| (idx, (tf / doc_length) * self.idf[idx]))
            .filter(|(_, w)| *w != 0.0)
            .collect()
    }

    /// Cosine similarity between two sparse vectors, in [0, 1].
    ///
    /// Returns 0 when either vector is empty or has zero magnitude.
    pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f32 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }

        let dot: f32 = a
            .iter()
            .filter_map(|(idx, va)| b.get(idx).map(|vb| va * vb))
            .sum();
        let norm_a: f32 = a.values().map(|v| v * v).sum::<f32>().sqrt();
        let norm_b: f32 = b.values().map(|v| v * v).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot / (norm_a * norm_b)
    }
}

/// Tokenize text: lowercase, strip punctuation, drop tokens of 2 chars
/// or fewer.
fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|t| t.chars().count() > 2)
        .map(|t| t.to_string())
        .collect()
}
