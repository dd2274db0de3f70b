use crate::error::RetrievalError;
use crate::vectorize::{TermVector, Vectorizer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One retrievable slice of the corpus. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentChunk {
    pub identifier: String,
    pub text: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl DocumentChunk {
    pub fn new(identifier: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            text: text.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Provenance label used when rendering evidence, falling back to the
    /// chunk identifier when no source was recorded.
    pub fn source_label(&self) -> &str {
        self.metadata
            .get("source")
            .map(String::as_str)
            .unwrap_or(&self.identifier)
    }
}

#[derive(Debug, Clone)]
struct IndexEntry {
    chunk: DocumentChunk,
    vector: TermVector,
}

/// Append-only, insertion-ordered collection of vectorized chunks.
///
/// `add` takes `&mut self` and `search` takes `&self`, so the intended
/// lifecycle (build once, then read many times) is enforced by the borrow
/// checker: no `add` can overlap a `search`, while shared `search` calls
/// against a stable index are always safe.
pub struct DocumentIndex {
    vectorizer: Vectorizer,
    entries: Vec<IndexEntry>,
}

impl DocumentIndex {
    pub fn new() -> Result<Self, RetrievalError> {
        Ok(Self {
            vectorizer: Vectorizer::new()?,
            entries: Vec::new(),
        })
    }

    /// Vectorize and append each chunk. Chunks that tokenize to nothing are
    /// silently dropped.
    pub fn add(&mut self, chunks: impl IntoIterator<Item = DocumentChunk>) {
        for chunk in chunks {
            let vector = self.vectorizer.vectorize(&chunk.text);
            if vector.is_empty() {
                continue;
            }
            self.entries.push(IndexEntry { chunk, vector });
        }
    }

    /// Top-`k` cosine similarity search. An empty query vector or an empty
    /// index yields an empty result. Only strictly positive scores are
    /// returned, ties resolve to insertion order.
    pub fn search(&self, query: &str, k: usize) -> Vec<DocumentChunk> {
        let query_vector = self.vectorizer.vectorize(query);
        if query_vector.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(f64, &DocumentChunk)> = self
            .entries
            .iter()
            .map(|entry| (query_vector.dot(&entry.vector), &entry.chunk))
            .collect();

        // Stable sort keeps insertion order among equal scores.
        scored.sort_by(|left, right| right.0.total_cmp(&left.0));

        scored
            .into_iter()
            .filter(|(score, _)| *score > 0.0)
            .take(k)
            .map(|(_, chunk)| chunk.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, text: &str) -> DocumentChunk {
        DocumentChunk::new(id, text)
    }

    #[test]
    fn empty_index_returns_empty_results() {
        let index = DocumentIndex::new().unwrap();
        assert!(index.search("fever", 3).is_empty());
    }

    #[test]
    fn chunks_without_tokens_are_dropped() {
        let mut index = DocumentIndex::new().unwrap();
        index.add(vec![chunk("a", "123 !!!"), chunk("b", "fever and chills")]);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn empty_query_returns_empty_results() {
        let mut index = DocumentIndex::new().unwrap();
        index.add(vec![chunk("a", "fever and chills")]);
        assert!(index.search("", 3).is_empty());
        assert!(index.search("42 --- !!!", 3).is_empty());
    }

    #[test]
    fn only_positive_scores_are_returned() {
        let mut index = DocumentIndex::new().unwrap();
        index.add(vec![
            chunk("a", "fever and chills overnight"),
            chunk("b", "sprained ankle from football"),
        ]);

        let hits = index.search("fever", 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].identifier, "a");
    }

    #[test]
    fn results_are_ranked_by_cosine_score() {
        let mut index = DocumentIndex::new().unwrap();
        index.add(vec![
            chunk("mixed", "fever headache nausea dizziness fatigue"),
            chunk("focused", "fever fever fever"),
        ]);

        let hits = index.search("fever", 2);
        assert_eq!(hits[0].identifier, "focused");
        assert_eq!(hits[1].identifier, "mixed");
    }

    #[test]
    fn ties_resolve_to_insertion_order() {
        let mut index = DocumentIndex::new().unwrap();
        index.add(vec![
            chunk("first", "fever chills"),
            chunk("second", "fever chills"),
        ]);

        let hits = index.search("fever chills", 2);
        assert_eq!(hits[0].identifier, "first");
        assert_eq!(hits[1].identifier, "second");
    }

    #[test]
    fn repeated_searches_are_idempotent() {
        let mut index = DocumentIndex::new().unwrap();
        index.add(vec![
            chunk("a", "fever chills cough"),
            chunk("b", "fever fatigue"),
            chunk("c", "cough fatigue"),
        ]);

        let first = index.search("fever cough", 3);
        let second = index.search("fever cough", 3);
        assert_eq!(first, second);
    }

    #[test]
    fn k_bounds_the_result_count() {
        let mut index = DocumentIndex::new().unwrap();
        index.add((0..5).map(|i| chunk(&format!("c{i}"), "fever chills")));
        assert_eq!(index.search("fever", 2).len(), 2);
    }
}
