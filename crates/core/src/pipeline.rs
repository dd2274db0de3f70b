use crate::chunking::{chunk_text, load_text_file};
use crate::error::RetrievalError;
use crate::index::{DocumentChunk, DocumentIndex};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Ranked passages for one question, best match first. Produced per query and
/// consumed once by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RetrievedContext {
    pub question: String,
    #[serde(default)]
    pub passages: Vec<DocumentChunk>,
}

impl RetrievedContext {
    /// The textual contract toward the generation collaborator: one line per
    /// passage, `- (<source>) <chunk text>`.
    pub fn as_bullet_list(&self) -> String {
        self.passages
            .iter()
            .map(|chunk| format!("- ({}) {}", chunk.source_label(), chunk.text.trim()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }
}

/// Diagnostics record returned by [`RetrievalPipeline::describe`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineInfo {
    pub knowledge_base: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub indexed_chunks: usize,
}

/// Find corpus files under a path. A single file is its own corpus; a
/// directory is walked recursively for markdown and plain-text files in
/// sorted order. A missing path yields no files.
pub fn discover_corpus_files(root: &Path) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }
    if !root.is_dir() {
        return Vec::new();
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).into_iter().filter_map(|item| item.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let is_text = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("txt"));
        if is_text {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

/// Ingests a corpus into a [`DocumentIndex`] at construction time and answers
/// retrieval queries against it for the rest of the process lifetime.
pub struct RetrievalPipeline {
    knowledge_base: PathBuf,
    chunk_size: usize,
    chunk_overlap: usize,
    index: DocumentIndex,
}

impl RetrievalPipeline {
    /// A missing knowledge base is not an error: the pipeline starts with an
    /// empty index so the rest of the system stays usable.
    pub fn new(
        knowledge_base: impl Into<PathBuf>,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Result<Self, RetrievalError> {
        let knowledge_base = knowledge_base.into();
        let mut index = DocumentIndex::new()?;

        let mut chunks = Vec::new();
        for path in discover_corpus_files(&knowledge_base) {
            let content = load_text_file(&path)?;
            if content.trim().is_empty() {
                continue;
            }
            let source = path.to_string_lossy().to_string();
            for (chunk_index, text) in chunk_text(&content, chunk_size, chunk_overlap)?
                .into_iter()
                .enumerate()
            {
                let identifier = make_chunk_id(&source, chunk_index, &text);
                chunks.push(DocumentChunk::new(identifier, text).with_metadata("source", &source));
            }
        }
        index.add(chunks);

        Ok(Self {
            knowledge_base,
            chunk_size,
            chunk_overlap,
            index,
        })
    }

    /// Always returns a context; the passage list is empty when nothing scores
    /// above zero or the index is empty.
    pub fn retrieve(&self, question: &str, top_k: usize) -> RetrievedContext {
        RetrievedContext {
            question: question.to_string(),
            passages: self.index.search(question, top_k),
        }
    }

    pub fn describe(&self) -> PipelineInfo {
        PipelineInfo {
            knowledge_base: self.knowledge_base.to_string_lossy().to_string(),
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
            indexed_chunks: self.index.len(),
        }
    }

    pub fn index(&self) -> &DocumentIndex {
        &self.index
    }
}

fn make_chunk_id(source: &str, chunk_index: usize, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update((chunk_index as u64).to_le_bytes());
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn missing_corpus_degrades_to_empty_index() {
        let pipeline = RetrievalPipeline::new("/nowhere/guidelines.md", 450, 60).unwrap();

        let info = pipeline.describe();
        assert_eq!(info.knowledge_base, "/nowhere/guidelines.md");
        assert_eq!(info.chunk_size, 450);
        assert_eq!(info.chunk_overlap, 60);
        assert_eq!(info.indexed_chunks, 0);

        let context = pipeline.retrieve("I have a fever", 3);
        assert!(context.is_empty());
        assert_eq!(context.question, "I have a fever");
    }

    #[test]
    fn fever_sentence_outranks_injury_sentence() {
        let dir = tempdir().unwrap();
        let corpus = dir.path().join("guidelines.md");
        fs::write(
            &corpus,
            "A fever above 38C that lasts two days needs a clinic visit.\n\
             An ankle injury with swelling should be rested and iced.",
        )
        .unwrap();

        let pipeline = RetrievalPipeline::new(&corpus, 12, 3).unwrap();
        let context = pipeline.retrieve("I have a fever", 2);

        assert!(!context.is_empty());
        assert!(context.passages[0].text.contains("fever"));
    }

    #[test]
    fn directory_corpus_is_walked_recursively() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        fs::write(dir.path().join("a.md"), "fever guidance for adults").unwrap();
        fs::write(nested.join("b.txt"), "injury guidance for adults").unwrap();
        fs::write(nested.join("ignored.csv"), "not,a,corpus").unwrap();

        let files = discover_corpus_files(dir.path());
        assert_eq!(files.len(), 2);

        let pipeline = RetrievalPipeline::new(dir.path(), 450, 60).unwrap();
        assert_eq!(pipeline.describe().indexed_chunks, 2);
    }

    #[test]
    fn chunk_identifiers_are_unique_within_a_batch() {
        let dir = tempdir().unwrap();
        let corpus = dir.path().join("repeat.md");
        let words = vec!["fever"; 12].join(" ");
        fs::write(&corpus, &words).unwrap();

        let pipeline = RetrievalPipeline::new(&corpus, 4, 1).unwrap();
        let hits = pipeline.retrieve("fever", 10);
        let mut ids: Vec<&str> = hits.passages.iter().map(|c| c.identifier.as_str()).collect();
        let before = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), before);
    }

    #[test]
    fn bullet_list_uses_source_metadata() {
        let context = RetrievedContext {
            question: "fever".to_string(),
            passages: vec![
                DocumentChunk::new("c1", " fever advice ").with_metadata("source", "kb/fever.md"),
                DocumentChunk::new("c2", "hydration advice"),
            ],
        };

        assert_eq!(
            context.as_bullet_list(),
            "- (kb/fever.md) fever advice\n- (c2) hydration advice"
        );
    }
}
