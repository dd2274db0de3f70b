use crate::error::RetrievalError;
use std::fs;
use std::path::Path;

/// Split text into overlapping windows of whole words.
///
/// Each window holds `chunk_size` words and each subsequent window starts
/// `chunk_size - overlap` words after the previous one. The final window ends
/// at the last word even when shorter than `chunk_size`.
pub fn chunk_text(
    text: &str,
    chunk_size: usize,
    overlap: usize,
) -> Result<Vec<String>, RetrievalError> {
    if chunk_size == 0 || overlap >= chunk_size {
        return Err(RetrievalError::InvalidChunkConfig(format!(
            "chunk_size={chunk_size} overlap={overlap}: each window must advance by at least one word"
        )));
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Ok(Vec::new());
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;

    loop {
        let end = (start + chunk_size).min(words.len());
        chunks.push(words[start..end].join(" "));
        if end == words.len() {
            break;
        }
        start = end - overlap;
    }

    Ok(chunks)
}

/// Read a corpus file, treating a missing path as an empty corpus.
pub fn load_text_file(path: &Path) -> Result<String, RetrievalError> {
    if !path.exists() {
        return Ok(String::new());
    }
    Ok(fs::read_to_string(path)?)
}
