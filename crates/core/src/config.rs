use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Runtime configuration for the assistant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub gemini_model: String,
    pub gemini_api_key: Option<String>,
    pub temperature: f64,
    pub top_k: usize,
    pub knowledge_base_path: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gemini_model: "gemini-1.5-flash".to_string(),
            gemini_api_key: None,
            temperature: 0.2,
            top_k: 4,
            knowledge_base_path: "data/medical_guidelines.md".to_string(),
            chunk_size: 450,
            chunk_overlap: 60,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file. A missing file yields the defaults; a
    /// present but malformed file is a configuration error, never silently
    /// defaulted.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Malformed {
            path: path.display().to_string(),
            source,
        })
    }
}
