use crate::error::RetrievalError;
use regex::Regex;
use std::collections::HashMap;

/// Tokens are alphabetic-leading runs of letters, digits, hyphens and
/// underscores, at least two characters long. Standalone digits and
/// punctuation never become tokens.
const TOKEN_PATTERN: &str = r"[a-z][a-z0-9_-]+";

/// Sparse term-frequency vector, L2-normalized at construction so the dot
/// product of two vectors is their cosine similarity. An all-zero vector is
/// stored as an empty mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermVector {
    weights: HashMap<String, f64>,
}

impl TermVector {
    fn from_counts(counts: HashMap<String, u64>) -> Self {
        let norm = counts
            .values()
            .map(|count| (*count as f64) * (*count as f64))
            .sum::<f64>()
            .sqrt();
        // An all-zero count vector keeps norm 1.0 so the result stays empty
        // instead of dividing by zero.
        let norm = if norm > 0.0 { norm } else { 1.0 };

        let weights = counts
            .into_iter()
            .map(|(token, count)| (token, count as f64 / norm))
            .collect();

        Self { weights }
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn weights(&self) -> &HashMap<String, f64> {
        &self.weights
    }

    /// Cosine similarity against another unit vector.
    pub fn dot(&self, other: &Self) -> f64 {
        let (small, large) = if self.weights.len() <= other.weights.len() {
            (&self.weights, &other.weights)
        } else {
            (&other.weights, &self.weights)
        };

        small
            .iter()
            .filter_map(|(token, weight)| large.get(token).map(|other| weight * other))
            .sum()
    }
}

/// Turns text into [`TermVector`]s using a fixed lexical token pattern.
pub struct Vectorizer {
    token_pattern: Regex,
}

impl Vectorizer {
    pub fn new() -> Result<Self, RetrievalError> {
        Ok(Self {
            token_pattern: Regex::new(TOKEN_PATTERN)?,
        })
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        self.token_pattern
            .find_iter(&lowered)
            .map(|token| token.as_str().to_string())
            .collect()
    }

    pub fn vectorize(&self, text: &str) -> TermVector {
        let mut counts: HashMap<String, u64> = HashMap::new();
        for token in self.tokenize(text) {
            *counts.entry(token).or_insert(0) += 1;
        }
        TermVector::from_counts(counts)
    }
}
