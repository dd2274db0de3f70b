use crate::error::GenerationError;
use reqwest::blocking::Client;
use serde_json::{json, Value};
use std::time::Duration;

const API_URL_TEMPLATE: &str =
    "https://generativelanguage.googleapis.com/v1beta/{model}:generateContent";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationResponse {
    pub text: String,
    pub model: String,
    pub prompt_tokens: u64,
    pub candidate_tokens: u64,
}

/// Boundary toward the hosted language model. The core only ever sends a
/// prompt string and reads back text.
pub trait GenerationClient {
    fn generate(
        &self,
        prompt: &str,
        system_instruction: Option<&str>,
    ) -> Result<GenerationResponse, GenerationError>;
}

/// Blocking client for the Gemini REST API.
///
/// Without an API key it degrades to a deterministic offline response so the
/// assistant stays runnable in sandboxes with no outbound network.
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    temperature: f64,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, model: &str, temperature: f64) -> Self {
        let api_key = api_key
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .filter(|key| !key.trim().is_empty());

        Self {
            client: Client::new(),
            api_key,
            model: normalize_model_name(model),
            temperature,
        }
    }

    pub fn is_offline(&self) -> bool {
        self.api_key.is_none()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn compose_prompt(prompt: &str, system_instruction: Option<&str>) -> String {
        match system_instruction {
            Some(instruction) => format!("{}\n\nUser request: {}", instruction.trim(), prompt.trim()),
            None => prompt.to_string(),
        }
    }

    fn offline_response(&self, prompt: &str, system_instruction: Option<&str>) -> GenerationResponse {
        const TEMPLATES: [&str; 3] = [
            "(offline) Analyzed the scenario and highlighted the key vitals.",
            "(offline) Summarized patient intent and pulled safety watch-outs.",
            "(offline) Crafted a cautious response referencing internal knowledge.",
        ];

        let mut hash = 1469598103934665603u64;
        for byte in prompt
            .bytes()
            .chain(system_instruction.unwrap_or_default().bytes())
            .chain(self.model.bytes())
        {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(1099511628211);
        }
        let choice = TEMPLATES[(hash % TEMPLATES.len() as u64) as usize];

        let excerpt: String = prompt.chars().take(180).collect();
        GenerationResponse {
            text: format!("{choice}\n\nPrompt excerpt: {}...", excerpt.trim()),
            model: self.model.clone(),
            prompt_tokens: 0,
            candidate_tokens: 0,
        }
    }
}

impl GenerationClient for GeminiClient {
    fn generate(
        &self,
        prompt: &str,
        system_instruction: Option<&str>,
    ) -> Result<GenerationResponse, GenerationError> {
        let Some(api_key) = &self.api_key else {
            return Ok(self.offline_response(prompt, system_instruction));
        };

        let url = API_URL_TEMPLATE.replace("{model}", &self.model);
        let payload = json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [{ "text": Self::compose_prompt(prompt, system_instruction) }],
                }
            ],
            "generationConfig": {
                "temperature": self.temperature,
            },
        });

        let response = self
            .client
            .post(url)
            .query(&[("key", api_key.as_str())])
            .timeout(Duration::from_secs(30))
            .json(&payload)
            .send()?;

        if response.status().is_client_error() || response.status().is_server_error() {
            return Err(GenerationError::BackendResponse {
                backend: "gemini".to_string(),
                details: response.status().to_string(),
            });
        }

        let body: Value = response.json()?;
        let candidates = body
            .get("candidates")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        if candidates.is_empty() {
            return Ok(GenerationResponse {
                text: "Gemini API returned no candidates.".to_string(),
                model: self.model.clone(),
                prompt_tokens: 0,
                candidate_tokens: 0,
            });
        }

        let text = candidates[0]
            .get("content")
            .and_then(|content| content.get("parts"))
            .and_then(Value::as_array)
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|part| part.get("text").and_then(Value::as_str))
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();

        let usage = |field: &str| {
            body.get("usageMetadata")
                .and_then(|usage| usage.get(field))
                .and_then(Value::as_u64)
                .unwrap_or(0)
        };

        Ok(GenerationResponse {
            text,
            model: self.model.clone(),
            prompt_tokens: usage("promptTokenCount"),
            candidate_tokens: usage("candidatesTokenCount"),
        })
    }
}

fn normalize_model_name(model: &str) -> String {
    let trimmed = model.trim();
    if trimmed.is_empty() {
        return "models/gemini-1.5-flash".to_string();
    }
    if trimmed.starts_with("models/") {
        trimmed.to_string()
    } else {
        format!("models/{trimmed}")
    }
}
