use crate::error::GenerationError;
use crate::generation::GenerationClient;
use crate::pipeline::RetrievedContext;
use crate::state::AgentOutput;
use serde_json::{Map, Value};

/// One prompt-driven specialist. The heavy lifting happens in the hosted
/// model; the agent only assembles a prompt from the case and records the
/// response with its supporting evidence.
#[derive(Debug, Clone)]
pub struct CareAgent {
    role: String,
    system_instruction: String,
}

impl CareAgent {
    pub fn new(role: impl Into<String>, system_instruction: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            system_instruction: system_instruction.into(),
        }
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn run(
        &self,
        client: &dyn GenerationClient,
        patient_query: &str,
        snapshot: &Map<String, Value>,
        context: &RetrievedContext,
    ) -> Result<AgentOutput, GenerationError> {
        let prompt = build_prompt(patient_query, snapshot, context)?;
        let response = client.generate(&prompt, Some(&self.system_instruction))?;

        Ok(AgentOutput {
            role: self.role.clone(),
            summary: response.text.trim().to_string(),
            evidence: context.as_bullet_list(),
            raw_model_output: response.text,
        })
    }
}

fn build_prompt(
    patient_query: &str,
    snapshot: &Map<String, Value>,
    context: &RetrievedContext,
) -> Result<String, GenerationError> {
    let snapshot_json = serde_json::to_string_pretty(snapshot)?;
    Ok(format!(
        "Patient query: {patient_query}\n\nCase so far:\n{snapshot_json}\n\nRetrieved guidance:\n{}",
        context.as_bullet_list()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::GenerationResponse;
    use crate::index::DocumentChunk;

    struct FakeClient;

    impl GenerationClient for FakeClient {
        fn generate(
            &self,
            prompt: &str,
            system_instruction: Option<&str>,
        ) -> Result<GenerationResponse, GenerationError> {
            Ok(GenerationResponse {
                text: format!(
                    "  instruction={} prompt_len={}  ",
                    system_instruction.unwrap_or_default(),
                    prompt.len()
                ),
                model: "fake".to_string(),
                prompt_tokens: 0,
                candidate_tokens: 0,
            })
        }
    }

    #[test]
    fn agent_records_role_trimmed_summary_and_evidence() {
        let agent = CareAgent::new("Triage Agent", "classify symptoms");
        let context = RetrievedContext {
            question: "fever".to_string(),
            passages: vec![
                DocumentChunk::new("c1", "fever advice").with_metadata("source", "kb.md"),
            ],
        };

        let output = agent
            .run(&FakeClient, "I have a fever", &Map::new(), &context)
            .unwrap();

        assert_eq!(output.role, "Triage Agent");
        assert!(output.summary.starts_with("instruction=classify symptoms"));
        assert_eq!(output.summary.trim(), output.summary);
        assert_eq!(output.evidence, "- (kb.md) fever advice");
        assert!(output.raw_model_output.contains("prompt_len="));
    }
}
