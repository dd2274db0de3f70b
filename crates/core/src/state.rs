use crate::pipeline::RetrievedContext;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What one agent produced for the case.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AgentOutput {
    pub role: String,
    pub summary: String,
    pub evidence: String,
    pub raw_model_output: String,
}

/// Shared state threaded through every step of one care-graph invocation.
///
/// Every field carries a serde default so a loose mapping returned by a step
/// reconciles into this structure with neutral values for anything unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseState {
    #[serde(default)]
    pub patient_query: String,
    #[serde(default)]
    pub citizen_profile: Map<String, Value>,
    #[serde(default)]
    pub retrieved_context: RetrievedContext,
    #[serde(default)]
    pub triage: Option<AgentOutput>,
    #[serde(default)]
    pub program_eligibility: Option<AgentOutput>,
    #[serde(default)]
    pub facility_finder: Option<AgentOutput>,
    #[serde(default)]
    pub follow_up: Option<AgentOutput>,
    #[serde(default)]
    pub health_analytics: Option<AgentOutput>,
    #[serde(default)]
    pub knowledge: Option<AgentOutput>,
}

impl CaseState {
    pub fn new(
        patient_query: impl Into<String>,
        citizen_profile: Map<String, Value>,
        retrieved_context: RetrievedContext,
    ) -> Self {
        Self {
            patient_query: patient_query.into(),
            citizen_profile,
            retrieved_context,
            ..Self::default()
        }
    }

    /// Compact view of the case so the later prompts can reference what the
    /// earlier nodes concluded.
    pub fn snapshot(&self) -> Map<String, Value> {
        fn summary(output: &Option<AgentOutput>) -> Value {
            output
                .as_ref()
                .map(|value| Value::String(value.summary.clone()))
                .unwrap_or(Value::String(String::new()))
        }

        let mut snapshot = Map::new();
        snapshot.insert(
            "citizen_profile".to_string(),
            Value::Object(self.citizen_profile.clone()),
        );
        snapshot.insert("triage".to_string(), summary(&self.triage));
        snapshot.insert("programs".to_string(), summary(&self.program_eligibility));
        snapshot.insert("facilities".to_string(), summary(&self.facility_finder));
        snapshot.insert("follow_up".to_string(), summary(&self.follow_up));
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn loose_mapping_deserializes_with_neutral_defaults() {
        let state: CaseState =
            serde_json::from_value(json!({ "patient_query": "fever since yesterday" })).unwrap();

        assert_eq!(state.patient_query, "fever since yesterday");
        assert!(state.citizen_profile.is_empty());
        assert!(state.retrieved_context.is_empty());
        assert!(state.triage.is_none());
        assert!(state.knowledge.is_none());
    }

    #[test]
    fn snapshot_reflects_completed_nodes_only() {
        let mut state = CaseState::new("fever", Map::new(), RetrievedContext::default());
        state.triage = Some(AgentOutput {
            role: "Triage Agent".to_string(),
            summary: "clinic visit advised".to_string(),
            evidence: String::new(),
            raw_model_output: String::new(),
        });

        let snapshot = state.snapshot();
        assert_eq!(snapshot["triage"], json!("clinic visit advised"));
        assert_eq!(snapshot["facilities"], json!(""));
    }
}
