use crate::agent::CareAgent;
use crate::config::Settings;
use crate::error::{GraphError, OrchestratorError};
use crate::generation::GenerationClient;
use crate::graph::{BoxedStepError, CompiledGraph, GraphBuilder, StepResult, END};
use crate::pipeline::{PipelineInfo, RetrievalPipeline};
use crate::state::{AgentOutput, CaseState};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use uuid::Uuid;

const TRIAGE_INSTRUCTION: &str = "Classify symptoms as self-care, BHU visit, hospital visit, or \
     emergency and describe the reasoning in plain Urdu+English.";
const ELIGIBILITY_INSTRUCTION: &str = "Explain whether the citizen qualifies for Sehat Card or \
     preventive programmes and cite rules.";
const FACILITY_INSTRUCTION: &str = "Recommend nearby facilities that can manage the case and \
     clarify why each was selected.";
const FOLLOW_UP_INSTRUCTION: &str = "Design reminders, medication adherence nudges, and \
     escalation rules in friendly language.";
const ANALYTICS_INSTRUCTION: &str = "Correlate this case with broader analytics, cite datasets, \
     and be transparent about uncertainty.";
const KNOWLEDGE_INSTRUCTION: &str = "Detect outbreaks, describe data gaps, and outline how to \
     notify authorities transparently.";

/// Structured output returned to the caller after one full graph run.
#[derive(Debug, Clone, Serialize)]
pub struct CareReport {
    pub report_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub patient_query: String,
    pub citizen_profile: Map<String, Value>,
    pub rag_context: PipelineInfo,
    pub triage: AgentOutput,
    pub program_eligibility: AgentOutput,
    pub facility_finder: AgentOutput,
    pub follow_up: AgentOutput,
    pub health_analytics: AgentOutput,
    pub knowledge: AgentOutput,
}

impl CareReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Coordinates the retrieval pipeline and the compiled six-node care graph.
///
/// The graph is compiled once at construction and reused for every `run`;
/// each invocation threads its own [`CaseState`] through the chain
/// triage -> eligibility -> facility -> follow_up -> analytics -> knowledge.
pub struct CareOrchestrator {
    settings: Settings,
    pipeline: RetrievalPipeline,
    graph: CompiledGraph<CaseState>,
}

impl CareOrchestrator {
    pub fn new(
        settings: Settings,
        client: Arc<dyn GenerationClient + Send + Sync>,
    ) -> Result<Self, OrchestratorError> {
        let pipeline = RetrievalPipeline::new(
            &settings.knowledge_base_path,
            settings.chunk_size,
            settings.chunk_overlap,
        )?;
        let graph = build_care_graph(client)?;

        Ok(Self {
            settings,
            pipeline,
            graph,
        })
    }

    pub fn run(
        &self,
        patient_query: &str,
        citizen_profile: Option<Map<String, Value>>,
    ) -> Result<CareReport, OrchestratorError> {
        let retrieved_context = self.pipeline.retrieve(patient_query, self.settings.top_k);
        let profile = citizen_profile.unwrap_or_else(default_profile);

        let initial_state = CaseState::new(patient_query, profile.clone(), retrieved_context);
        let final_state = self.graph.invoke(initial_state)?;

        fn require(
            output: Option<AgentOutput>,
            node: &'static str,
        ) -> Result<AgentOutput, OrchestratorError> {
            output.ok_or(OrchestratorError::MissingOutput(node))
        }

        Ok(CareReport {
            report_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            patient_query: patient_query.to_string(),
            citizen_profile: profile,
            rag_context: self.pipeline.describe(),
            triage: require(final_state.triage, "triage")?,
            program_eligibility: require(final_state.program_eligibility, "eligibility")?,
            facility_finder: require(final_state.facility_finder, "facility")?,
            follow_up: require(final_state.follow_up, "follow_up")?,
            health_analytics: require(final_state.health_analytics, "analytics")?,
            knowledge: require(final_state.knowledge, "knowledge")?,
        })
    }

    pub fn describe_retrieval(&self) -> PipelineInfo {
        self.pipeline.describe()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

fn build_care_graph(
    client: Arc<dyn GenerationClient + Send + Sync>,
) -> Result<CompiledGraph<CaseState>, GraphError> {
    let mut builder = GraphBuilder::new().strict(true);

    builder.add_node(
        "triage",
        agent_node(
            client.clone(),
            CareAgent::new("Triage Agent", TRIAGE_INSTRUCTION),
            |state, output| state.triage = Some(output),
        ),
    );
    builder.add_node(
        "eligibility",
        agent_node(
            client.clone(),
            CareAgent::new("Program Eligibility Agent", ELIGIBILITY_INSTRUCTION),
            |state, output| state.program_eligibility = Some(output),
        ),
    );
    builder.add_node(
        "facility",
        agent_node(
            client.clone(),
            CareAgent::new("Facility Finder Agent", FACILITY_INSTRUCTION),
            |state, output| state.facility_finder = Some(output),
        ),
    );
    builder.add_node(
        "follow_up",
        agent_node(
            client.clone(),
            CareAgent::new("Follow-Up Agent", FOLLOW_UP_INSTRUCTION),
            |state, output| state.follow_up = Some(output),
        ),
    );
    builder.add_node(
        "analytics",
        agent_node(
            client.clone(),
            CareAgent::new("Health Analytics Agent", ANALYTICS_INSTRUCTION),
            |state, output| state.health_analytics = Some(output),
        ),
    );
    builder.add_node(
        "knowledge",
        agent_node(
            client,
            CareAgent::new("Knowledge Agent", KNOWLEDGE_INSTRUCTION),
            |state, output| state.knowledge = Some(output),
        ),
    );

    builder.add_edge("triage", "eligibility");
    builder.add_edge("eligibility", "facility");
    builder.add_edge("facility", "follow_up");
    builder.add_edge("follow_up", "analytics");
    builder.add_edge("analytics", "knowledge");
    builder.add_edge("knowledge", END);
    builder.set_entry_point("triage");

    builder.compile()
}

fn agent_node(
    client: Arc<dyn GenerationClient + Send + Sync>,
    agent: CareAgent,
    write: fn(&mut CaseState, AgentOutput),
) -> impl Fn(CaseState) -> Result<StepResult<CaseState>, BoxedStepError> + Send + Sync + 'static {
    move |mut state: CaseState| {
        let snapshot = state.snapshot();
        let output = agent.run(
            client.as_ref(),
            &state.patient_query,
            &snapshot,
            &state.retrieved_context,
        )?;
        write(&mut state, output);
        Ok(StepResult::State(state))
    }
}

fn default_profile() -> Map<String, Value> {
    let profile = json!({
        "name": "Ayesha",
        "age": 8,
        "city": "Lahore",
        "area": "Johar Town",
        "region": "Punjab",
        "nser_score": 24,
        "income_per_month_pkrs": 28000,
        "family_size": 6,
        "preferred_language": "Urdu",
        "conditions": ["Asthma"],
    });
    match profile {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
