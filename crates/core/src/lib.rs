pub mod agent;
pub mod chunking;
pub mod config;
pub mod error;
pub mod generation;
pub mod graph;
pub mod index;
pub mod orchestrator;
pub mod pipeline;
pub mod state;
pub mod vectorize;

pub use agent::CareAgent;
pub use chunking::{chunk_text, load_text_file};
pub use config::Settings;
pub use error::{
    ConfigError, GenerationError, GraphError, OrchestratorError, RetrievalError,
};
pub use generation::{GeminiClient, GenerationClient, GenerationResponse};
pub use graph::{BoxedStepError, CompiledGraph, GraphBuilder, NodeFn, StepResult, END};
pub use index::{DocumentChunk, DocumentIndex};
pub use orchestrator::{CareOrchestrator, CareReport};
pub use pipeline::{discover_corpus_files, PipelineInfo, RetrievalPipeline, RetrievedContext};
pub use state::{AgentOutput, CaseState};
pub use vectorize::{TermVector, Vectorizer};
