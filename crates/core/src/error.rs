use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("regex error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),
}

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("graph has no entry point; call set_entry_point before compile")]
    MissingEntryPoint,

    #[error("node '{0}' was registered more than once")]
    DuplicateNode(String),

    #[error("edge or entry point references unknown node '{0}'")]
    UnknownNode(String),

    #[error("node '{node}' failed: {source}")]
    Step {
        node: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("could not reconcile loose state returned by node '{node}': {details}")]
    StateReconciliation { node: String, details: String },
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("node '{0}' completed without recording its output")]
    MissingOutput(&'static str),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed settings file {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T, E = RetrievalError> = std::result::Result<T, E>;
