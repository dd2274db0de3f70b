use crate::error::GraphError;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Terminal sentinel. An edge pointing here means intentional completion;
/// edge absence is honored the same way.
pub const END: &str = "__end__";

pub type BoxedStepError = Box<dyn std::error::Error + Send + Sync>;

/// Value returned by a step function.
///
/// Steps normally hand back the canonical structured state. For
/// interoperability a step may instead return a loose key/value mapping,
/// which the executor reconciles into the structured form before the next
/// step runs, filling unset fields with their neutral defaults.
pub enum StepResult<S> {
    State(S),
    Loose(Map<String, Value>),
}

pub type NodeFn<S> = Box<dyn Fn(S) -> Result<StepResult<S>, BoxedStepError> + Send + Sync>;

/// Mutable accumulator for nodes and edges. Produces an immutable
/// [`CompiledGraph`] via [`GraphBuilder::compile`].
pub struct GraphBuilder<S> {
    nodes: HashMap<String, NodeFn<S>>,
    edges: HashMap<String, String>,
    entry_point: Option<String>,
    duplicates: Vec<String>,
    strict: bool,
}

impl<S> Default for GraphBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> GraphBuilder<S> {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: HashMap::new(),
            entry_point: None,
            duplicates: Vec::new(),
            strict: false,
        }
    }

    /// In strict mode, a node name registered twice fails at compile time.
    /// Otherwise the last registration wins.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn add_node<F>(&mut self, name: impl Into<String>, step: F)
    where
        F: Fn(S) -> Result<StepResult<S>, BoxedStepError> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.nodes.insert(name.clone(), Box::new(step)).is_some() {
            self.duplicates.push(name);
        }
    }

    /// Record that `to` runs after `from`. At most one outgoing edge per
    /// node; a later call for the same `from` overwrites the target.
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.edges.insert(from.into(), to.into());
    }

    pub fn set_entry_point(&mut self, name: impl Into<String>) {
        self.entry_point = Some(name.into());
    }

    pub fn compile(self) -> Result<CompiledGraph<S>, GraphError> {
        let entry_point = self.entry_point.ok_or(GraphError::MissingEntryPoint)?;

        if self.strict {
            if let Some(name) = self.duplicates.into_iter().next() {
                return Err(GraphError::DuplicateNode(name));
            }
        }

        Ok(CompiledGraph {
            entry_point,
            nodes: self.nodes,
            edges: self.edges,
        })
    }
}

/// Immutable executable chain of named steps. Safe to share and to `invoke`
/// repeatedly with fresh state.
pub struct CompiledGraph<S> {
    entry_point: String,
    nodes: HashMap<String, NodeFn<S>>,
    edges: HashMap<String, String>,
}

impl<S: DeserializeOwned> CompiledGraph<S> {
    /// Run the chain from the entry point until the [`END`] sentinel or an
    /// absent edge, threading one state value through every step.
    ///
    /// An edge naming an unregistered node is a wiring bug and fails at the
    /// point of transition. A step error propagates unchanged; the state as
    /// mutated up to the failing step is abandoned.
    pub fn invoke(&self, state: S) -> Result<S, GraphError> {
        let mut state = state;
        let mut current: &str = &self.entry_point;

        while current != END {
            let node = self
                .nodes
                .get(current)
                .ok_or_else(|| GraphError::UnknownNode(current.to_string()))?;

            let outcome = node(state).map_err(|source| GraphError::Step {
                node: current.to_string(),
                source,
            })?;

            state = match outcome {
                StepResult::State(next) => next,
                StepResult::Loose(map) => reconcile_loose(current, map)?,
            };

            current = match self.edges.get(current) {
                Some(next) => next,
                None => END,
            };
        }

        Ok(state)
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }
}

/// Explicit reconciliation of a loose mapping into the structured state.
/// Fields absent from the mapping take their neutral defaults; a field that
/// is present but has the wrong shape is a wiring bug and fails.
fn reconcile_loose<S: DeserializeOwned>(
    node: &str,
    map: Map<String, Value>,
) -> Result<S, GraphError> {
    serde_json::from_value(Value::Object(map)).map_err(|error| GraphError::StateReconciliation {
        node: node.to_string(),
        details: error.to_string(),
    })
}
