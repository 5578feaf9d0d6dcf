//! Host collaborator traits: run registry and pipeline execution engine.
//!
//! The core reads host state through these seams and nothing else. Flow
//! nodes cross the boundary as identifiers plus owned metadata snapshots,
//! never as live references, so the cause tree's lifetime is decoupled from
//! the engine's mutating graph. Each implementation is expected to serve a
//! point-in-time view: one engine snapshot per top-level resolve call.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use causeway_domain::{Result, TriggerRecord};

/// Identifier of a flow-node within one pipeline execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowNodeId(pub String);

impl FlowNodeId {
    pub fn new(id: impl Into<String>) -> Self {
        FlowNodeId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FlowNodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FlowNodeId {
    fn from(id: &str) -> Self {
        FlowNodeId(id.to_string())
    }
}

/// Structural role of a flow-node in the step graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlowNodeKind {
    /// An atomic step (the only kind the enclosing-node heuristic matches).
    Step,

    /// Start boundary of a named stage.
    StageStart,

    /// End boundary of a named stage, paired with its start node.
    StageEnd { start: FlowNodeId },

    /// Any other node: block scaffolding, intermediate control nodes.
    Other,
}

/// Point-in-time metadata for a single flow-node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowNodeMeta {
    pub id: FlowNodeId,

    /// Human-readable name; for stage boundaries, the stage's display name.
    pub display_name: String,

    /// Structural role.
    #[serde(flatten)]
    pub kind: FlowNodeKind,

    /// Step descriptor identifier, when the engine exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptor_id: Option<String>,

    /// Label attached to the node, when any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Read-only view of one run supplied by the host registry.
pub trait RunView: Send + Sync {
    /// Canonical job identifier of this run.
    fn job_name(&self) -> &str;

    /// Fully qualified display name, as the engine labels trigger steps.
    fn full_display_name(&self) -> &str;

    /// Build number of this execution.
    fn build_number(&self) -> u64;

    /// Raw trigger-cause records, in engine-defined order.
    fn triggers(&self) -> Vec<TriggerRecord>;

    /// The run's pipeline execution, when it is a pipeline run whose
    /// execution state is currently readable.
    fn execution(&self) -> Option<Arc<dyn FlowGraphView>>;
}

/// Lookup of runs by job name and build number.
pub trait RunRegistry: Send + Sync {
    fn lookup(&self, job_name: &str, build_number: u64) -> Option<Arc<dyn RunView>>;
}

/// Point-in-time read access to one pipeline execution's step graph.
pub trait FlowGraphView: Send + Sync {
    /// Canonical job identifier of the owning run.
    fn job_name(&self) -> &str;

    /// Build number of the owning run.
    fn build_number(&self) -> u64;

    /// Node metadata by identifier. An `Err` is a collaborator read
    /// failure (e.g. a purged node behind a stale annotation); callers
    /// recover by treating it as not-found.
    fn node(&self, id: &FlowNodeId) -> Result<FlowNodeMeta>;

    /// Parent identifiers of a node, in the engine's listing order.
    /// Empty for the start of the observable graph.
    fn parents(&self, id: &FlowNodeId) -> Vec<FlowNodeId>;

    /// The execution's currently active head nodes.
    fn current_heads(&self) -> Vec<FlowNodeId>;
}
