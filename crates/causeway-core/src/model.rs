//! In-memory host model.
//!
//! Implements every collaborator trait over plain data, without any
//! external dependencies: a [`MemoryHost`] registry of runs, each optionally
//! carrying a [`MemoryFlowGraph`] execution. Backs the integration tests and
//! the `causeway` CLI, which loads a [`HostModel`] document from JSON.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use causeway_domain::{CauseError, Result, TriggerRecord};

use crate::annotation::{MemoryParentLinkStore, ParentLinkStore, RunKey};
use crate::engine::{FlowGraphView, FlowNodeId, FlowNodeKind, FlowNodeMeta, RunRegistry, RunView};

// ---------------------------------------------------------------------------
// Model documents
// ---------------------------------------------------------------------------

/// One flow-node in a recorded graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: String,

    pub display_name: String,

    #[serde(flatten)]
    pub kind: FlowNodeKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptor_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Parent node ids, in engine listing order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
}

impl NodeSpec {
    fn new(id: &str, display_name: &str, kind: FlowNodeKind) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            kind,
            descriptor_id: None,
            label: None,
            parents: Vec::new(),
        }
    }

    /// An atomic step node.
    pub fn step(id: &str, display_name: &str) -> Self {
        Self::new(id, display_name, FlowNodeKind::Step)
    }

    /// A stage-start boundary node.
    pub fn stage_start(id: &str, display_name: &str) -> Self {
        Self::new(id, display_name, FlowNodeKind::StageStart)
    }

    /// A stage-end boundary node paired with its start.
    pub fn stage_end(id: &str, display_name: &str, start: &str) -> Self {
        Self::new(
            id,
            display_name,
            FlowNodeKind::StageEnd {
                start: FlowNodeId::new(start),
            },
        )
    }

    /// A plain intermediate node.
    pub fn other(id: &str, display_name: &str) -> Self {
        Self::new(id, display_name, FlowNodeKind::Other)
    }

    pub fn with_descriptor(mut self, descriptor_id: &str) -> Self {
        self.descriptor_id = Some(descriptor_id.to_string());
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_parents(mut self, parents: &[&str]) -> Self {
        self.parents = parents.iter().map(|p| p.to_string()).collect();
        self
    }
}

/// A recorded flow-node graph for one pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSpec {
    pub nodes: Vec<NodeSpec>,

    /// Currently active head node ids.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub heads: Vec<String>,
}

/// One recorded run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSpec {
    pub job_name: String,

    /// Fully qualified display name; defaults to the job name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    pub build_number: u64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<TriggerRecord>,

    /// Present for pipeline runs with readable execution state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<GraphSpec>,
}

impl RunSpec {
    pub fn new(job_name: &str, build_number: u64) -> Self {
        Self {
            job_name: job_name.to_string(),
            display_name: None,
            build_number,
            triggers: Vec::new(),
            graph: None,
        }
    }

    pub fn with_display_name(mut self, display_name: &str) -> Self {
        self.display_name = Some(display_name.to_string());
        self
    }

    pub fn with_triggers(mut self, triggers: Vec<TriggerRecord>) -> Self {
        self.triggers = triggers;
        self
    }

    pub fn with_graph(mut self, graph: GraphSpec) -> Self {
        self.graph = Some(graph);
        self
    }
}

/// A pre-seeded parent link in a recorded model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkSpec {
    pub job_name: String,
    pub build_number: u64,
    /// Flow-node id within the parent execution.
    pub node: String,
}

/// A complete recorded host model: runs plus pre-seeded parent links.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostModel {
    pub runs: Vec<RunSpec>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parent_links: Vec<LinkSpec>,
}

impl HostModel {
    /// Parse a model document from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(CauseError::from)
    }

    /// Build the registry and the seeded link store.
    pub fn into_host(self) -> (Arc<MemoryHost>, Arc<MemoryParentLinkStore>) {
        let links = Arc::new(MemoryParentLinkStore::new());
        for link in &self.parent_links {
            links.put_if_absent(
                &RunKey::new(link.job_name.clone(), link.build_number),
                FlowNodeId::new(link.node.clone()),
            );
        }
        (MemoryHost::from_runs(self.runs), links)
    }
}

// ---------------------------------------------------------------------------
// MemoryHost
// ---------------------------------------------------------------------------

struct MemoryRun {
    job_name: String,
    display_name: String,
    build_number: u64,
    triggers: Vec<TriggerRecord>,
    execution: Option<Arc<MemoryFlowGraph>>,
}

impl RunView for MemoryRun {
    fn job_name(&self) -> &str {
        &self.job_name
    }

    fn full_display_name(&self) -> &str {
        &self.display_name
    }

    fn build_number(&self) -> u64 {
        self.build_number
    }

    fn triggers(&self) -> Vec<TriggerRecord> {
        self.triggers.clone()
    }

    fn execution(&self) -> Option<Arc<dyn FlowGraphView>> {
        self.execution
            .as_ref()
            .map(|graph| graph.clone() as Arc<dyn FlowGraphView>)
    }
}

/// In-memory run registry backed by a `HashMap<(job, build), run>`.
pub struct MemoryHost {
    runs: HashMap<(String, u64), Arc<MemoryRun>>,
}

impl MemoryHost {
    /// Build a registry from recorded runs.
    pub fn from_runs(specs: Vec<RunSpec>) -> Arc<Self> {
        let mut runs = HashMap::new();
        for spec in specs {
            let display_name = spec
                .display_name
                .clone()
                .unwrap_or_else(|| spec.job_name.clone());
            let execution = spec
                .graph
                .map(|graph| Arc::new(MemoryFlowGraph::new(&spec.job_name, spec.build_number, graph)));
            runs.insert(
                (spec.job_name.clone(), spec.build_number),
                Arc::new(MemoryRun {
                    job_name: spec.job_name,
                    display_name,
                    build_number: spec.build_number,
                    triggers: spec.triggers,
                    execution,
                }),
            );
        }
        Arc::new(Self { runs })
    }
}

impl RunRegistry for MemoryHost {
    fn lookup(&self, job_name: &str, build_number: u64) -> Option<Arc<dyn RunView>> {
        self.runs
            .get(&(job_name.to_string(), build_number))
            .map(|run| run.clone() as Arc<dyn RunView>)
    }
}

// ---------------------------------------------------------------------------
// MemoryFlowGraph
// ---------------------------------------------------------------------------

/// In-memory flow graph: node metadata plus parent adjacency, captured as a
/// point-in-time snapshot.
pub struct MemoryFlowGraph {
    job_name: String,
    build_number: u64,
    nodes: HashMap<FlowNodeId, FlowNodeMeta>,
    parents: HashMap<FlowNodeId, Vec<FlowNodeId>>,
    heads: Vec<FlowNodeId>,
}

impl MemoryFlowGraph {
    fn new(job_name: &str, build_number: u64, spec: GraphSpec) -> Self {
        let mut nodes = HashMap::new();
        let mut parents = HashMap::new();
        for node in spec.nodes {
            let id = FlowNodeId::new(node.id.clone());
            parents.insert(
                id.clone(),
                node.parents.iter().cloned().map(FlowNodeId).collect(),
            );
            nodes.insert(
                id.clone(),
                FlowNodeMeta {
                    id,
                    display_name: node.display_name,
                    kind: node.kind,
                    descriptor_id: node.descriptor_id,
                    label: node.label,
                },
            );
        }
        Self {
            job_name: job_name.to_string(),
            build_number,
            nodes,
            parents,
            heads: spec.heads.iter().cloned().map(FlowNodeId).collect(),
        }
    }
}

impl FlowGraphView for MemoryFlowGraph {
    fn job_name(&self) -> &str {
        &self.job_name
    }

    fn build_number(&self) -> u64 {
        self.build_number
    }

    fn node(&self, id: &FlowNodeId) -> Result<FlowNodeMeta> {
        self.nodes
            .get(id)
            .cloned()
            .ok_or_else(|| CauseError::NodeLookup {
                node_id: id.to_string(),
                reason: "node not present in execution".to_string(),
            })
    }

    fn parents(&self, id: &FlowNodeId) -> Vec<FlowNodeId> {
        self.parents.get(id).cloned().unwrap_or_default()
    }

    fn current_heads(&self) -> Vec<FlowNodeId> {
        self.heads.clone()
    }
}
