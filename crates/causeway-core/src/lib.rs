//! Causeway resolution core.
//!
//! Resolves, for any run in a CI system, the causal chain that explains why
//! it started: upstream triggers, user actions, timers, SCM events, and
//! parent pipeline stages. Produces a canonical, deduplicated, ordered tree
//! of [`causeway_domain::Cause`] nodes.
//!
//! The host system is reached only through the narrow traits in [`engine`]
//! and [`annotation`]; [`model`] provides in-memory implementations for
//! tests and the `causeway` CLI.

pub mod annotation;
pub mod classify;
pub mod engine;
pub mod locate;
pub mod model;
pub mod obs;
pub mod policy;
pub mod resolver;
pub mod telemetry;

// Re-export key types
pub use annotation::{MemoryParentLinkStore, ParentLinkStore, RunKey};
pub use classify::classify;
pub use engine::{FlowGraphView, FlowNodeId, FlowNodeKind, FlowNodeMeta, RunRegistry, RunView};
pub use locate::{NodeLocator, TRIGGER_STEP_DESCRIPTOR_SUFFIX};
pub use model::{GraphSpec, HostModel, LinkSpec, MemoryHost, NodeSpec, RunSpec};
pub use policy::{FolderJobIdPolicy, IdentityJobIdPolicy, JobIdPolicy};
pub use resolver::CauseResolver;
pub use telemetry::init_tracing;

pub use causeway_domain::{
    identity_key, Cause, CauseError, CauseKind, CauseSet, EventId, Result, RunEvent, RunEventType,
    TriggerRecord,
};

/// Causeway version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
