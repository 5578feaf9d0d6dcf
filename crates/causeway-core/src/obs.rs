//! Structured observability hooks for cause resolution.
//!
//! This module provides:
//! - A resolve-scoped tracing span via the `ResolveSpan` RAII guard
//! - Emission functions for resolution lifecycle and collaborator failures
//!
//! Verbosity is controlled through `RUST_LOG`; see [`crate::telemetry`].

use tracing::{debug, error, info, warn};

use crate::annotation::RunKey;
use crate::engine::FlowNodeId;

/// RAII guard that enters a resolve-scoped tracing span for the duration of
/// one top-level resolution.
pub struct ResolveSpan {
    _span: tracing::span::EnteredSpan,
}

impl ResolveSpan {
    /// Create and enter a span tagged with the run being resolved.
    pub fn enter(job_name: &str, build_number: u64) -> Self {
        let span = tracing::info_span!("causeway.resolve", job = %job_name, build = build_number);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: a top-level resolution finished with `count` root causes.
pub fn emit_causes_resolved(job_name: &str, build_number: u64, count: usize) {
    info!(
        event = "causes.resolved",
        job = %job_name,
        build = build_number,
        count = count,
    );
}

/// Emit event: the engine failed to read a flow-node during a graph walk.
/// The walk continues without that branch.
pub fn emit_node_read_failed(job_name: &str, node_id: &FlowNodeId, error: &dyn std::fmt::Display) {
    warn!(event = "flow.node_read_failed", job = %job_name, node = %node_id, error = %error);
}

/// Emit event: a cached parent link no longer resolves in the parent
/// execution. Resolution falls back to the flat upstream path.
pub fn emit_parent_link_stale(run: &RunKey, node_id: &FlowNodeId, error: &dyn std::fmt::Display) {
    error!(event = "link.stale", run = %run, node = %node_id, error = %error);
}

/// Emit event: the heuristic matched a spawning head and the parent link
/// was attached to the child run.
pub fn emit_parent_link_attached(run: &RunKey, node_id: &FlowNodeId) {
    debug!(event = "link.attached", run = %run, node = %node_id);
}

/// Emit event: an upstream trigger named a run the registry cannot find.
/// The upstream cause is emitted with no children.
pub fn emit_upstream_run_missing(project: &str, build_number: u64) {
    debug!(event = "upstream.run_missing", project = %project, build = build_number);
}
