//! Enclosing-node location.
//!
//! Given a child run and its believed pipeline parent, find the flow-node
//! in the parent's execution that spawned the child. Two paths:
//!
//! - **Cached**: the child already carries a parent-link annotation; resolve
//!   the stored identifier against the parent execution. A read failure
//!   (e.g. the node was purged) is logged and treated as not-found for this
//!   call, with no retry.
//! - **Heuristic**: only valid near trigger time, while the spawning node is
//!   still among the parent's active heads. Scan the heads for the first
//!   atomic step that carries a label, whose descriptor marks it as a
//!   job-invocation step, and whose label ends with the child's fully
//!   qualified display name. On match the link is attached to the child run
//!   so future calls take the cached path.
//!
//! When the same downstream job is triggered concurrently from two distinct
//! points of one parent execution, the label-suffix match can select the
//! wrong head; first match wins.

use std::sync::Arc;

use crate::annotation::{ParentLinkStore, RunKey};
use crate::engine::{FlowGraphView, FlowNodeId, FlowNodeKind, FlowNodeMeta, RunView};
use crate::obs;

/// Descriptor-id suffix identifying a job-invocation step.
pub const TRIGGER_STEP_DESCRIPTOR_SUFFIX: &str = "BuildTriggerStep";

/// Locates the flow-node that spawned a child run.
pub struct NodeLocator {
    links: Arc<dyn ParentLinkStore>,
}

impl NodeLocator {
    pub fn new(links: Arc<dyn ParentLinkStore>) -> Self {
        Self { links }
    }

    /// Find the enclosing node of `child` in `parent`'s execution.
    ///
    /// Returns `None` when no cached link resolves and no active head
    /// matches the heuristic - callers fall back to flat upstream
    /// resolution.
    pub fn locate(&self, child: &dyn RunView, parent: &dyn FlowGraphView) -> Option<FlowNodeId> {
        let key = RunKey::of(child);

        if let Some(node_id) = self.links.get(&key) {
            // finished-run case: the annotation was attached at trigger time
            return match parent.node(&node_id) {
                Ok(meta) => Some(meta.id),
                Err(err) => {
                    obs::emit_parent_link_stale(&key, &node_id, &err);
                    None
                }
            };
        }

        // started-run case: the spawning step must still be an active head
        for head in parent.current_heads() {
            let meta = match parent.node(&head) {
                Ok(meta) => meta,
                Err(err) => {
                    obs::emit_node_read_failed(parent.job_name(), &head, &err);
                    continue;
                }
            };
            if is_spawning_step(&meta, child) {
                self.links.put_if_absent(&key, head.clone());
                obs::emit_parent_link_attached(&key, &head);
                return Some(head);
            }
        }

        None
    }
}

fn is_spawning_step(meta: &FlowNodeMeta, child: &dyn RunView) -> bool {
    matches!(meta.kind, FlowNodeKind::Step)
        && meta
            .descriptor_id
            .as_deref()
            .map_or(false, |d| d.ends_with(TRIGGER_STEP_DESCRIPTOR_SUFFIX))
        && meta
            .label
            .as_deref()
            .map_or(false, |l| l.ends_with(child.full_display_name()))
}
