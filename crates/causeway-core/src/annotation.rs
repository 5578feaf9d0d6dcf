//! Parent-link annotations.
//!
//! Once the locator has established "child run X was spawned by flow-node Y
//! of its parent execution", that fact is immutable and worth caching: it is
//! attached to the child run so future lookups are O(1). The store is a
//! narrow get/attach capability keyed by run identity, decoupled from the
//! host's own object model.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::engine::{FlowNodeId, RunView};

/// Identity of a run: job name plus build number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunKey {
    pub job_name: String,
    pub build_number: u64,
}

impl RunKey {
    pub fn new(job_name: impl Into<String>, build_number: u64) -> Self {
        Self {
            job_name: job_name.into(),
            build_number,
        }
    }

    /// Key of an existing run view.
    pub fn of(run: &dyn RunView) -> Self {
        Self::new(run.job_name(), run.build_number())
    }
}

impl std::fmt::Display for RunKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.job_name, self.build_number)
    }
}

/// Storage capability for parent-link annotations.
///
/// Writes are attach-if-absent: the first stored link for a run wins and is
/// never mutated or deleted. Duplicate attaches of the same value are
/// harmless, so implementations need no stronger coordination than their
/// own interior mutability.
pub trait ParentLinkStore: Send + Sync {
    /// The stored link for a run, if one was ever attached.
    fn get(&self, run: &RunKey) -> Option<FlowNodeId>;

    /// Attach a link unless one is already present.
    fn put_if_absent(&self, run: &RunKey, node: FlowNodeId);
}

/// In-memory parent-link store backed by a `Mutex<HashMap>`.
#[derive(Debug, Default)]
pub struct MemoryParentLinkStore {
    links: Mutex<HashMap<RunKey, FlowNodeId>>,
}

impl MemoryParentLinkStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ParentLinkStore for MemoryParentLinkStore {
    fn get(&self, run: &RunKey) -> Option<FlowNodeId> {
        let links = self.links.lock().unwrap();
        links.get(run).cloned()
    }

    fn put_if_absent(&self, run: &RunKey, node: FlowNodeId) {
        let mut links = self.links.lock().unwrap();
        links.entry(run.clone()).or_insert(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_key_display() {
        let key = RunKey::new("team/app", 42);
        assert_eq!(key.to_string(), "team/app#42");
    }

    #[test]
    fn test_get_returns_attached_link() {
        let store = MemoryParentLinkStore::new();
        let key = RunKey::new("app", 1);
        assert!(store.get(&key).is_none());

        store.put_if_absent(&key, FlowNodeId::new("17"));
        assert_eq!(store.get(&key), Some(FlowNodeId::new("17")));
    }

    #[test]
    fn test_put_if_absent_keeps_first_link() {
        let store = MemoryParentLinkStore::new();
        let key = RunKey::new("app", 1);

        store.put_if_absent(&key, FlowNodeId::new("17"));
        store.put_if_absent(&key, FlowNodeId::new("99"));
        assert_eq!(store.get(&key), Some(FlowNodeId::new("17")));
    }

    #[test]
    fn test_links_are_scoped_per_run() {
        let store = MemoryParentLinkStore::new();
        store.put_if_absent(&RunKey::new("app", 1), FlowNodeId::new("17"));
        assert!(store.get(&RunKey::new("app", 2)).is_none());
        assert!(store.get(&RunKey::new("other", 1)).is_none());
    }
}
