//! Run-event envelope for the host's event-serialization layer.
//!
//! Causeway populates the `causes` field of these envelopes; it does not
//! own the wire format beyond the serde derives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cause::Cause;

/// A unique event ID (UUID).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

impl EventId {
    pub fn new() -> Self {
        EventId(Uuid::new_v4())
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle point the event describes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunEventType {
    /// The run has started executing.
    Started,

    /// The run has finished (any terminal state).
    Finished,
}

/// A run lifecycle event with its resolved cause chain attached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunEvent {
    pub event_id: EventId,

    /// Lifecycle point.
    pub event_type: RunEventType,

    /// Canonical job identifier of the run the event describes.
    pub project: String,

    /// Build identifier of the run the event describes.
    pub build_id: String,

    /// Resolved cause chain, in resolution order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<Cause>,

    /// When the event was assembled.
    pub timestamp: DateTime<Utc>,
}

impl RunEvent {
    /// Create an envelope with an empty cause chain.
    pub fn new(
        event_type: RunEventType,
        project: impl Into<String>,
        build_id: impl Into<String>,
    ) -> Self {
        Self {
            event_id: EventId::new(),
            event_type,
            project: project.into(),
            build_id: build_id.into(),
            causes: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Attach the resolved cause chain.
    pub fn with_causes(mut self, causes: Vec<Cause>) -> Self {
        self.causes = causes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_id_unique() {
        assert_ne!(EventId::new(), EventId::new());
    }

    #[test]
    fn test_run_event_serde_roundtrip() {
        let event = RunEvent::new(RunEventType::Finished, "team/app", "42")
            .with_causes(vec![Cause::scm()]);
        let json = serde_json::to_string(&event).expect("serialize");
        let back: RunEvent = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(event, back);
    }

    #[test]
    fn test_event_type_snake_case_tag() {
        let json = serde_json::to_string(&RunEventType::Started).expect("serialize");
        assert_eq!(json, "\"started\"");
    }

    #[test]
    fn test_empty_causes_skipped_in_json() {
        let event = RunEvent::new(RunEventType::Started, "app", "1");
        let json = serde_json::to_string(&event).expect("serialize");
        assert!(!json.contains("\"causes\""));
    }
}
