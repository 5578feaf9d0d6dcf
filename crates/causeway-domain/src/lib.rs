//! Causeway domain model.
//!
//! Defines the unified cause-tree entity produced by the resolvers, the
//! identity/deduplication machinery, the tagged trigger-record union built
//! at the host boundary, and the run-event envelope handed to the host's
//! event-serialization layer.

pub mod cause;
pub mod error;
pub mod events;
pub mod identity;
pub mod trigger;

// Re-export key types
pub use cause::{Cause, CauseKind};
pub use error::{CauseError, Result};
pub use events::{EventId, RunEvent, RunEventType};
pub use identity::{identity_key, CauseSet};
pub use trigger::TriggerRecord;
