//! Raw trigger records from the host run registry.
//!
//! The registry reports why a run was queued as a list of category-tagged
//! records. [`TriggerRecord`] is the tagged union built once at that
//! boundary; past it, the core never inspects host-specific record types.

use serde::{Deserialize, Serialize};

/// One trigger-cause record attached to a run, in the registry's own
/// category system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerRecord {
    /// A change was detected in source control.
    ScmChange,

    /// A configured schedule fired.
    Timer,

    /// A user queued the run manually. The identity may be absent for
    /// anonymous or system-initiated submissions.
    Manual {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_id: Option<String>,
    },

    /// An upstream build triggered this run.
    UpstreamBuild {
        /// Declared triggering project name - plain, folder-qualified, or
        /// comma-qualified.
        project: String,
        /// Build number of the triggering execution.
        build_number: u64,
    },

    /// A remote host invoked the run over the wire. No dedicated cause
    /// category exists downstream; classifies as UNDEFINED.
    Remote {
        host: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },

    /// Any record the registry reports that matches no known category.
    Unknown {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_record_serde_roundtrip() {
        let records = vec![
            TriggerRecord::ScmChange,
            TriggerRecord::Timer,
            TriggerRecord::Manual {
                user_id: Some("alice".to_string()),
            },
            TriggerRecord::UpstreamBuild {
                project: "team/app".to_string(),
                build_number: 42,
            },
            TriggerRecord::Remote {
                host: "ci.example.org".to_string(),
                note: None,
            },
            TriggerRecord::Unknown { description: None },
        ];
        let json = serde_json::to_string(&records).expect("serialize");
        let back: Vec<TriggerRecord> = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(records, back);
    }

    #[test]
    fn test_trigger_record_tagged_encoding() {
        let json = serde_json::to_string(&TriggerRecord::UpstreamBuild {
            project: "app".to_string(),
            build_number: 7,
        })
        .expect("serialize");
        assert!(json.contains("\"type\":\"upstream_build\""));
        assert!(json.contains("\"build_number\":7"));
    }
}
