//! Trigger-record classification.

use causeway_domain::{Cause, TriggerRecord};

/// Classify one trigger record into a cause with its type-specific fields
/// populated and an empty child list.
///
/// Pure function, first match wins: SCM, then timer, then user, then
/// upstream; anything else is UNDEFINED. Upstream causes carry the raw
/// declared project name - canonicalization and child resolution happen in
/// the run-cause resolver.
pub fn classify(record: &TriggerRecord) -> Cause {
    match record {
        TriggerRecord::ScmChange => Cause::scm(),
        TriggerRecord::Timer => Cause::timer(),
        TriggerRecord::Manual { user_id } => Cause::user(user_id.clone()),
        TriggerRecord::UpstreamBuild {
            project,
            build_number,
        } => Cause::upstream(project.clone(), build_number.to_string()),
        TriggerRecord::Remote { .. } | TriggerRecord::Unknown { .. } => Cause::undefined(),
    }
}
