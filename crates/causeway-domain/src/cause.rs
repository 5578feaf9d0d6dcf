//! The unified cause entity.
//!
//! A [`Cause`] explains why a run or pipeline stage started. Causes form a
//! tree: each cause carries the causes of the cause. The tree is freshly
//! allocated and strictly owned - it never references host objects.

use serde::{Deserialize, Serialize};

use crate::identity;

/// Semantic category of a cause.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum CauseKind {
    /// An SCM change triggered the run.
    Scm,

    /// A scheduled timer triggered the run.
    Timer,

    /// A user started the run manually.
    User,

    /// Another run or pipeline stage triggered the run.
    Upstream,

    /// The trigger record did not match any known category.
    Undefined,
}

impl std::fmt::Display for CauseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CauseKind::Scm => "SCM",
            CauseKind::Timer => "TIMER",
            CauseKind::User => "USER",
            CauseKind::Upstream => "UPSTREAM",
            CauseKind::Undefined => "UNDEFINED",
        })
    }
}

/// A resolved explanation of why a run or stage started.
///
/// Identity is a pure function of the scalar fields (`kind`, `user`,
/// `project`, `build_id`); `causes` never participates in it. Two causes
/// with identical scalars merge, keeping the first-seen instance's children.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cause {
    /// Semantic category.
    pub kind: CauseKind,

    /// Triggering identity (USER causes only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Canonical job or stage identifier (UPSTREAM causes only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    /// Identifier of the triggering execution or stage instance
    /// (UPSTREAM causes only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_id: Option<String>,

    /// The causes of the cause, in resolution order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<Cause>,
}

impl Cause {
    fn bare(kind: CauseKind) -> Self {
        Self {
            kind,
            user: None,
            project: None,
            build_id: None,
            causes: Vec::new(),
        }
    }

    /// An SCM-change cause. No type-specific fields.
    pub fn scm() -> Self {
        Self::bare(CauseKind::Scm)
    }

    /// A timer cause. No type-specific fields.
    pub fn timer() -> Self {
        Self::bare(CauseKind::Timer)
    }

    /// A manual user cause. The identity may be absent when the host does
    /// not record one.
    pub fn user(user_id: Option<String>) -> Self {
        Self {
            user: user_id,
            ..Self::bare(CauseKind::User)
        }
    }

    /// An upstream cause referencing the triggering job/stage and build.
    pub fn upstream(project: impl Into<String>, build_id: impl Into<String>) -> Self {
        Self {
            project: Some(project.into()),
            build_id: Some(build_id.into()),
            ..Self::bare(CauseKind::Upstream)
        }
    }

    /// A cause for an unrecognized trigger record.
    pub fn undefined() -> Self {
        Self::bare(CauseKind::Undefined)
    }

    /// Attach child causes, replacing any existing ones.
    pub fn with_causes(mut self, causes: Vec<Cause>) -> Self {
        self.causes = causes;
        self
    }

    /// Identity key over the scalar fields. See [`identity::identity_key`].
    pub fn identity_key(&self) -> String {
        identity::identity_key(self)
    }
}
