//! Cause identity keys and order-preserving deduplication.
//!
//! The key is a deterministic encoding of `(kind, user, project, build_id)`
//! with a fixed separator and escaping scheme: distinct tuples never
//! collide, identical tuples never diverge. Children are excluded, so
//! structurally identical causes merge regardless of their subtrees.

use std::collections::HashMap;

use crate::cause::Cause;

/// Separates the encoded fields of a key.
const FIELD_SEPARATOR: char = '|';

/// Escapes separator and escape characters inside field values.
const ESCAPE: char = '\\';

fn push_escaped(out: &mut String, value: &str) {
    for ch in value.chars() {
        if ch == FIELD_SEPARATOR || ch == ESCAPE {
            out.push(ESCAPE);
        }
        out.push(ch);
    }
}

/// Compute the identity key of a cause.
///
/// Absent fields encode as `~`, present fields as `=` followed by the
/// escaped value, so `None` and `Some("~")` stay distinct and embedded
/// separators cannot bleed across field boundaries.
pub fn identity_key(cause: &Cause) -> String {
    let mut key = cause.kind.to_string();
    for field in [&cause.user, &cause.project, &cause.build_id] {
        key.push(FIELD_SEPARATOR);
        match field {
            Some(value) => {
                key.push('=');
                push_escaped(&mut key, value);
            }
            None => key.push('~'),
        }
    }
    key
}

/// Order-preserving, deduplicating cause accumulator.
///
/// An ordered sequence paired with a key-to-position map: inserts keep
/// first-seen order, later duplicates (by identity key) are dropped, so the
/// first-seen instance's children survive the merge.
#[derive(Debug, Default)]
pub struct CauseSet {
    ordered: Vec<Cause>,
    index: HashMap<String, usize>,
}

impl CauseSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a cause. Returns `false` if an equal-identity cause was
    /// already present (the new one is discarded).
    pub fn insert(&mut self, cause: Cause) -> bool {
        let key = cause.identity_key();
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key, self.ordered.len());
        self.ordered.push(cause);
        true
    }

    /// Insert every cause, preserving encounter order.
    pub fn extend(&mut self, causes: impl IntoIterator<Item = Cause>) {
        for cause in causes {
            self.insert(cause);
        }
    }

    /// Number of distinct causes held.
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// True when no cause has been inserted.
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Consume the set, yielding causes in first-seen order.
    pub fn into_vec(self) -> Vec<Cause> {
        self.ordered
    }
}
