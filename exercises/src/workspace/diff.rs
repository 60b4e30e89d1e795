//! Structural diff between two workspace states
//!
//! Hosts use this to decide what to animate (new items sliding in, a status
//! badge changing) from the return value instead of inspecting both trees.

use serde::Serialize;

use super::types::Workspace;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceDiff {
    /// A workspace exists now that did not before
    pub created: bool,
    /// The workspace is gone
    pub cleared: bool,
    /// A different workspace took the place of the previous one
    pub replaced: bool,
    /// Indices of items that did not exist before
    pub appended: Vec<usize>,
    /// Indices of items present in both states whose contents differ
    pub changed: Vec<usize>,
    pub stats_changed: bool,
}

impl WorkspaceDiff {
    pub fn between(prev: Option<&Workspace>, next: Option<&Workspace>) -> Self {
        match (prev, next) {
            (None, None) => Self::default(),
            (Some(_), None) => Self {
                cleared: true,
                ..Default::default()
            },
            (None, Some(next)) => Self {
                created: true,
                appended: (0..next.item_count()).collect(),
                stats_changed: next.stats().is_some(),
                ..Default::default()
            },
            (Some(prev), Some(next)) if !same_workspace(prev, next) => Self {
                replaced: true,
                appended: (0..next.item_count()).collect(),
                stats_changed: prev.stats() != next.stats(),
                ..Default::default()
            },
            (Some(prev), Some(next)) => {
                let before = prev.items().unwrap_or_default();
                let after = next.items().unwrap_or_default();
                let mut diff = Self {
                    stats_changed: prev.stats() != next.stats(),
                    ..Default::default()
                };
                for (i, item) in after.iter().enumerate() {
                    match before.get(i) {
                        None => diff.appended.push(i),
                        Some(old) if old != item => diff.changed.push(i),
                        Some(_) => {}
                    }
                }
                diff
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Same variant, creation time and session
fn same_workspace(a: &Workspace, b: &Workspace) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
        && a.created_at() == b.created_at()
        && a.session_id() == b.session_id()
}
