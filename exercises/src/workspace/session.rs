//! Single owner of the live workspace
//!
//! Agent actions and direct user edits both go through [`WorkspaceSession::dispatch`],
//! so there is exactly one writer.

use serde_json::Value;

use super::actions::Action;
use super::diff::WorkspaceDiff;
use super::events::WorkspaceEvent;
use super::reducer::{Reduction, WorkspaceReducer};
use super::types::Workspace;

/// What one dispatch changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dispatch {
    pub diff: WorkspaceDiff,
    pub events: Vec<WorkspaceEvent>,
}

#[derive(Debug, Clone, Default)]
pub struct WorkspaceSession {
    reducer: WorkspaceReducer,
    current: Option<Workspace>,
}

impl WorkspaceSession {
    pub fn new(reducer: WorkspaceReducer) -> Self {
        Self {
            reducer,
            current: None,
        }
    }

    /// Resume from a previously emitted workspace
    pub fn resume(reducer: WorkspaceReducer, workspace: Workspace) -> Self {
        Self {
            reducer,
            current: Some(workspace),
        }
    }

    pub fn current(&self) -> Option<&Workspace> {
        self.current.as_ref()
    }

    pub fn into_workspace(self) -> Option<Workspace> {
        self.current
    }

    pub fn dispatch(&mut self, actions: &[Action]) -> Dispatch {
        let reduction = self.reducer.reduce(actions, self.current.clone());
        self.commit(reduction)
    }

    pub fn dispatch_values(&mut self, actions: &[Value]) -> Dispatch {
        let reduction = self.reducer.reduce_values(actions, self.current.clone());
        self.commit(reduction)
    }

    fn commit(&mut self, reduction: Reduction) -> Dispatch {
        let diff = WorkspaceDiff::between(self.current.as_ref(), reduction.workspace.as_ref());
        self.current = reduction.workspace;
        Dispatch {
            diff,
            events: reduction.events,
        }
    }
}
