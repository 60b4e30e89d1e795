//! Workspace reducer
//!
//! Turns the agent's ordered action stream into the workspace view-model the
//! UI renders.

pub mod actions;
pub mod diff;
pub mod events;
pub mod reducer;
pub mod seed;
pub mod session;
pub mod types;

pub use actions::{
    Action, AddItems, AgentError, CreateWorkspace, EvaluateContent, ItemIndex, MarkItem,
};
pub use diff::WorkspaceDiff;
pub use events::{MarkObserver, WorkspaceEvent};
pub use reducer::{Reduction, WorkspaceReducer};
pub use seed::{ItemSeed, WorkspaceSeed};
pub use session::{Dispatch, WorkspaceSession};
pub use types::{
    ContentItem, CreativeWritingWorkspace, ItemStatus, LegacyMathWorkspace, SchemaGeneration,
    SubjectWorkspace, Workspace, WorkspaceStats, CREATIVE_WRITING_TYPE,
};
