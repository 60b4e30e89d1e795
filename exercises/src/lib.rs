//! Exercise extraction and workspace reduction
//!
//! Two pieces sit between a tutoring agent and the UI that renders its
//! practice area:
//! - **Extractor**: scans a free-form agent message for embedded exercises and
//!   returns a structured document (`math_problems`, `mixed` or `assignment`),
//!   or `None` when the message carries no exercise signal.
//! - **Reducer**: folds the agent's ordered action stream (`create_workspace`,
//!   `add_content`, `evaluate_content`, `mark_correct`, ...) into the single
//!   live workspace view-model.
//!
//! Neither piece performs I/O or returns an error during normal operation.
//! Setup (config files, custom rule tables) is the only fallible surface.
//!
//! # Usage
//!
//! ```
//! use exercises::{extract, ExtractedDocument, WorkspaceReducer};
//! use serde_json::json;
//!
//! let doc = extract("**What is 27 + 15?**", None).unwrap();
//! assert!(matches!(doc, ExtractedDocument::MathProblems { .. }));
//!
//! let ws = WorkspaceReducer::new().apply_values(
//!     &[
//!         json!({ "action": "create_workspace", "workspace": { "problems": [{ "text": "27 + 15" }] } }),
//!         json!({ "action": "mark_correct", "index": 0 }),
//!     ],
//!     None,
//! );
//! assert_eq!(ws.unwrap().item_count(), 1);
//! ```

pub mod config;
pub mod error;
pub mod extractor;
pub mod workspace;

pub use config::{ExercisesConfig, ExtractorConfig, ReducerConfig};
pub use error::{ExercisesError, ExercisesResult, SkipReason};

// Re-export key extractor types
pub use extractor::{
    extract, has_structured_content, ContentExtractor, ExtractedDocument, LessonContext,
    MixedBlock, ProblemCandidate, ProblemKind, RuleTable,
};

// Re-export key workspace types
pub use workspace::{
    Action, ContentItem, ItemStatus, MarkObserver, Reduction, SchemaGeneration, Workspace,
    WorkspaceDiff, WorkspaceEvent, WorkspaceReducer, WorkspaceSession, WorkspaceStats,
};
