//! Error types
//!
//! Extraction and reduction never fail: they express problems as `None` or as a
//! skipped action. The errors here cover setup only (config files, rule tables)
//! plus the reasons recorded when an action is skipped.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for setup operations
pub type ExercisesResult<T> = Result<T, ExercisesError>;

/// Errors raised while loading configuration or rule tables
#[derive(Error, Debug)]
pub enum ExercisesError {
    /// Config or rule file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML
    #[error("Invalid config TOML: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Rule table is not valid YAML
    #[error("Invalid rule table YAML: {0}")]
    RuleTableParse(#[from] serde_yaml::Error),

    /// A rule pattern does not compile
    #[error("Invalid pattern for rule '{kind}': {source}")]
    InvalidPattern {
        kind: String,
        #[source]
        source: regex::Error,
    },

    /// Rule table has no rules
    #[error("Rule table is empty")]
    EmptyRuleTable,
}

impl ExercisesError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Why an action was applied as a no-op.
///
/// Recorded on the reduction's event list and logged; never returned as `Err`.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Payload could not be decoded at all
    #[error("malformed action: {detail}")]
    Malformed { detail: String },

    /// A field the action needs is absent
    #[error("missing required field '{field}'")]
    MissingField { field: String },

    /// Index does not name an existing item
    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// No workspace is live and nothing to bootstrap from
    #[error("no active workspace")]
    NoWorkspace,

    /// The live workspace carries no items (creative writing toolkit)
    #[error("workspace has no items field")]
    NoItemsField,

    /// Tag not understood by this reducer
    #[error("unknown action tag")]
    UnknownAction,
}

impl SkipReason {
    pub(crate) fn missing(field: &str) -> Self {
        Self::MissingField {
            field: field.to_string(),
        }
    }
}
