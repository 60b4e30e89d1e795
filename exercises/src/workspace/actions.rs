//! Agent actions
//!
//! Every payload field is optional at decode time. Required fields are checked
//! when the action is applied so a bad action becomes a recorded skip.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::seed::ItemSeed;
use super::types::{lenient_stats, WorkspaceStats};
use crate::error::SkipReason;

/// One entry of an agent's action stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    CreateWorkspace(CreateWorkspace),
    AddContent(AddItems),
    AddProblems(AddItems),
    EvaluateContent(EvaluateContent),
    MarkCorrect(MarkItem),
    MarkIncorrect(MarkItem),
    ClearWorkspace,
    Error(AgentError),
    #[serde(other)]
    Unknown,
}

impl Action {
    /// Decode one raw action
    pub fn from_value(value: Value) -> Result<Action, SkipReason> {
        serde_json::from_value(value).map_err(|e| SkipReason::Malformed {
            detail: e.to_string(),
        })
    }

    /// Wire tag
    pub fn tag(&self) -> &'static str {
        match self {
            Self::CreateWorkspace(_) => "create_workspace",
            Self::AddContent(_) => "add_content",
            Self::AddProblems(_) => "add_problems",
            Self::EvaluateContent(_) => "evaluate_content",
            Self::MarkCorrect(_) => "mark_correct",
            Self::MarkIncorrect(_) => "mark_incorrect",
            Self::ClearWorkspace => "clear_workspace",
            Self::Error(_) => "error",
            Self::Unknown => "unknown",
        }
    }

    pub fn create(workspace: Value) -> Self {
        Self::CreateWorkspace(CreateWorkspace {
            workspace: Some(workspace),
            stats: None,
        })
    }

    pub fn add_content(items: Vec<ItemSeed>) -> Self {
        Self::AddContent(AddItems {
            content: Some(items),
            ..Default::default()
        })
    }

    pub fn mark_correct(index: usize) -> Self {
        Self::MarkCorrect(MarkItem {
            index: ItemIndex::at(index),
            ..Default::default()
        })
    }

    pub fn mark_incorrect(index: usize) -> Self {
        Self::MarkIncorrect(MarkItem {
            index: ItemIndex::at(index),
            ..Default::default()
        })
    }
}

/// Target position under any of the spellings agents use
///
/// Each spelling is its own field so a payload carrying several of them still
/// decodes; [`ItemIndex::get`] picks the first one present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemIndex {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(rename = "problemIndex", skip_serializing_if = "Option::is_none")]
    pub problem_index: Option<usize>,
    #[serde(rename = "problem_index", skip_serializing_if = "Option::is_none")]
    pub problem_index_snake: Option<usize>,
    #[serde(rename = "contentIndex", skip_serializing_if = "Option::is_none")]
    pub content_index: Option<usize>,
}

impl ItemIndex {
    pub fn at(index: usize) -> Self {
        Self {
            index: Some(index),
            ..Default::default()
        }
    }

    pub fn get(&self) -> Option<usize> {
        self.index
            .or(self.problem_index)
            .or(self.problem_index_snake)
            .or(self.content_index)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateWorkspace {
    pub workspace: Option<Value>,
    #[serde(deserialize_with = "lenient_stats")]
    pub stats: Option<WorkspaceStats>,
}

/// Payload of `add_content` and `add_problems`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AddItems {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<ItemSeed>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problems: Option<Vec<ItemSeed>>,
    #[serde(deserialize_with = "lenient_stats", skip_serializing_if = "Option::is_none")]
    pub stats: Option<WorkspaceStats>,
    /// Full seed, adopted only when no workspace exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<Value>,
    /// Host snapshot used to bootstrap when no workspace exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_workspace: Option<Value>,
}

impl AddItems {
    /// New items, `content` first then `problems`
    pub(crate) fn take_items(&self) -> Result<Vec<ItemSeed>, SkipReason> {
        match (&self.content, &self.problems) {
            (None, None) => Err(SkipReason::missing("content")),
            (content, problems) => Ok(content
                .iter()
                .chain(problems.iter())
                .flatten()
                .cloned()
                .collect()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EvaluateContent {
    #[serde(flatten)]
    pub index: ItemIndex,
    pub status: Option<String>,
    pub feedback: Option<String>,
    pub evaluation_criteria: Option<Value>,
    pub rubric_scores: Option<Value>,
    pub evidence_quality: Option<Value>,
    #[serde(deserialize_with = "lenient_stats")]
    pub stats: Option<WorkspaceStats>,
}

impl EvaluateContent {
    /// Whether the action carries anything to write
    pub fn has_updates(&self) -> bool {
        self.status.is_some()
            || self.feedback.is_some()
            || self.evaluation_criteria.is_some()
            || self.rubric_scores.is_some()
            || self.evidence_quality.is_some()
            || self.stats.is_some()
    }
}

/// Payload of `mark_correct` and `mark_incorrect`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarkItem {
    #[serde(flatten)]
    pub index: ItemIndex,
    pub feedback: Option<String>,
    #[serde(deserialize_with = "lenient_stats")]
    pub stats: Option<WorkspaceStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentError {
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentError {
    /// `message`, falling back to `error`
    pub fn text(&self) -> Option<&str> {
        self.message.as_deref().or(self.error.as_deref())
    }
}
