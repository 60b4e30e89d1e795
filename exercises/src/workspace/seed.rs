//! Lenient payload types and their conversion into a [`Workspace`]
//!
//! Agent payloads are untrusted: every field is optional here and the
//! conversion fills in defaults. Both `create_workspace` payloads and stored
//! snapshots go through these types.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

use super::types::{
    ContentItem, CreativeWritingWorkspace, ItemStatus, LegacyMathWorkspace, SubjectWorkspace,
    lenient_stats, Workspace, WorkspaceStats, CREATIVE_WRITING_TYPE,
};
use crate::config::ReducerConfig;
use crate::error::SkipReason;

const DEFAULT_ITEM_KIND: &str = "problem";
const DEFAULT_TITLE: &str = "Practice";
const DEFAULT_WORKSPACE_TYPE: &str = "practice";
const LEGACY_SUBJECT: &str = "math";
const LEGACY_WORKSPACE_TYPE: &str = "math_problems";

/// An item as an agent (or a snapshot) describes it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemSeed {
    /// String or number; generated when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub text: Option<String>,
    /// Other spellings of `text`, read in this order when it is absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    pub kind: Option<String>,
    /// Read when `kind` is absent
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    pub hint: Option<String>,
    pub difficulty: Option<Value>,
    pub status: Option<String>,
    pub feedback: Option<String>,
    pub evaluation_criteria: Option<Value>,
    pub rubric_scores: Option<Value>,
    pub evidence_quality: Option<Value>,
    /// Recomputed from position; accepted so snapshots decode cleanly
    #[serde(skip_serializing)]
    pub index: Option<Value>,
    #[serde(skip_serializing)]
    pub is_function_controlled: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ItemSeed {
    /// Item with just a text, as a host would author it
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn into_item(self, index: usize, config: &ReducerConfig) -> ContentItem {
        let id = match self.id {
            Some(Value::String(id)) if !id.is_empty() => id,
            Some(Value::Number(n)) => n.to_string(),
            _ => format!("{}-{}", config.item_id_prefix, Uuid::new_v4()),
        };
        ContentItem {
            id,
            index,
            text: first_present([self.text, self.question, self.problem, self.prompt])
                .unwrap_or_default(),
            kind: first_present([self.kind, self.type_name])
                .unwrap_or_else(|| DEFAULT_ITEM_KIND.to_string()),
            hint: self.hint,
            difficulty: self.difficulty,
            status: self.status.map(ItemStatus::from).unwrap_or_default(),
            feedback: self.feedback,
            evaluation_criteria: self.evaluation_criteria,
            rubric_scores: self.rubric_scores,
            evidence_quality: self.evidence_quality,
            is_function_controlled: true,
            extra: self.extra,
        }
    }
}

fn first_present<const N: usize>(spellings: [Option<String>; N]) -> Option<String> {
    spellings.into_iter().flatten().find(|s| !s.is_empty())
}

/// Map seeds to items positioned from `start`
pub(crate) fn items_from_seeds(
    seeds: Vec<ItemSeed>,
    start: usize,
    config: &ReducerConfig,
) -> Vec<ContentItem> {
    seeds
        .into_iter()
        .enumerate()
        .map(|(offset, seed)| seed.into_item(start + offset, config))
        .collect()
}

/// A non-creative workspace payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkspaceSeed {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub subject: Option<String>,
    pub workspace_type: Option<String>,
    pub title: Option<String>,
    pub explanation: Option<String>,
    pub session_id: Option<String>,
    pub learning_objectives: Vec<String>,
    pub content: Option<Vec<ItemSeed>>,
    pub problems: Option<Vec<ItemSeed>>,
    #[serde(deserialize_with = "lenient_stats")]
    pub stats: Option<WorkspaceStats>,
    pub created_at: Option<String>,
}

impl WorkspaceSeed {
    /// `subject` and `content` together select the current generation
    fn is_current(&self) -> bool {
        self.subject.is_some() && self.content.is_some()
    }

    fn into_subject(self, stats: Option<WorkspaceStats>, config: &ReducerConfig) -> Workspace {
        let content = items_from_seeds(self.content.unwrap_or_default(), 0, config);
        let stats = stats
            .or(self.stats)
            .unwrap_or_else(|| WorkspaceStats::with_total(content.len()));
        Workspace::Subject(SubjectWorkspace {
            subject: self.subject.unwrap_or_else(|| "general".to_string()),
            workspace_type: self
                .workspace_type
                .unwrap_or_else(|| DEFAULT_WORKSPACE_TYPE.to_string()),
            title: self.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            explanation: self.explanation,
            session_id: self.session_id,
            learning_objectives: self.learning_objectives,
            content,
            stats,
            created_at: self.created_at.unwrap_or_else(now),
        })
    }

    fn into_legacy(self, stats: Option<WorkspaceStats>, config: &ReducerConfig) -> Workspace {
        let seeds = self.problems.or(self.content).unwrap_or_default();
        let problems = items_from_seeds(seeds, 0, config);
        let stats = stats
            .or(self.stats)
            .unwrap_or_else(|| WorkspaceStats::with_total(problems.len()));
        Workspace::LegacyMath(LegacyMathWorkspace {
            subject: LEGACY_SUBJECT.to_string(),
            workspace_type: LEGACY_WORKSPACE_TYPE.to_string(),
            title: self.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            explanation: self.explanation,
            session_id: self.session_id,
            problems,
            stats,
            created_at: self.created_at.unwrap_or_else(now),
        })
    }
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

fn as_object(payload: &Value) -> Result<&Map<String, Value>, SkipReason> {
    payload.as_object().ok_or_else(|| SkipReason::Malformed {
        detail: "workspace payload is not an object".to_string(),
    })
}

fn is_creative(object: &Map<String, Value>) -> bool {
    object.get("type").and_then(Value::as_str) == Some(CREATIVE_WRITING_TYPE)
}

fn decode<T: for<'de> Deserialize<'de>>(payload: &Value) -> Result<T, SkipReason> {
    serde_json::from_value(payload.clone()).map_err(|e| SkipReason::Malformed {
        detail: e.to_string(),
    })
}

fn creative(payload: &Value) -> Result<Workspace, SkipReason> {
    let mut ws: CreativeWritingWorkspace = decode(payload)?;
    if ws.created_at.is_empty() {
        ws.created_at = now();
    }
    Ok(Workspace::CreativeWriting(ws))
}

impl Workspace {
    /// Convert a `create_workspace` payload
    ///
    /// `stats` is the action-level value, which wins over the payload's own.
    pub fn from_payload(
        payload: &Value,
        stats: Option<WorkspaceStats>,
        config: &ReducerConfig,
    ) -> Result<Workspace, SkipReason> {
        let object = as_object(payload)?;
        if is_creative(object) {
            debug!("Creating creative writing workspace");
            return creative(payload);
        }
        let seed: WorkspaceSeed = decode(payload)?;
        let ws = if seed.is_current() {
            seed.into_subject(stats, config)
        } else {
            seed.into_legacy(stats, config)
        };
        debug!(
            generation = ?ws.generation(),
            items = ws.item_count(),
            "Converted workspace payload"
        );
        Ok(ws)
    }

    /// Rebuild a workspace from a stored snapshot
    ///
    /// Unlike [`Workspace::from_payload`], a snapshot with a `content` array is
    /// current-generation even when it lacks `subject`; otherwise its
    /// `problems` are mapped into a legacy workspace.
    pub fn restore(snapshot: &Value, config: &ReducerConfig) -> Result<Workspace, SkipReason> {
        let object = as_object(snapshot)?;
        if is_creative(object) {
            return creative(snapshot);
        }
        let seed: WorkspaceSeed = decode(snapshot)?;
        let ws = if seed.content.is_some() {
            seed.into_subject(None, config)
        } else {
            seed.into_legacy(None, config)
        };
        Ok(ws)
    }
}
