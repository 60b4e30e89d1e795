//! Workspace view-model types
//!
//! Field names serialize in camelCase for the rendering layer. A workspace is
//! one of three shapes, decided once when its payload is converted (see
//! [`super::seed`]); handlers match on the variant instead of probing fields.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::config::ReducerConfig;

/// Marker in `workspace.type` selecting the creative writing toolkit
pub const CREATIVE_WRITING_TYPE: &str = "creative_writing_toolkit";

/// Evaluation status of a content item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ItemStatus {
    #[default]
    Unattempted,
    Correct,
    Incorrect,
    Excellent,
    Good,
    NeedsImprovement,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unattempted => "unattempted",
            Self::Correct => "correct",
            Self::Incorrect => "incorrect",
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::NeedsImprovement => "needs_improvement",
        }
    }

    /// Strict parse; `None` for anything unrecognized
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "unattempted" => Some(Self::Unattempted),
            "correct" => Some(Self::Correct),
            "incorrect" => Some(Self::Incorrect),
            "excellent" => Some(Self::Excellent),
            "good" => Some(Self::Good),
            "needs_improvement" | "needs-improvement" => Some(Self::NeedsImprovement),
            _ => None,
        }
    }

    /// Whether the item has been answered in any way
    pub fn is_attempted(&self) -> bool {
        !matches!(self, Self::Unattempted)
    }
}

/// Unknown statuses in stored items fall back to unattempted
impl From<String> for ItemStatus {
    fn from(raw: String) -> Self {
        Self::parse(&raw).unwrap_or_default()
    }
}

impl From<ItemStatus> for String {
    fn from(status: ItemStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which schema a workspace belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaGeneration {
    /// Math-only, items under `problems`
    Legacy,
    /// Any subject, items under `content`
    Current,
}

/// Aggregate progress, always taken from the emitting agent
///
/// Held as the agent sent it. Counts are read through lenient accessors so a
/// float or null in one field never invalidates the rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct WorkspaceStats(Map<String, Value>);

impl WorkspaceStats {
    pub fn new(attempted: u64, correct: u64, total: u64) -> Self {
        let mut map = Map::new();
        map.insert("attempted".to_string(), attempted.into());
        map.insert("correct".to_string(), correct.into());
        map.insert("total".to_string(), total.into());
        Self(map)
    }

    /// Zeroed stats for a workspace holding `total` items
    pub fn with_total(total: usize) -> Self {
        Self::new(0, 0, total as u64)
    }

    /// A non-negative whole count under `key`; floats are accepted when integral
    pub fn count(&self, key: &str) -> Option<u64> {
        let value = self.0.get(key)?;
        value.as_u64().or_else(|| {
            value
                .as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        })
    }

    pub fn attempted(&self) -> Option<u64> {
        self.count("attempted")
    }

    pub fn correct(&self) -> Option<u64> {
        self.count("correct")
    }

    pub fn total(&self) -> Option<u64> {
        self.count("total")
    }

    pub fn set_total(&mut self, total: usize) {
        self.0.insert("total".to_string(), (total as u64).into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Any JSON object is accepted verbatim
impl<'de> Deserialize<'de> for WorkspaceStats {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Object(map) => Ok(Self(map)),
            other => Err(serde::de::Error::custom(format!(
                "stats must be an object, got {other}"
            ))),
        }
    }
}

/// For payload `stats` fields: anything other than an object reads as absent
pub(crate) fn lenient_stats<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<WorkspaceStats>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => Some(WorkspaceStats(map)),
        _ => None,
    })
}

/// One exercise inside a workspace
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: String,
    /// Always equal to the item's position
    pub index: usize,
    pub text: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Value>,
    pub status: ItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation_criteria: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rubric_scores: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence_quality: Option<Value>,
    /// Authored by the agent rather than the learner
    pub is_function_controlled: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Creative writing toolkit, kept as the agent sent it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreativeWritingWorkspace {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brainstorming_section: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planning_sections: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Value>,
    pub created_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Current-generation workspace for any subject
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectWorkspace {
    pub subject: String,
    pub workspace_type: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub learning_objectives: Vec<String>,
    pub content: Vec<ContentItem>,
    pub stats: WorkspaceStats,
    pub created_at: String,
}

/// Legacy math workspace
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyMathWorkspace {
    /// Always `math`
    pub subject: String,
    /// Always `math_problems`
    pub workspace_type: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub problems: Vec<ContentItem>,
    pub stats: WorkspaceStats,
    pub created_at: String,
}

/// The live workspace
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Workspace {
    CreativeWriting(CreativeWritingWorkspace),
    Subject(SubjectWorkspace),
    LegacyMath(LegacyMathWorkspace),
}

impl Workspace {
    pub fn generation(&self) -> SchemaGeneration {
        match self {
            Self::CreativeWriting(_) | Self::Subject(_) => SchemaGeneration::Current,
            Self::LegacyMath(_) => SchemaGeneration::Legacy,
        }
    }

    /// Items, or `None` for the creative writing toolkit
    pub fn items(&self) -> Option<&[ContentItem]> {
        match self {
            Self::CreativeWriting(_) => None,
            Self::Subject(ws) => Some(&ws.content),
            Self::LegacyMath(ws) => Some(&ws.problems),
        }
    }

    pub fn items_mut(&mut self) -> Option<&mut Vec<ContentItem>> {
        match self {
            Self::CreativeWriting(_) => None,
            Self::Subject(ws) => Some(&mut ws.content),
            Self::LegacyMath(ws) => Some(&mut ws.problems),
        }
    }

    /// Item count, zero for the creative writing toolkit
    pub fn item_count(&self) -> usize {
        self.items().map_or(0, <[ContentItem]>::len)
    }

    pub fn stats(&self) -> Option<&WorkspaceStats> {
        match self {
            Self::CreativeWriting(_) => None,
            Self::Subject(ws) => Some(&ws.stats),
            Self::LegacyMath(ws) => Some(&ws.stats),
        }
    }

    pub fn stats_mut(&mut self) -> Option<&mut WorkspaceStats> {
        match self {
            Self::CreativeWriting(_) => None,
            Self::Subject(ws) => Some(&mut ws.stats),
            Self::LegacyMath(ws) => Some(&mut ws.stats),
        }
    }

    /// Replace stats wholesale; ignored for the creative writing toolkit
    pub fn set_stats(&mut self, stats: WorkspaceStats) {
        if let Some(current) = self.stats_mut() {
            *current = stats;
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        match self {
            Self::CreativeWriting(ws) => ws.session_id.as_deref(),
            Self::Subject(ws) => ws.session_id.as_deref(),
            Self::LegacyMath(ws) => ws.session_id.as_deref(),
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            Self::CreativeWriting(ws) => ws.title.as_deref(),
            Self::Subject(ws) => Some(&ws.title),
            Self::LegacyMath(ws) => Some(&ws.title),
        }
    }

    pub fn created_at(&self) -> &str {
        match self {
            Self::CreativeWriting(ws) => &ws.created_at,
            Self::Subject(ws) => &ws.created_at,
            Self::LegacyMath(ws) => &ws.created_at,
        }
    }

    /// Rewrite every item's `index` to its position
    pub fn reindex(&mut self) {
        if let Some(items) = self.items_mut() {
            for (i, item) in items.iter_mut().enumerate() {
                item.index = i;
            }
        }
    }
}

/// Decodes a stored snapshot (same rules as a `currentWorkspace` bootstrap)
impl<'de> Deserialize<'de> for Workspace {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Workspace::restore(&value, &ReducerConfig::default())
            .map_err(|reason| serde::de::Error::custom(reason.to_string()))
    }
}
