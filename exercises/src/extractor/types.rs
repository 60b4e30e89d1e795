//! Extractor input and output types

use serde::{Deserialize, Serialize};

use super::rules::ProblemKind;

/// A problem found in an agent message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemCandidate {
    pub text: String,
    pub kind: ProblemKind,
    pub hint: String,
}

/// Lead-in block of a mixed document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplanationBlock {
    pub title: String,
    pub content: String,
}

/// One entry of a mixed document's `content`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MixedBlock {
    Explanation(ExplanationBlock),
    Problem(ProblemCandidate),
}

/// Assignment synthesized from lesson context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentData {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub objectives: Vec<String>,
    pub questions: Vec<String>,
    /// Minutes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<u32>,
}

/// Extractor output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExtractedDocument {
    MathProblems { problems: Vec<ProblemCandidate> },
    Mixed { content: Vec<MixedBlock> },
    Assignment { data: AssignmentData },
}

impl ExtractedDocument {
    /// Wire tag of this document
    pub fn doc_type(&self) -> &'static str {
        match self {
            Self::MathProblems { .. } => "math_problems",
            Self::Mixed { .. } => "mixed",
            Self::Assignment { .. } => "assignment",
        }
    }

    /// Problem candidates regardless of shape; empty for assignments
    pub fn problems(&self) -> Vec<&ProblemCandidate> {
        match self {
            Self::MathProblems { problems } => problems.iter().collect(),
            Self::Mixed { content } => content
                .iter()
                .filter_map(|block| match block {
                    MixedBlock::Problem(p) => Some(p),
                    MixedBlock::Explanation(_) => None,
                })
                .collect(),
            Self::Assignment { .. } => Vec::new(),
        }
    }
}

/// Lesson the conversation is attached to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LessonContext {
    pub title: String,
    pub content_type: Option<String>,
    pub lesson_json: LessonPlan,
}

/// Body of a lesson (`lesson_json`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LessonPlan {
    pub learning_objectives: Vec<String>,
    pub tasks_or_questions: Vec<String>,
    pub estimated_completion_time_minutes: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_math_problems_wire_shape() {
        let doc = ExtractedDocument::MathProblems {
            problems: vec![ProblemCandidate {
                text: "6 × 7".to_string(),
                kind: ProblemKind::Multiplication,
                hint: "h".to_string(),
            }],
        };
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({
                "type": "math_problems",
                "problems": [{ "text": "6 × 7", "kind": "multiplication", "hint": "h" }]
            })
        );
    }

    #[test]
    fn test_mixed_wire_shape() {
        let doc = ExtractedDocument::Mixed {
            content: vec![
                MixedBlock::Explanation(ExplanationBlock {
                    title: "Math Explanation".to_string(),
                    content: "c".to_string(),
                }),
                MixedBlock::Problem(ProblemCandidate {
                    text: "1 + 1".to_string(),
                    kind: ProblemKind::Addition,
                    hint: "h".to_string(),
                }),
            ],
        };
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["type"], "mixed");
        assert_eq!(value["content"][0]["type"], "explanation");
        assert_eq!(value["content"][1]["type"], "problem");
        assert_eq!(value["content"][1]["kind"], "addition");
        assert_eq!(doc.problems().len(), 1);
    }

    #[test]
    fn test_lesson_context_from_snake_case() {
        let ctx: LessonContext = serde_json::from_value(json!({
            "title": "Fractions",
            "content_type": "worksheet",
            "lesson_json": {
                "learning_objectives": ["a"],
                "estimated_completion_time_minutes": 20
            }
        }))
        .unwrap();
        assert_eq!(ctx.content_type.as_deref(), Some("worksheet"));
        assert!(ctx.lesson_json.tasks_or_questions.is_empty());
        assert_eq!(ctx.lesson_json.estimated_completion_time_minutes, Some(20));
    }
}
