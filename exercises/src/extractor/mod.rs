//! Content extraction: agent message text → structured exercise document
//!
//! Best-effort and pure. Nothing found is `None`, never an error.

pub mod parser;
pub mod patterns;
pub mod rules;
pub mod types;

pub use parser::{extract, has_structured_content, ContentExtractor};
pub use patterns::{detect_signals, Signal};
pub use rules::{builtin_specs, ClassificationRule, ProblemKind, RuleSpec, RuleTable};
pub use types::{
    AssignmentData, ExplanationBlock, ExtractedDocument, LessonContext, LessonPlan, MixedBlock,
    ProblemCandidate,
};
