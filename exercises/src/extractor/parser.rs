//! Message → structured document
//!
//! Extraction order: emphasized spans, problem headers, fraction products,
//! then remaining bare arithmetic. Candidates are de-duplicated by substring
//! containment as they are collected, so an earlier (richer) match always
//! wins over a later fragment of itself.

use std::sync::LazyLock;
use tracing::debug;

use super::patterns::{self, BARE_ARITHMETIC, FRACTION_PRODUCT, WHAT_IS};
use super::rules::RuleTable;
use super::types::{
    AssignmentData, ExplanationBlock, ExtractedDocument, LessonContext, MixedBlock,
    ProblemCandidate,
};
use crate::config::ExtractorConfig;
use crate::error::ExercisesResult;

/// Explanation titles, first entry whose keywords all appear wins
const EXPLANATION_TITLES: &[(&[&str], &str)] = &[
    (&["fraction", "multiply"], "Multiplying Fractions"),
    (&["fraction", "divid"], "Dividing Fractions"),
    (&["fraction"], "Working with Fractions"),
    (&["decimal"], "Working with Decimals"),
    (&["multiply"], "Multiplication Strategy"),
    (&["divid"], "Division Strategy"),
    (&["subtract"], "Subtraction Strategy"),
    (&["addition"], "Addition Strategy"),
];

static DEFAULT_EXTRACTOR: LazyLock<ContentExtractor> = LazyLock::new(ContentExtractor::new);

/// Extract with the built-in rules and default config
pub fn extract(message: &str, lesson: Option<&LessonContext>) -> Option<ExtractedDocument> {
    DEFAULT_EXTRACTOR.extract(message, lesson)
}

/// Cheap pre-check: does any detector fire on `text`
pub fn has_structured_content(text: &str) -> bool {
    DEFAULT_EXTRACTOR.has_structured_content(text)
}

/// Heuristic exercise extractor
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    rules: RuleTable,
    config: ExtractorConfig,
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentExtractor {
    pub fn new() -> Self {
        Self::with_rules(RuleTable::default(), ExtractorConfig::default())
    }

    /// Build from config, loading `rules_path` when set
    pub fn with_config(config: ExtractorConfig) -> ExercisesResult<Self> {
        let rules = match &config.rules_path {
            Some(path) => RuleTable::load_yaml_file(path)?,
            None => RuleTable::default(),
        };
        Ok(Self::with_rules(rules, config))
    }

    pub fn with_rules(rules: RuleTable, config: ExtractorConfig) -> Self {
        Self { rules, config }
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn has_structured_content(&self, text: &str) -> bool {
        !text.trim().is_empty() && patterns::detect(text)
    }

    /// Turn an agent message into a document, or `None` when nothing was found
    pub fn extract(
        &self,
        message: &str,
        lesson: Option<&LessonContext>,
    ) -> Option<ExtractedDocument> {
        let message = message.trim();
        if message.is_empty() || !patterns::detect(message) {
            return None;
        }

        let candidates = self.collect_candidates(message);
        if !candidates.is_empty() {
            debug!(count = candidates.len(), "Extracted problem candidates");
            if patterns::has_explanatory_cues(message) {
                let mut content = Vec::with_capacity(candidates.len() + 1);
                content.push(MixedBlock::Explanation(self.explanation(message)));
                content.extend(candidates.into_iter().map(MixedBlock::Problem));
                return Some(ExtractedDocument::Mixed { content });
            }
            return Some(ExtractedDocument::MathProblems {
                problems: candidates,
            });
        }

        match lesson {
            Some(ctx) if patterns::has_assignment_cue(message) => {
                debug!(title = %ctx.title, "Synthesizing assignment from lesson context");
                Some(ExtractedDocument::Assignment {
                    data: self.assignment(ctx),
                })
            }
            _ => None,
        }
    }

    fn collect_candidates(&self, message: &str) -> Vec<ProblemCandidate> {
        let mut collector = CandidateCollector::new(&self.rules);

        for span in patterns::emphasized_spans(message) {
            if patterns::contains_arithmetic(span) {
                collector.push(patterns::strip_header_label(span));
            }
        }

        for body in patterns::header_bodies(message) {
            if patterns::contains_arithmetic(&body) {
                collector.push(&body);
            }
        }

        for m in FRACTION_PRODUCT.find_iter(message) {
            collector.push(m.as_str());
        }

        for m in WHAT_IS.find_iter(message) {
            collector.push(m.as_str());
        }
        for m in BARE_ARITHMETIC.find_iter(message) {
            collector.push(m.as_str());
        }

        collector.into_candidates()
    }

    fn explanation(&self, message: &str) -> ExplanationBlock {
        let lower = message.to_lowercase();
        let title = EXPLANATION_TITLES
            .iter()
            .find(|(keywords, _)| keywords.iter().all(|k| lower.contains(k)))
            .map(|(_, title)| (*title).to_string())
            .unwrap_or_else(|| self.config.default_explanation_title.clone());

        ExplanationBlock {
            title,
            content: patterns::strip_emphasis(message).trim().to_string(),
        }
    }

    fn assignment(&self, ctx: &LessonContext) -> AssignmentData {
        let cap = self.config.max_assignment_items;
        let plan = &ctx.lesson_json;
        AssignmentData {
            title: ctx.title.clone(),
            content_type: ctx.content_type.clone(),
            objectives: plan.learning_objectives.iter().take(cap).cloned().collect(),
            questions: plan.tasks_or_questions.iter().take(cap).cloned().collect(),
            estimated_time: plan.estimated_completion_time_minutes,
        }
    }
}

/// Accumulates candidates, dropping any that overlap one already held
struct CandidateCollector<'a> {
    rules: &'a RuleTable,
    candidates: Vec<ProblemCandidate>,
    keys: Vec<String>,
}

impl<'a> CandidateCollector<'a> {
    fn new(rules: &'a RuleTable) -> Self {
        Self {
            rules,
            candidates: Vec::new(),
            keys: Vec::new(),
        }
    }

    fn push(&mut self, raw: &str) {
        let text = raw.trim();
        if text.is_empty() {
            return;
        }
        let key = patterns::dedup_key(text);
        if self.is_duplicate(text, &key) {
            return;
        }

        let (kind, hint) = self.rules.classify_with_hint(text);
        self.candidates.push(ProblemCandidate {
            text: text.to_string(),
            kind,
            hint,
        });
        self.keys.push(key);
    }

    fn is_duplicate(&self, text: &str, key: &str) -> bool {
        self.candidates
            .iter()
            .zip(&self.keys)
            .any(|(held, held_key)| {
                held.text.contains(text)
                    || text.contains(held.text.as_str())
                    || held_key.contains(key)
                    || key.contains(held_key.as_str())
            })
    }

    fn into_candidates(self) -> Vec<ProblemCandidate> {
        self.candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::rules::ProblemKind;
    use crate::extractor::types::LessonPlan;

    fn lesson() -> LessonContext {
        LessonContext {
            title: "Fractions Week".to_string(),
            content_type: Some("worksheet".to_string()),
            lesson_json: LessonPlan {
                learning_objectives: (1..=10).map(|i| format!("Objective {}", i)).collect(),
                tasks_or_questions: vec!["Shade 1 of 4 parts".to_string()],
                estimated_completion_time_minutes: Some(25),
            },
        }
    }

    #[test]
    fn test_emphasized_question() {
        let doc = extract("**What is 27 + 15?**", None).unwrap();
        assert_eq!(
            doc,
            ExtractedDocument::MathProblems {
                problems: vec![ProblemCandidate {
                    text: "What is 27 + 15?".to_string(),
                    kind: ProblemKind::Addition,
                    hint: ProblemKind::Addition.default_hint().to_string(),
                }]
            }
        );
    }

    #[test]
    fn test_latex_fraction_product() {
        let doc = extract(r"Try this: \frac{2}{3} \times \frac{4}{5}", None).unwrap();
        let problems = doc.problems();
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].kind, ProblemKind::FractionMultiplication);
        assert_eq!(problems[0].text, r"\frac{2}{3} \times \frac{4}{5}");
    }

    #[test]
    fn test_headers_strip_label_and_dedup_bare() {
        let doc = extract(
            "Let's practice!\nProblem 1: 12 - 5 = ?\nProblem 2: 6 × 7 = ?",
            None,
        )
        .unwrap();
        let texts: Vec<&str> = doc.problems().iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["12 - 5 = ?", "6 × 7 = ?"]);
        assert_eq!(doc.problems()[0].kind, ProblemKind::Subtraction);
        assert_eq!(doc.problems()[1].kind, ProblemKind::Multiplication);
    }

    #[test]
    fn test_bold_header_with_label_inside() {
        let doc = extract("**Problem 1: 9 ÷ 3**", None).unwrap();
        let problems = doc.problems();
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].text, "9 ÷ 3");
        assert_eq!(problems[0].kind, ProblemKind::Division);
    }

    #[test]
    fn test_what_is_preferred_over_bare() {
        let doc = extract("Quick one: what is 8 * 4? Then 10 + 1.", None).unwrap();
        let texts: Vec<&str> = doc.problems().iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["what is 8 * 4?", "10 + 1"]);
    }

    #[test]
    fn test_explanatory_cues_make_mixed() {
        let message = "To multiply fractions, multiply the numerators together and the \
                       denominators together.\n\nTry 2/3 × 4/5.";
        let doc = extract(message, None).unwrap();
        match &doc {
            ExtractedDocument::Mixed { content } => {
                assert_eq!(content.len(), 2);
                match &content[0] {
                    MixedBlock::Explanation(block) => {
                        assert_eq!(block.title, "Multiplying Fractions");
                    }
                    other => panic!("expected explanation first, got {:?}", other),
                }
            }
            other => panic!("expected mixed, got {:?}", other),
        }
    }

    #[test]
    fn test_single_step_label_stays_problem_list() {
        let doc = extract("**Step 1:** add 3 + 4\n**Step 2:** add 5 + 6", None).unwrap();
        match &doc {
            ExtractedDocument::MathProblems { problems } => assert_eq!(problems.len(), 2),
            other => panic!("expected problems, got {:?}", other),
        }
    }

    #[test]
    fn test_default_explanation_title() {
        let doc = extract("Here are the steps: 4 + 4", None).unwrap();
        match doc {
            ExtractedDocument::Mixed { content } => match &content[0] {
                MixedBlock::Explanation(block) => assert_eq!(block.title, "Math Explanation"),
                other => panic!("unexpected block {:?}", other),
            },
            other => panic!("expected mixed, got {:?}", other),
        }
    }

    #[test]
    fn test_configured_explanation_title() {
        let extractor = ContentExtractor::with_rules(
            RuleTable::default(),
            ExtractorConfig {
                default_explanation_title: "Worked Example".to_string(),
                ..Default::default()
            },
        );
        let doc = extractor.extract("Steps: 4 + 4", None).unwrap();
        let ExtractedDocument::Mixed { content } = doc else {
            panic!("expected mixed");
        };
        assert_eq!(
            content[0],
            MixedBlock::Explanation(ExplanationBlock {
                title: "Worked Example".to_string(),
                content: "Steps: 4 + 4".to_string(),
            })
        );
    }

    #[test]
    fn test_assignment_fallback() {
        let ctx = lesson();
        let doc = extract("Ready to **tackle** your assignment?", Some(&ctx)).unwrap();
        let ExtractedDocument::Assignment { data } = doc else {
            panic!("expected assignment");
        };
        assert_eq!(data.title, "Fractions Week");
        assert_eq!(data.content_type.as_deref(), Some("worksheet"));
        assert_eq!(data.objectives.len(), 8);
        assert_eq!(data.questions, vec!["Shade 1 of 4 parts".to_string()]);
        assert_eq!(data.estimated_time, Some(25));
    }

    #[test]
    fn test_assignment_needs_context_and_cue() {
        let ctx = lesson();
        assert!(extract("Ready to **tackle** your assignment?", None).is_none());
        assert!(extract("Nice **work** today", Some(&ctx)).is_none());
    }

    #[test]
    fn test_arithmetic_wins_over_assignment() {
        let ctx = lesson();
        let doc = extract("For the assignment, start with 3 + 3.", Some(&ctx)).unwrap();
        assert_eq!(doc.doc_type(), "math_problems");
    }

    #[test]
    fn test_empty_and_plain_text() {
        assert!(extract("", None).is_none());
        assert!(extract("   \n ", None).is_none());
        assert!(extract("That is a great question about photosynthesis!", None).is_none());
        assert!(!has_structured_content("   "));
        assert!(has_structured_content("5 + 5"));
    }

    #[test]
    fn test_detected_without_candidates_is_none() {
        // Emphasis fires the detector but carries no arithmetic
        assert!(has_structured_content("**Great job!**"));
        assert!(extract("**Great job!**", None).is_none());
        assert!(extract("Problem 1: describe your favourite animal", None).is_none());
    }

    #[test]
    fn test_with_config_loads_rules_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("rules.yaml");
        std::fs::write(
            &path,
            "rules:\n  - kind: multiplication\n    pattern: '\\d'\n    hint: custom\n",
        )
        .unwrap();
        let extractor = ContentExtractor::with_config(ExtractorConfig {
            rules_path: Some(path),
            ..Default::default()
        })
        .unwrap();
        let doc = extractor.extract("1 + 1", None).unwrap();
        assert_eq!(doc.problems()[0].kind, ProblemKind::Multiplication);
        assert_eq!(doc.problems()[0].hint, "custom");
    }
}
