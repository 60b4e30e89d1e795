//! Detection patterns for problem-like text
//!
//! The battery here only answers "does this text look like it carries
//! exercises". Classification lives in [`super::rules`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

const NUM: &str = r"\d+(?:\.\d+)?";
/// Operator with its surrounding whitespace; ASCII `-` and `/` need spaces on
/// both sides so dates, page ranges and scores stay prose
const OP: &str = r"(?:\s*(?:[+−×÷*·xX]|\\times|\\div|\\cdot)\s*|\s+[\-/]\s+)";
const LATEX_FRACTION: &str = r"\\frac\{\s*\d+\s*\}\{\s*\d+\s*\}";
const SLASH_FRACTION: &str = r"\(?\s*\d+\s*/\s*\d+\s*\)?";
const MUL_OP: &str = r"(?:×|\*|·|[xX]|\\times|\\cdot)";

/// `N op N`, chained: `3 + 4 - 2`
pub(crate) static BARE_ARITHMETIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"{NUM}{OP}{NUM}(?:{OP}{NUM})*")).unwrap());

/// "What is 6 × 7?"
pub(crate) static WHAT_IS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\bwhat\s+is\s+{NUM}{OP}{NUM}(?:{OP}{NUM})*(?:\s*=\s*\?|\s*\?)?"
    ))
    .unwrap()
});

/// `a/b × c/d` and `\frac{a}{b} \times \frac{c}{d}`
pub(crate) static FRACTION_PRODUCT: LazyLock<Regex> = LazyLock::new(|| {
    let fraction = format!(r"(?:{LATEX_FRACTION}|{SLASH_FRACTION})");
    Regex::new(&format!(r"{fraction}\s*{MUL_OP}\s*{fraction}")).unwrap()
});

/// `\frac{a}{b}`
pub(crate) static BRACKETED_FRACTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(LATEX_FRACTION).unwrap());

pub(crate) static DECIMAL_ARITHMETIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\d+\.\d+{OP}{NUM}|{NUM}{OP}\d+\.\d+"
    ))
    .unwrap()
});

/// "Problem 2: ..." / "**Question 3.** ..." with the body in group 1
pub(crate) static PROBLEM_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*(?:\*\*|__)?[ \t]*(?:problem|question)[ \t]*#?\d+[ \t]*[:.)][ \t]*(?:\*\*|__)?[ \t]*(.+)$")
        .unwrap()
});

static HEADER_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:problem|question)\s*#?\d+\s*[:.)]\s*").unwrap()
});

/// `**bold**` or `__bold__`, inner text in group 1 or 2
pub(crate) static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*\n]+?)\*\*|__([^_\n]+?)__").unwrap());

static STEPS_CUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bsteps\b").unwrap());
static FIRST_CUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bfirst\b").unwrap());
static SECOND_CUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bsecond\b").unwrap());
static MULTIPLY_TOGETHER_CUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)multiply[^.\n]*together").unwrap());
static NUMBERED_BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*\d+[.)][ \t]*\*\*").unwrap());

static ASSIGNMENT_CUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bassignment\b|\blearning\s+goals\b|\btackle\b").unwrap());

static TRAILING_UNKNOWN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*=\s*\?\s*$").unwrap());

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// One detector in the battery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    BareArithmetic,
    WhatIs,
    FractionProduct,
    BracketedFraction,
    DecimalArithmetic,
    ProblemHeader,
    Emphasis,
}

impl Signal {
    pub const ALL: [Signal; 7] = [
        Signal::BareArithmetic,
        Signal::WhatIs,
        Signal::FractionProduct,
        Signal::BracketedFraction,
        Signal::DecimalArithmetic,
        Signal::ProblemHeader,
        Signal::Emphasis,
    ];

    fn pattern(self) -> &'static Regex {
        match self {
            Self::BareArithmetic => &BARE_ARITHMETIC,
            Self::WhatIs => &WHAT_IS,
            Self::FractionProduct => &FRACTION_PRODUCT,
            Self::BracketedFraction => &BRACKETED_FRACTION,
            Self::DecimalArithmetic => &DECIMAL_ARITHMETIC,
            Self::ProblemHeader => &PROBLEM_HEADER,
            Self::Emphasis => &EMPHASIS,
        }
    }

    pub fn is_match(self, text: &str) -> bool {
        self.pattern().is_match(text)
    }
}

/// Every detector that fires on `text`
pub fn detect_signals(text: &str) -> Vec<Signal> {
    Signal::ALL
        .into_iter()
        .filter(|s| s.is_match(text))
        .collect()
}

/// True when any detector fires
pub fn detect(text: &str) -> bool {
    Signal::ALL.into_iter().any(|s| s.is_match(text))
}

/// Whether a fragment holds something worth turning into a problem
pub(crate) fn contains_arithmetic(text: &str) -> bool {
    BARE_ARITHMETIC.is_match(text)
        || FRACTION_PRODUCT.is_match(text)
        || BRACKETED_FRACTION.is_match(text)
}

pub(crate) fn has_explanatory_cues(text: &str) -> bool {
    STEPS_CUE.is_match(text)
        || (FIRST_CUE.is_match(text) && SECOND_CUE.is_match(text))
        || MULTIPLY_TOGETHER_CUE.is_match(text)
        || NUMBERED_BOLD.find_iter(text).count() >= 2
}

pub(crate) fn has_assignment_cue(text: &str) -> bool {
    ASSIGNMENT_CUE.is_match(text)
}

/// Inner text of every emphasized span, in order
pub(crate) fn emphasized_spans(text: &str) -> Vec<&str> {
    EMPHASIS
        .captures_iter(text)
        .filter_map(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| m.as_str().trim())
        .collect()
}

/// Header bodies with the label and emphasis markers removed
pub(crate) fn header_bodies(text: &str) -> Vec<String> {
    PROBLEM_HEADER
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| strip_emphasis(m.as_str()).trim().to_string())
        .filter(|body| !body.is_empty())
        .collect()
}

pub(crate) fn strip_header_label(text: &str) -> &str {
    match HEADER_LABEL.find(text) {
        Some(m) => &text[m.end()..],
        None => text,
    }
}

pub(crate) fn strip_emphasis(text: &str) -> String {
    text.replace("**", "").replace("__", "")
}

/// Comparison key for dedup: no trailing `= ?`, collapsed whitespace, lowercase
pub(crate) fn dedup_key(text: &str) -> String {
    let trimmed = TRAILING_UNKNOWN.replace(text, "");
    WHITESPACE
        .replace_all(trimmed.trim(), " ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_signals() {
        assert_eq!(detect_signals("27 + 15"), vec![Signal::BareArithmetic]);
        assert!(detect_signals("What is 6 × 7?").contains(&Signal::WhatIs));
        assert!(detect_signals("2/3 × 4/5").contains(&Signal::FractionProduct));
        assert!(detect_signals(r"\frac{1}{2}").contains(&Signal::BracketedFraction));
        assert!(detect_signals("1.5 + 2").contains(&Signal::DecimalArithmetic));
        assert!(detect_signals("Problem 1: 3 + 4").contains(&Signal::ProblemHeader));
        assert!(detect_signals("a **bold** word").contains(&Signal::Emphasis));
    }

    #[test]
    fn test_plain_prose_is_not_detected() {
        assert!(!detect("Great job today! Let's keep practising tomorrow."));
        assert!(!detect("I have 3 apples and 4 pears."));
        assert!(!detect(""));
    }

    #[test]
    fn test_tight_dash_and_slash_are_prose() {
        assert!(!detect("Read pages 10-12 tonight."));
        assert!(!detect("Meet on 2024-05-01."));
        assert!(!detect("You scored 8/10 on the quiz."));
        assert!(!detect("Chapters 3-4, scored 9.5/10"));
        assert!(detect("10 - 12"));
        assert!(detect("8 / 2"));
        assert!(detect("9 −3"));
        assert!(detect("7+5"));
    }

    #[test]
    fn test_contains_arithmetic() {
        assert!(contains_arithmetic("What is 27 + 15?"));
        assert!(contains_arithmetic(r"\frac{2}{3} \times \frac{4}{5}"));
        assert!(!contains_arithmetic("Problem 1"));
        assert!(!contains_arithmetic("great work"));
    }

    #[test]
    fn test_explanatory_cues() {
        assert!(has_explanatory_cues("Here are the steps to follow."));
        assert!(!has_explanatory_cues("Step 1: add the numbers."));
        assert!(has_explanatory_cues("First add, second check."));
        assert!(!has_explanatory_cues("First add the numbers."));
        assert!(has_explanatory_cues("Multiply the numerators together."));
        assert!(has_explanatory_cues("1. **Top**\n2. **Bottom**\n"));
        assert!(!has_explanatory_cues("1. **Only one**\n"));
        assert!(!has_explanatory_cues("What is 27 + 15?"));
    }

    #[test]
    fn test_emphasized_spans() {
        assert_eq!(
            emphasized_spans("**What is 27 + 15?** and __9 - 4__"),
            vec!["What is 27 + 15?", "9 - 4"]
        );
    }

    #[test]
    fn test_header_bodies() {
        let text = "**Problem 1:** What is 3 + 4?\nQuestion 2. 8 ÷ 2 = ?\nproblem 3) write a story";
        assert_eq!(
            header_bodies(text),
            vec!["What is 3 + 4?", "8 ÷ 2 = ?", "write a story"]
        );
    }

    #[test]
    fn test_strip_header_label() {
        assert_eq!(strip_header_label("Problem 1: 3 + 4"), "3 + 4");
        assert_eq!(strip_header_label("Question #2. 5 - 1"), "5 - 1");
        assert_eq!(strip_header_label("3 + 4"), "3 + 4");
    }

    #[test]
    fn test_dedup_key() {
        assert_eq!(dedup_key("3 + 4 = ?"), "3 + 4");
        assert_eq!(dedup_key("What  is\n3 + 4?"), "what is 3 + 4?");
    }
}
