//! Problem classification rules
//!
//! An ordered table of `pattern → kind → hint` rules. The first rule whose
//! pattern matches decides the kind, so precedence is the table order:
//! addition, subtraction, fraction multiplication, multiplication, division,
//! bare fraction, decimal, then the `arithmetic` fallback.
//!
//! Tables can be replaced from YAML:
//!
//! ```yaml
//! rules:
//!   - kind: addition
//!     pattern: '\d\s*\+\s*\d'
//!     hint: Add the ones first, then the tens.
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

use crate::error::{ExercisesError, ExercisesResult};

/// Operator family of an extracted problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemKind {
    Addition,
    Subtraction,
    /// `a/b × c/d`, including `\frac{a}{b} \times \frac{c}{d}`
    FractionMultiplication,
    Multiplication,
    Division,
    /// A lone fraction such as `3/4` or `\frac{3}{4}`
    Fraction,
    Decimal,
    /// Nothing more specific matched
    Arithmetic,
}

impl ProblemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Addition => "addition",
            Self::Subtraction => "subtraction",
            Self::FractionMultiplication => "fraction_multiplication",
            Self::Multiplication => "multiplication",
            Self::Division => "division",
            Self::Fraction => "fraction",
            Self::Decimal => "decimal",
            Self::Arithmetic => "arithmetic",
        }
    }

    /// Canned hint for this operator family
    pub fn default_hint(&self) -> &'static str {
        match self {
            Self::Addition => {
                "Line up the place values and add from right to left, carrying when a column reaches ten."
            }
            Self::Subtraction => {
                "Line up the place values and subtract from right to left, borrowing from the next column when you need to."
            }
            Self::FractionMultiplication => {
                "Multiply the numerators together, then multiply the denominators together, and simplify if you can."
            }
            Self::Multiplication => {
                "Break one factor into tens and ones, multiply each part, then add the partial products."
            }
            Self::Division => {
                "Ask how many times the divisor fits into the dividend, then check by multiplying back."
            }
            Self::Fraction => {
                "The bottom number says how many equal parts make a whole; the top number says how many parts you have."
            }
            Self::Decimal => {
                "Line up the decimal points before you calculate, then place the point in your answer."
            }
            Self::Arithmetic => {
                "Work through the operations one step at a time, following the order of operations."
            }
        }
    }
}

impl std::fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Serializable form of a rule, as written in YAML tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub kind: ProblemKind,
    pub pattern: String,
    /// Falls back to the kind's canned hint when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl RuleSpec {
    fn new(kind: ProblemKind, pattern: String) -> Self {
        Self {
            kind,
            pattern,
            hint: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RuleTableFile {
    rules: Vec<RuleSpec>,
}

/// A compiled rule
#[derive(Debug, Clone)]
pub struct ClassificationRule {
    pub kind: ProblemKind,
    pub pattern: Regex,
    pub hint: String,
}

/// Ordered, first-match-wins rule table
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<ClassificationRule>,
}

const MUL_OP: &str = r"(?:×|\*|·|\\times|\\cdot)";
const FRACTION: &str = r"(?:\\frac\{\s*\d+\s*\}\{\s*\d+\s*\}|\(?\s*\d+\s*/\s*\d+\s*\)?)";

/// Built-in rule specs in precedence order
pub fn builtin_specs() -> Vec<RuleSpec> {
    vec![
        RuleSpec::new(
            ProblemKind::Addition,
            r"(?i)\d\s*\+\s*\d|\d\s+plus\s+\d".to_string(),
        ),
        RuleSpec::new(
            ProblemKind::Subtraction,
            r"(?i)\d\s*[\-−]\s*\d|\d\s+minus\s+\d".to_string(),
        ),
        RuleSpec::new(
            ProblemKind::FractionMultiplication,
            format!(r"{FRACTION}\s*(?:{MUL_OP}|[xX])\s*{FRACTION}"),
        ),
        RuleSpec::new(
            ProblemKind::Multiplication,
            format!(r"(?i)\d\s*(?:{MUL_OP}|x)\s*\d|\d\s+times\s+\d|\}}\s*{MUL_OP}"),
        ),
        RuleSpec::new(
            ProblemKind::Division,
            r"(?i)\d\s*(?:÷|\\div)\s*\d|\d\s+/\s+\d|\d\s+divided\s+by\s+\d".to_string(),
        ),
        RuleSpec::new(ProblemKind::Fraction, r"\d+/\d+|\\frac\{".to_string()),
        RuleSpec::new(ProblemKind::Decimal, r"\d+\.\d+".to_string()),
    ]
}

static BUILTIN: LazyLock<RuleTable> =
    LazyLock::new(|| RuleTable::from_specs(builtin_specs()).unwrap());

impl Default for RuleTable {
    fn default() -> Self {
        BUILTIN.clone()
    }
}

impl RuleTable {
    /// Compile specs in order
    pub fn from_specs(specs: Vec<RuleSpec>) -> ExercisesResult<Self> {
        if specs.is_empty() {
            return Err(ExercisesError::EmptyRuleTable);
        }
        let rules = specs
            .into_iter()
            .map(|spec| {
                let pattern =
                    Regex::new(&spec.pattern).map_err(|source| ExercisesError::InvalidPattern {
                        kind: spec.kind.to_string(),
                        source,
                    })?;
                Ok(ClassificationRule {
                    kind: spec.kind,
                    pattern,
                    hint: spec
                        .hint
                        .unwrap_or_else(|| spec.kind.default_hint().to_string()),
                })
            })
            .collect::<ExercisesResult<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Load a table from a YAML string
    pub fn load_yaml(yaml: &str) -> ExercisesResult<Self> {
        let file: RuleTableFile = serde_yaml::from_str(yaml)?;
        Self::from_specs(file.rules)
    }

    /// Load a table from a YAML file
    pub fn load_yaml_file(path: &Path) -> ExercisesResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| ExercisesError::io(path, e))?;
        Self::load_yaml(&raw)
    }

    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }

    /// First matching rule, if any
    pub fn matching_rule(&self, text: &str) -> Option<&ClassificationRule> {
        self.rules.iter().find(|r| r.pattern.is_match(text))
    }

    /// Kind of the first matching rule, `Arithmetic` when none match
    pub fn classify(&self, text: &str) -> ProblemKind {
        self.matching_rule(text)
            .map(|r| r.kind)
            .unwrap_or(ProblemKind::Arithmetic)
    }

    /// Hint for a kind: the first rule of that kind, else the canned hint
    pub fn hint_for(&self, kind: ProblemKind) -> &str {
        self.rules
            .iter()
            .find(|r| r.kind == kind)
            .map(|r| r.hint.as_str())
            .unwrap_or_else(|| kind.default_hint())
    }

    /// Classify and look up the hint in one pass
    pub fn classify_with_hint(&self, text: &str) -> (ProblemKind, String) {
        match self.matching_rule(text) {
            Some(rule) => (rule.kind, rule.hint.clone()),
            None => (
                ProblemKind::Arithmetic,
                self.hint_for(ProblemKind::Arithmetic).to_string(),
            ),
        }
    }
}
