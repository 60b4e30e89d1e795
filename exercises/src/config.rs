//! Configuration for the extractor and reducer
//!
//! Loaded from TOML with serde defaults, then overridden from `EXERCISES_*`
//! environment variables.
//!
//! ```toml
//! [extractor]
//! max_assignment_items = 6
//! default_explanation_title = "Worked Example"
//! rules_path = "rules/math.yaml"
//!
//! [reducer]
//! item_id_prefix = "problem"
//! log_skipped_actions = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ExercisesError, ExercisesResult};

/// Env var naming a TOML config file
pub const CONFIG_PATH_ENV: &str = "EXERCISES_CONFIG";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExercisesConfig {
    pub extractor: ExtractorConfig,
    pub reducer: ReducerConfig,
}

/// Content extractor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Cap on objectives and on questions in a synthesized assignment
    pub max_assignment_items: usize,
    /// Explanation title used when no keyword matches
    pub default_explanation_title: String,
    /// Optional YAML rule table replacing the built-in classification rules
    pub rules_path: Option<PathBuf>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_assignment_items: 8,
            default_explanation_title: "Math Explanation".to_string(),
            rules_path: None,
        }
    }
}

/// Workspace reducer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReducerConfig {
    /// Prefix for ids generated for items that arrive without one
    pub item_id_prefix: String,
    /// Log skipped actions at debug level
    pub log_skipped_actions: bool,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            item_id_prefix: "item".to_string(),
            log_skipped_actions: true,
        }
    }
}

impl ExercisesConfig {
    /// Parse a TOML document
    pub fn from_toml_str(raw: &str) -> ExercisesResult<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Load a TOML config file
    pub fn from_file(path: &Path) -> ExercisesResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| ExercisesError::io(path, e))?;
        Self::from_toml_str(&raw)
    }

    /// Defaults, or the file named by `EXERCISES_CONFIG`, with env overrides applied
    pub fn from_env() -> ExercisesResult<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Override individual fields from `EXERCISES_*` variables
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply `EXERCISES_*` overrides read through `lookup`; unparsable numbers are ignored
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(max) = lookup("EXERCISES_MAX_ASSIGNMENT_ITEMS") {
            if let Ok(n) = max.trim().parse() {
                self.extractor.max_assignment_items = n;
            }
        }
        if let Some(title) = lookup("EXERCISES_EXPLANATION_TITLE") {
            self.extractor.default_explanation_title = title;
        }
        if let Some(path) = lookup("EXERCISES_RULES_PATH") {
            self.extractor.rules_path = Some(PathBuf::from(path));
        }
        if let Some(prefix) = lookup("EXERCISES_ITEM_ID_PREFIX") {
            self.reducer.item_id_prefix = prefix;
        }
        if let Some(val) = lookup("EXERCISES_LOG_SKIPPED_ACTIONS") {
            self.reducer.log_skipped_actions = val.eq_ignore_ascii_case("true") || val == "1";
        }
    }
}
