//! Replay harness for the exercises core
//!
//! Runs the extractor over a saved agent message, or replays a saved action
//! log against an optional prior workspace, and prints the JSON the UI would
//! receive.
//!
//! # Usage
//!
//! ```bash
//! # Extract exercises from a message
//! exercise-replay extract message.txt --lesson lesson.json
//!
//! # Replay actions, starting from a stored workspace, with the event list
//! exercise-replay reduce actions.json --prior workspace.json --events
//!
//! # Custom configuration
//! EXERCISES_ITEM_ID_PREFIX=problem exercise-replay --config exercises.toml reduce actions.json
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use exercises::{
    ContentExtractor, ExercisesConfig, LessonContext, Workspace, WorkspaceReducer,
};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::info;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML config file (overrides EXERCISES_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract structured exercises from an agent message
    Extract {
        /// File holding the raw message text
        message: PathBuf,

        /// Lesson context JSON enabling the assignment fallback
        #[arg(long)]
        lesson: Option<PathBuf>,
    },
    /// Replay an action log into a workspace
    Reduce {
        /// JSON array of actions (a single action object is also accepted)
        actions: PathBuf,

        /// Workspace JSON to start from
        #[arg(long)]
        prior: Option<PathBuf>,

        /// Print the event list alongside the workspace
        #[arg(long, default_value_t = false)]
        events: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("exercises=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(args.config.as_deref())?;

    let output = match args.command {
        Command::Extract { message, lesson } => {
            run_extract(&config, &message, lesson.as_deref())?
        }
        Command::Reduce {
            actions,
            prior,
            events,
        } => run_reduce(&config, &actions, prior.as_deref(), events)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Explicit file wins, then `EXERCISES_CONFIG`, then defaults; env overrides apply last
fn load_config(path: Option<&Path>) -> Result<ExercisesConfig> {
    let config = match path {
        Some(path) => {
            let mut config = ExercisesConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            config.apply_env();
            config
        }
        None => ExercisesConfig::from_env().context("Failed to load config from environment")?,
    };
    Ok(config)
}

fn read_json(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn run_extract(config: &ExercisesConfig, message: &Path, lesson: Option<&Path>) -> Result<Value> {
    let extractor = ContentExtractor::with_config(config.extractor.clone())
        .context("Failed to build extractor")?;
    let text = std::fs::read_to_string(message)
        .with_context(|| format!("Failed to read {}", message.display()))?;
    let lesson: Option<LessonContext> = match lesson {
        Some(path) => Some(
            serde_json::from_value(read_json(path)?)
                .with_context(|| format!("Invalid lesson context in {}", path.display()))?,
        ),
        None => None,
    };

    let doc = extractor.extract(&text, lesson.as_ref());
    info!(
        found = doc.is_some(),
        doc_type = doc.as_ref().map(|d| d.doc_type()).unwrap_or("none"),
        "Extraction finished"
    );
    Ok(serde_json::to_value(doc)?)
}

fn run_reduce(
    config: &ExercisesConfig,
    actions: &Path,
    prior: Option<&Path>,
    with_events: bool,
) -> Result<Value> {
    let actions = match read_json(actions)? {
        Value::Array(actions) => actions,
        action @ Value::Object(_) => vec![action],
        other => bail!("Expected an action array, got {}", other),
    };
    let prior: Option<Workspace> = match prior {
        Some(path) => serde_json::from_value(read_json(path)?)
            .with_context(|| format!("Invalid workspace in {}", path.display()))?,
        None => None,
    };

    let reducer = WorkspaceReducer::with_config(config.reducer.clone());
    let reduction = reducer.reduce_values(&actions, prior);
    info!(
        actions = actions.len(),
        skipped = reduction.skipped().count(),
        live = reduction.workspace.is_some(),
        "Replay finished"
    );

    if with_events {
        Ok(json!({
            "workspace": reduction.workspace,
            "events": reduction.events,
        }))
    } else {
        Ok(serde_json::to_value(reduction.workspace)?)
    }
}
