//! Sequential action application
//!
//! The reducer folds an ordered batch of [`Action`]s over an optional prior
//! [`Workspace`]. Each action sees only the state left by the one before it.
//! An action that cannot apply leaves state untouched and is recorded as
//! [`WorkspaceEvent::ActionSkipped`]; the rest of the batch continues.
//!
//! ```text
//!   Absent ──create_workspace──▶ Active
//!   Absent ──add + seed/snapshot──▶ Active
//!   Active ──add / evaluate / mark──▶ Active
//!   Active ──clear_workspace──▶ Absent
//! ```

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::actions::{Action, AddItems, EvaluateContent, MarkItem};
use super::events::{MarkObserver, WorkspaceEvent};
use super::seed::{items_from_seeds, ItemSeed};
use super::types::{ContentItem, ItemStatus, Workspace, WorkspaceStats};
use crate::config::ReducerConfig;
use crate::error::SkipReason;

/// Result of reducing one batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reduction {
    pub workspace: Option<Workspace>,
    pub events: Vec<WorkspaceEvent>,
}

impl Reduction {
    /// Skip events only
    pub fn skipped(&self) -> impl Iterator<Item = &WorkspaceEvent> {
        self.events.iter().filter(|e| e.is_skip())
    }
}

/// Applies agent actions to a workspace
#[derive(Clone, Default)]
pub struct WorkspaceReducer {
    config: ReducerConfig,
    observer: Option<Arc<dyn MarkObserver>>,
}

impl std::fmt::Debug for WorkspaceReducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceReducer")
            .field("config", &self.config)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl WorkspaceReducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ReducerConfig) -> Self {
        Self {
            config,
            observer: None,
        }
    }

    /// Notify `observer` of every successful mark action
    pub fn with_observer(mut self, observer: Arc<dyn MarkObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &ReducerConfig {
        &self.config
    }

    /// Reduce and keep only the resulting workspace
    pub fn apply(&self, actions: &[Action], prior: Option<Workspace>) -> Option<Workspace> {
        self.reduce(actions, prior).workspace
    }

    /// Reduce a raw JSON batch and keep only the resulting workspace
    pub fn apply_values(&self, actions: &[Value], prior: Option<Workspace>) -> Option<Workspace> {
        self.reduce_values(actions, prior).workspace
    }

    pub fn reduce(&self, actions: &[Action], prior: Option<Workspace>) -> Reduction {
        let mut state = prior;
        let mut events = Vec::new();
        for action in actions {
            self.step(&mut state, action.tag(), action, &mut events);
        }
        finish(state, events)
    }

    /// Decode and reduce a raw JSON batch; undecodable entries become skips
    pub fn reduce_values(&self, actions: &[Value], prior: Option<Workspace>) -> Reduction {
        let mut state = prior;
        let mut events = Vec::new();
        for value in actions {
            let tag = value
                .get("action")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            match Action::from_value(value.clone()) {
                Ok(action) => self.step(&mut state, tag, &action, &mut events),
                Err(reason) => self.record_skip(tag, reason, &mut events),
            }
        }
        finish(state, events)
    }

    fn step(
        &self,
        state: &mut Option<Workspace>,
        tag: &str,
        action: &Action,
        events: &mut Vec<WorkspaceEvent>,
    ) {
        if let Err(reason) = self.apply_one(state, action, events) {
            self.record_skip(tag, reason, events);
        }
    }

    /// Apply one action. On `Err` the state has not been touched.
    fn apply_one(
        &self,
        state: &mut Option<Workspace>,
        action: &Action,
        events: &mut Vec<WorkspaceEvent>,
    ) -> Result<(), SkipReason> {
        match action {
            Action::CreateWorkspace(create) => {
                let payload = create
                    .workspace
                    .as_ref()
                    .ok_or_else(|| SkipReason::missing("workspace"))?;
                let ws = Workspace::from_payload(payload, create.stats.clone(), &self.config)?;
                info!(
                    generation = ?ws.generation(),
                    items = ws.item_count(),
                    replaced = state.is_some(),
                    "Workspace created"
                );
                events.push(created_event(&ws));
                *state = Some(ws);
                Ok(())
            }
            Action::AddContent(add) | Action::AddProblems(add) => self.add_items(state, add, events),
            Action::EvaluateContent(eval) => self.evaluate(state, eval, events),
            Action::MarkCorrect(mark) => self.mark(state, mark, true, events),
            Action::MarkIncorrect(mark) => self.mark(state, mark, false, events),
            Action::ClearWorkspace => {
                if state.take().is_some() {
                    info!("Workspace cleared");
                }
                events.push(WorkspaceEvent::Cleared);
                Ok(())
            }
            Action::Error(error) => {
                let message = error
                    .text()
                    .unwrap_or("unspecified agent error")
                    .to_string();
                warn!(message = %message, "Agent reported an error");
                events.push(WorkspaceEvent::AgentError { message });
                Ok(())
            }
            Action::Unknown => Err(SkipReason::UnknownAction),
        }
    }

    fn add_items(
        &self,
        state: &mut Option<Workspace>,
        add: &AddItems,
        events: &mut Vec<WorkspaceEvent>,
    ) -> Result<(), SkipReason> {
        if let Some(ws) = state.as_mut() {
            if add.workspace.is_some() {
                debug!("Ignoring workspace seed on add; a workspace is already live");
            }
            return self.append(ws, add.take_items()?, add.stats.clone(), events);
        }

        if let Some(seed) = &add.workspace {
            let ws = Workspace::from_payload(seed, add.stats.clone(), &self.config)?;
            info!(
                generation = ?ws.generation(),
                items = ws.item_count(),
                "Adopted workspace seed from add action"
            );
            events.push(created_event(&ws));
            *state = Some(ws);
            return Ok(());
        }

        let snapshot = add
            .current_workspace
            .as_ref()
            .ok_or(SkipReason::NoWorkspace)?;
        let seeds = add.take_items()?;
        let mut ws = Workspace::restore(snapshot, &self.config)?;
        if ws.items().is_none() {
            return Err(SkipReason::NoItemsField);
        }
        info!(
            generation = ?ws.generation(),
            items = ws.item_count(),
            "Restored workspace from snapshot"
        );
        events.push(created_event(&ws));
        self.append(&mut ws, seeds, add.stats.clone(), events)?;
        *state = Some(ws);
        Ok(())
    }

    fn append(
        &self,
        ws: &mut Workspace,
        seeds: Vec<ItemSeed>,
        stats: Option<WorkspaceStats>,
        events: &mut Vec<WorkspaceEvent>,
    ) -> Result<(), SkipReason> {
        let items = ws.items_mut().ok_or(SkipReason::NoItemsField)?;
        let first_index = items.len();
        let count = seeds.len();
        items.extend(items_from_seeds(seeds, first_index, &self.config));
        let len = items.len();

        match stats {
            Some(stats) => {
                if stats.total() != Some(len as u64) {
                    warn!(
                        reported = ?stats.get("total"),
                        items = len,
                        "Agent stats total does not match item count"
                    );
                }
                ws.set_stats(stats);
            }
            None => {
                if let Some(current) = ws.stats_mut() {
                    current.set_total(len);
                }
            }
        }

        debug!(first_index, count, "Items appended");
        events.push(WorkspaceEvent::ItemsAdded { first_index, count });
        Ok(())
    }

    fn evaluate(
        &self,
        state: &mut Option<Workspace>,
        eval: &EvaluateContent,
        events: &mut Vec<WorkspaceEvent>,
    ) -> Result<(), SkipReason> {
        let ws = state.as_mut().ok_or(SkipReason::NoWorkspace)?;
        let index = eval.index.get().ok_or_else(|| SkipReason::missing("index"))?;
        if !eval.has_updates() {
            return Err(SkipReason::missing("status"));
        }
        let status = match eval.status.as_deref() {
            Some(raw) => Some(ItemStatus::parse(raw).ok_or_else(|| SkipReason::Malformed {
                detail: format!("unknown status '{raw}'"),
            })?),
            None => None,
        };

        let item = item_at(ws, index)?;
        if let Some(status) = status {
            item.status = status;
        }
        let status = item.status;
        if eval.feedback.is_some() {
            item.feedback = eval.feedback.clone();
        }
        if eval.evaluation_criteria.is_some() {
            item.evaluation_criteria = eval.evaluation_criteria.clone();
        }
        if eval.rubric_scores.is_some() {
            item.rubric_scores = eval.rubric_scores.clone();
        }
        if eval.evidence_quality.is_some() {
            item.evidence_quality = eval.evidence_quality.clone();
        }
        let id = item.id.clone();

        if let Some(stats) = &eval.stats {
            ws.set_stats(stats.clone());
        }
        debug!(index, id = %id, %status, "Item evaluated");
        events.push(WorkspaceEvent::ItemEvaluated { index, id, status });
        Ok(())
    }

    fn mark(
        &self,
        state: &mut Option<Workspace>,
        mark: &MarkItem,
        correct: bool,
        events: &mut Vec<WorkspaceEvent>,
    ) -> Result<(), SkipReason> {
        let ws = state.as_mut().ok_or(SkipReason::NoWorkspace)?;
        let index = mark.index.get().ok_or_else(|| SkipReason::missing("index"))?;

        let item = item_at(ws, index)?;
        item.status = if correct {
            ItemStatus::Correct
        } else {
            ItemStatus::Incorrect
        };
        if mark.feedback.is_some() {
            item.feedback = mark.feedback.clone();
        }
        let id = item.id.clone();

        if let Some(stats) = &mark.stats {
            ws.set_stats(stats.clone());
        }
        debug!(index, id = %id, correct, "Item marked");

        if let Some(observer) = &self.observer {
            if correct {
                observer.on_mark_correct(&id);
            } else {
                observer.on_mark_incorrect(&id);
            }
        }
        events.push(if correct {
            WorkspaceEvent::MarkedCorrect { index, id }
        } else {
            WorkspaceEvent::MarkedIncorrect { index, id }
        });
        Ok(())
    }

    fn record_skip(&self, action: &str, reason: SkipReason, events: &mut Vec<WorkspaceEvent>) {
        if self.config.log_skipped_actions {
            debug!(action, %reason, "Skipping workspace action");
        }
        events.push(WorkspaceEvent::ActionSkipped {
            action: action.to_string(),
            reason,
        });
    }
}

fn item_at(ws: &mut Workspace, index: usize) -> Result<&mut ContentItem, SkipReason> {
    let items = ws.items_mut().ok_or(SkipReason::NoItemsField)?;
    let len = items.len();
    items
        .get_mut(index)
        .ok_or(SkipReason::IndexOutOfRange { index, len })
}

fn created_event(ws: &Workspace) -> WorkspaceEvent {
    WorkspaceEvent::Created {
        generation: ws.generation(),
        item_count: ws.item_count(),
    }
}

fn finish(mut state: Option<Workspace>, events: Vec<WorkspaceEvent>) -> Reduction {
    if let Some(ws) = state.as_mut() {
        ws.reindex();
    }
    Reduction {
        workspace: state,
        events,
    }
}
