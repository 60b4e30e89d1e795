//! Side-channel output of a reduction

use serde::{Deserialize, Serialize};

use super::types::{ItemStatus, SchemaGeneration};
use crate::error::SkipReason;

/// What one action did, in arrival order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkspaceEvent {
    /// A workspace was created, or adopted/restored while none was live
    Created {
        generation: SchemaGeneration,
        item_count: usize,
    },
    ItemsAdded {
        first_index: usize,
        count: usize,
    },
    ItemEvaluated {
        index: usize,
        id: String,
        status: ItemStatus,
    },
    MarkedCorrect {
        index: usize,
        id: String,
    },
    MarkedIncorrect {
        index: usize,
        id: String,
    },
    Cleared,
    AgentError {
        message: String,
    },
    ActionSkipped {
        action: String,
        reason: SkipReason,
    },
}

impl WorkspaceEvent {
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::ActionSkipped { .. })
    }
}

/// Receives successful mark actions as they are applied
#[cfg_attr(test, mockall::automock)]
pub trait MarkObserver: Send + Sync {
    fn on_mark_correct(&self, id: &str);

    fn on_mark_incorrect(&self, id: &str);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_wire_shape() {
        let event = WorkspaceEvent::ActionSkipped {
            action: "mark_correct".to_string(),
            reason: SkipReason::IndexOutOfRange { index: 4, len: 2 },
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "type": "action_skipped",
                "action": "mark_correct",
                "reason": { "reason": "index_out_of_range", "index": 4, "len": 2 }
            })
        );
        assert!(event.is_skip());
        assert!(!WorkspaceEvent::Cleared.is_skip());
    }
}
