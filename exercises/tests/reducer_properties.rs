//! Workspace reducer property tests over generated action streams.
//!
//! Tests verify:
//! - Item count equals items introduced by create/add, reset by clear
//! - `items[i].index == i` after every reduction
//! - Evaluate/mark never change the item count
//! - Generation round-trips (current → `content`, legacy → `problems`)
//! - End-to-end scenarios for mark, clear and snapshot bootstrap

use std::sync::Arc;

use exercises::workspace::WorkspaceEvent;
use exercises::{
    MarkObserver, SchemaGeneration, SkipReason, Workspace, WorkspaceReducer, WorkspaceSession,
};
use mockall::mock;
use serde_json::{json, Value};

mock! {
    pub Observer {}

    impl MarkObserver for Observer {
        fn on_mark_correct(&self, id: &str);
        fn on_mark_incorrect(&self, id: &str);
    }
}

/// Deterministic pseudo-random sequence so failures reproduce.
struct Lcg(u64);

impl Lcg {
    fn below(&mut self, n: u64) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) % n
    }
}

fn items(count: usize, tag: &str) -> Vec<Value> {
    (0..count)
        .map(|i| json!({ "text": format!("{} {} + {}", tag, i, i + 1) }))
        .collect()
}

fn create(current: bool, count: usize) -> Value {
    if current {
        json!({
            "action": "create_workspace",
            "workspace": { "subject": "math", "title": "Practice", "content": items(count, "c") }
        })
    } else {
        json!({
            "action": "create_workspace",
            "workspace": { "title": "Practice", "problems": items(count, "p") }
        })
    }
}

/// Random action plus the item count the model expects afterwards
fn random_action(rng: &mut Lcg, expected: Option<usize>) -> (Value, Option<usize>) {
    match rng.below(8) {
        0 => {
            let n = rng.below(4) as usize;
            (create(rng.below(2) == 0, n), Some(n))
        }
        1 | 2 => {
            let n = rng.below(3) as usize;
            let key = if rng.below(2) == 0 { "content" } else { "problems" };
            let action = if key == "content" { "add_content" } else { "add_problems" };
            let mut value = json!({ "action": action });
            value[key] = Value::Array(items(n, "a"));
            (value, expected.map(|len| len + n))
        }
        3 => (
            json!({ "action": "evaluate_content", "index": rng.below(6), "status": "good", "feedback": "ok" }),
            expected,
        ),
        4 => (json!({ "action": "mark_correct", "index": rng.below(6) }), expected),
        5 => (json!({ "action": "mark_incorrect", "problemIndex": rng.below(6) }), expected),
        6 => (json!({ "action": "clear_workspace" }), None),
        _ => (json!({ "action": "error", "message": "transient" }), expected),
    }
}

fn assert_indices(ws: &Workspace) {
    for (i, item) in ws.items().unwrap_or_default().iter().enumerate() {
        assert_eq!(item.index, i, "item {} has index {}", item.id, item.index);
    }
}

// ── Property: length follows create/add/clear ──────────────────────

#[test]
fn prop_item_count_tracks_structural_actions() {
    let reducer = WorkspaceReducer::new();
    for seed in 0..50 {
        let mut rng = Lcg(seed);
        let mut expected = None;
        let mut state = None;
        for _ in 0..30 {
            let (action, next) = random_action(&mut rng, expected);
            state = reducer.apply_values(&[action.clone()], state);
            expected = next;
            assert_eq!(
                state.as_ref().map(Workspace::item_count),
                expected,
                "seed={} after {}",
                seed,
                action
            );
            if let Some(ws) = &state {
                assert_indices(ws);
            }
        }
    }
}

// ── Property: batch reduction equals one-at-a-time reduction ─────────

#[test]
fn prop_batch_matches_sequential() {
    let reducer = WorkspaceReducer::new();
    for seed in 100..130 {
        let mut rng = Lcg(seed);
        let mut expected = None;
        let actions: Vec<Value> = (0..20)
            .map(|_| {
                let (action, next) = random_action(&mut rng, expected);
                expected = next;
                action
            })
            .collect();

        let batch = reducer.apply_values(&actions, None);
        let sequential = actions
            .iter()
            .fold(None, |state, action| reducer.apply_values(std::slice::from_ref(action), state));

        // Generated ids differ between runs; compare shape
        assert_eq!(
            batch.as_ref().map(Workspace::item_count),
            sequential.as_ref().map(Workspace::item_count),
            "seed={}",
            seed
        );
        assert_eq!(
            batch.as_ref().map(Workspace::generation),
            sequential.as_ref().map(Workspace::generation),
            "seed={}",
            seed
        );
    }
}

// ── Property: evaluate/mark never change length ──────────────────────

#[test]
fn prop_evaluations_preserve_length() {
    let reducer = WorkspaceReducer::new();
    let base = reducer.apply_values(&[create(true, 4)], None).unwrap();
    for index in 0..8u64 {
        for action in [
            json!({ "action": "evaluate_content", "index": index, "status": "excellent" }),
            json!({ "action": "mark_correct", "index": index }),
            json!({ "action": "mark_incorrect", "index": index }),
        ] {
            let ws = reducer.apply_values(&[action], Some(base.clone())).unwrap();
            assert_eq!(ws.item_count(), 4);
            assert_indices(&ws);
        }
    }
}

// ── Generation round-trip ─────────────────────────────────────────────

#[test]
fn test_generation_roundtrip() {
    let reducer = WorkspaceReducer::new();

    let current = reducer.apply_values(&[create(true, 2)], None).unwrap();
    assert_eq!(current.generation(), SchemaGeneration::Current);
    let wire = serde_json::to_value(&current).unwrap();
    assert_eq!(wire["content"].as_array().unwrap().len(), 2);
    assert!(wire.get("problems").is_none());

    let legacy = reducer.apply_values(&[create(false, 2)], None).unwrap();
    assert_eq!(legacy.generation(), SchemaGeneration::Legacy);
    let wire = serde_json::to_value(&legacy).unwrap();
    assert_eq!(wire["problems"].as_array().unwrap().len(), 2);
    assert!(wire.get("content").is_none());
    assert_eq!(wire["subject"], "math");
    assert_eq!(wire["workspaceType"], "math_problems");

    for ws in [current, legacy] {
        let restored: Workspace = serde_json::from_value(serde_json::to_value(&ws).unwrap()).unwrap();
        assert_eq!(restored, ws);
    }
}

// ── Scenarios ───────────────────────────────────────────────────────

#[test]
fn scenario_mark_correct_takes_action_stats() {
    let stats = json!({ "attempted": 1, "correct": 1, "total": 1 });
    let ws = WorkspaceReducer::new()
        .apply_values(
            &[
                json!({ "action": "create_workspace", "workspace": { "problems": [{ "id": "P0", "text": "6 × 7" }] } }),
                json!({ "action": "mark_correct", "index": 0, "stats": stats }),
            ],
            None,
        )
        .unwrap();
    let wire = serde_json::to_value(&ws).unwrap();
    assert_eq!(wire["problems"][0]["status"], "correct");
    assert_eq!(wire["stats"], stats);
}

#[test]
fn scenario_clear_always_ends_absent() {
    let reducer = WorkspaceReducer::new();
    for seed in 0..20 {
        let mut rng = Lcg(seed);
        let mut expected = None;
        let mut actions: Vec<Value> = (0..10)
            .map(|_| {
                let (action, next) = random_action(&mut rng, expected);
                expected = next;
                action
            })
            .collect();
        actions.push(json!({ "action": "clear_workspace" }));
        assert!(reducer.apply_values(&actions, None).is_none(), "seed={}", seed);
    }
}

#[test]
fn scenario_add_bootstraps_from_current_snapshot() {
    let snapshot = json!({
        "subject": "science",
        "title": "Planets",
        "content": [
            { "id": "s0", "text": "Name the largest planet", "status": "correct" },
            { "id": "s1", "text": "Name the smallest planet" }
        ]
    });
    let reduction = WorkspaceReducer::new().reduce_values(
        &[json!({
            "action": "add_content",
            "content": [{ "text": "Which planet has rings?" }],
            "currentWorkspace": snapshot
        })],
        None,
    );
    let ws = reduction.workspace.unwrap();
    assert_eq!(ws.generation(), SchemaGeneration::Current);
    assert_eq!(ws.item_count(), 3);
    assert_indices(&ws);
    assert_eq!(
        reduction.events,
        vec![
            WorkspaceEvent::Created {
                generation: SchemaGeneration::Current,
                item_count: 2
            },
            WorkspaceEvent::ItemsAdded {
                first_index: 2,
                count: 1
            },
        ]
    );
}

#[test]
fn test_add_with_nothing_to_bootstrap_is_dropped() {
    let reduction = WorkspaceReducer::new().reduce_values(
        &[json!({ "action": "add_content", "content": [{ "text": "1 + 1" }] })],
        None,
    );
    assert!(reduction.workspace.is_none());
    assert!(matches!(
        reduction.events.as_slice(),
        [WorkspaceEvent::ActionSkipped {
            reason: SkipReason::NoWorkspace,
            ..
        }]
    ));
}

#[test]
fn test_observer_through_session() {
    let mut observer = MockObserver::new();
    observer
        .expect_on_mark_incorrect()
        .withf(|id: &str| id == "q1")
        .times(1)
        .return_const(());
    observer.expect_on_mark_correct().never();

    let reducer = WorkspaceReducer::new().with_observer(Arc::new(observer));
    let mut session = WorkspaceSession::new(reducer);
    session.dispatch_values(&[
        json!({ "action": "create_workspace", "workspace": { "subject": "history", "content": [{ "id": "q1", "text": "When did Rome fall?" }] } }),
        json!({ "action": "mark_incorrect", "index": 0, "feedback": "Check the century" }),
    ]);
    let item = &session.current().unwrap().items().unwrap()[0];
    assert_eq!(item.feedback.as_deref(), Some("Check the century"));
}
