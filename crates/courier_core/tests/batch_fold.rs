use std::sync::Once;

use courier_core::{
    update, BatchMsg, BatchPhase, BatchState, EventKind, ItemStep, ProgressEvent,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(courier_logging::initialize_for_tests);
}

fn apply_all(msgs: Vec<BatchMsg>) -> (BatchState, Vec<ProgressEvent>) {
    let mut state = BatchState::new();
    let mut emitted = Vec::new();
    for msg in msgs {
        let (next, events) = update(state, msg);
        state = next;
        emitted.extend(events);
    }
    (state, emitted)
}

fn kinds(events: &[ProgressEvent]) -> Vec<EventKind> {
    events.iter().map(|e| e.kind).collect()
}

fn started() -> Vec<BatchMsg> {
    vec![BatchMsg::DiscoveryStarted {
        seed: "https://blog.example.com/".to_string(),
    }]
}

fn full_item(index: usize, title: &str) -> Vec<BatchMsg> {
    vec![
        BatchMsg::StepStarted {
            index,
            step: ItemStep::Extracting,
            title: None,
        },
        BatchMsg::StepStarted {
            index,
            step: ItemStep::Rendering,
            title: Some(title.to_string()),
        },
        BatchMsg::StepStarted {
            index,
            step: ItemStep::Delivering,
            title: Some(title.to_string()),
        },
        BatchMsg::ItemSucceeded {
            index,
            title: title.to_string(),
        },
    ]
}

#[test]
fn zero_links_is_terminal_error() {
    init_logging();
    let mut msgs = started();
    msgs.push(BatchMsg::LinksDiscovered { count: 0 });
    // Anything after the terminal event is ignored.
    msgs.push(BatchMsg::Finished);

    let (state, events) = apply_all(msgs);

    assert!(state.is_done());
    assert_eq!(kinds(&events), vec![EventKind::Discovering, EventKind::Error]);
    assert_eq!(events[1].message, "No blog posts found");
    assert!(state.into_result().aborted());
}

#[test]
fn discovery_failure_is_terminal_error_with_message() {
    init_logging();
    let mut msgs = started();
    msgs.push(BatchMsg::DiscoveryFailed {
        message: "timed out fetching https://blog.example.com/".to_string(),
    });

    let (state, events) = apply_all(msgs);

    assert!(state.is_done());
    assert_eq!(events.last().map(|e| e.kind), Some(EventKind::Error));
    assert!(events[1].message.contains("timed out"));
}

#[test]
fn failing_item_is_isolated_and_tally_adds_up() {
    init_logging();
    let mut msgs = started();
    msgs.push(BatchMsg::LinksDiscovered { count: 3 });
    msgs.extend(full_item(1, "One"));
    msgs.push(BatchMsg::StepStarted {
        index: 2,
        step: ItemStep::Extracting,
        title: None,
    });
    msgs.push(BatchMsg::ItemFailed {
        index: 2,
        message: "failed to fetch".to_string(),
    });
    msgs.extend(full_item(3, "Three"));
    msgs.push(BatchMsg::Finished);

    let (state, events) = apply_all(msgs);
    let result = state.into_result();

    assert_eq!(result.succeeded, 2);
    assert_eq!(result.failed, 1);
    assert_eq!(result.attempted(), 3);
    assert!(!result.aborted());
    assert_eq!(
        events
            .iter()
            .filter(|e| e.kind == EventKind::ItemFailed)
            .map(|e| e.index)
            .collect::<Vec<_>>(),
        vec![Some(2)]
    );
    let last = events.last().expect("final event");
    assert_eq!(last.kind, EventKind::BatchFinished);
    assert_eq!((last.succeeded, last.failed), (2, 1));
    assert_eq!(
        last.message,
        "Processing complete. Successfully sent 2 posts, 1 failed."
    );
    assert_eq!(result.events, events);
}

#[test]
fn item_events_carry_index_total_and_running_counters() {
    init_logging();
    let mut msgs = started();
    msgs.push(BatchMsg::LinksDiscovered { count: 2 });
    msgs.extend(full_item(1, "First"));
    msgs.push(BatchMsg::StepStarted {
        index: 2,
        step: ItemStep::Extracting,
        title: None,
    });

    let (state, events) = apply_all(msgs);

    assert_eq!(
        kinds(&events),
        vec![
            EventKind::Discovering,
            EventKind::Extracting,
            EventKind::Rendering,
            EventKind::Delivering,
            EventKind::ItemSucceeded,
            EventKind::Extracting,
        ]
    );
    let rendering = &events[2];
    assert_eq!(rendering.index, Some(1));
    assert_eq!(rendering.total, Some(2));
    assert_eq!(rendering.title.as_deref(), Some("First"));
    assert_eq!(rendering.message, "Generating PDF for: First...");
    let second = events.last().unwrap();
    assert_eq!((second.succeeded, second.failed), (1, 0));
    assert_eq!(
        state.phase(),
        BatchPhase::Processing {
            total: 2,
            cursor: 2,
            step: Some(ItemStep::Extracting)
        }
    );
}

#[test]
fn backward_and_out_of_order_messages_are_ignored() {
    init_logging();
    let mut msgs = started();
    msgs.push(BatchMsg::LinksDiscovered { count: 2 });
    msgs.push(BatchMsg::StepStarted {
        index: 1,
        step: ItemStep::Rendering,
        title: Some("T".to_string()),
    });
    let (state, _) = apply_all(msgs);
    let before = state.clone();

    // Going back to extracting for the same item.
    let (state, events) = update(
        state,
        BatchMsg::StepStarted {
            index: 1,
            step: ItemStep::Extracting,
            title: None,
        },
    );
    assert!(events.is_empty());
    assert_eq!(state, before);

    // Skipping ahead to item 2 before item 1 is settled.
    let (state, events) = update(
        state,
        BatchMsg::ItemSucceeded {
            index: 2,
            title: "T2".to_string(),
        },
    );
    assert!(events.is_empty());
    assert_eq!(state, before);
}

#[test]
fn early_finish_reports_partial_batch() {
    init_logging();
    let mut msgs = started();
    msgs.push(BatchMsg::LinksDiscovered { count: 3 });
    msgs.extend(full_item(1, "Only"));
    msgs.push(BatchMsg::Finished);

    let (state, events) = apply_all(msgs);

    assert!(state.is_done());
    let last = events.last().unwrap();
    assert_eq!(last.kind, EventKind::BatchFinished);
    assert!(last.message.starts_with("Processing stopped after 1 of 3 posts"));
}

#[test]
fn events_serialize_with_kebab_case_type_tag() {
    init_logging();
    let mut msgs = started();
    msgs.push(BatchMsg::LinksDiscovered { count: 1 });
    msgs.push(BatchMsg::StepStarted {
        index: 1,
        step: ItemStep::Extracting,
        title: None,
    });
    msgs.push(BatchMsg::ItemFailed {
        index: 1,
        message: "boom".to_string(),
    });
    let (_, events) = apply_all(msgs);

    let json = serde_json::to_value(events.last().unwrap()).unwrap();
    assert_eq!(json["type"], "item-failed");
    assert_eq!(json["index"], 1);
    assert_eq!(json["failed"], 1);
    assert!(json.get("title").is_none());

    let first = serde_json::to_value(&events[0]).unwrap();
    assert_eq!(first["type"], "discovering");
    assert!(first.get("index").is_none());
}
