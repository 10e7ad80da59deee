use serde::Serialize;

use crate::{EventKind, ProgressEvent};

/// Per-item pipeline steps, in the only order they may occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ItemStep {
    Extracting,
    Rendering,
    Delivering,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchPhase {
    #[default]
    Start,
    Discovering,
    Processing {
        total: usize,
        /// 1-based index of the item currently in flight.
        cursor: usize,
        step: Option<ItemStep>,
    },
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchMsg {
    /// Discovery fetch is about to start.
    DiscoveryStarted { seed: String },
    /// The seed page could not be fetched or parsed.
    DiscoveryFailed { message: String },
    /// Discovery finished with `count` candidate links.
    LinksDiscovered { count: usize },
    /// Item `index` entered `step`; `title` is known once extraction succeeded.
    StepStarted {
        index: usize,
        step: ItemStep,
        title: Option<String>,
    },
    ItemSucceeded { index: usize, title: String },
    ItemFailed { index: usize, message: String },
    /// No further items will be attempted.
    Finished,
}

/// Accumulated batch state: phase, running counters and the event log.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchState {
    phase: BatchPhase,
    succeeded: usize,
    failed: usize,
    events: Vec<ProgressEvent>,
}

impl BatchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> BatchPhase {
        self.phase
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn events(&self) -> &[ProgressEvent] {
        &self.events
    }

    pub fn is_done(&self) -> bool {
        self.phase == BatchPhase::Done
    }

    pub fn into_result(self) -> BatchResult {
        BatchResult {
            succeeded: self.succeeded,
            failed: self.failed,
            events: self.events,
        }
    }

    fn record(&mut self, event: ProgressEvent) -> Vec<ProgressEvent> {
        self.events.push(event.clone());
        vec![event]
    }
}

/// Final tally of a batch plus its ordered event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub succeeded: usize,
    pub failed: usize,
    pub events: Vec<ProgressEvent>,
}

impl BatchResult {
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }

    /// True when the batch stopped on a batch-level error rather than a tally.
    pub fn aborted(&self) -> bool {
        self.events
            .last()
            .is_some_and(|event| event.kind == EventKind::Error)
    }
}

/// Pure update function: applies one message to the batch and returns the
/// events it produced. Messages that would move the batch backwards, skip an
/// item or arrive after completion are ignored and produce no events.
pub fn update(mut state: BatchState, msg: BatchMsg) -> (BatchState, Vec<ProgressEvent>) {
    let events = match (state.phase, msg) {
        (BatchPhase::Start, BatchMsg::DiscoveryStarted { seed }) => {
            state.phase = BatchPhase::Discovering;
            state.record(ProgressEvent::new(
                EventKind::Discovering,
                format!("Discovering blog posts on {seed}..."),
            ))
        }
        (BatchPhase::Discovering, BatchMsg::DiscoveryFailed { message }) => {
            state.phase = BatchPhase::Done;
            state.record(ProgressEvent::new(EventKind::Error, message))
        }
        (BatchPhase::Discovering, BatchMsg::LinksDiscovered { count: 0 }) => {
            state.phase = BatchPhase::Done;
            state.record(ProgressEvent::new(EventKind::Error, "No blog posts found"))
        }
        (BatchPhase::Discovering, BatchMsg::LinksDiscovered { count }) => {
            state.phase = BatchPhase::Processing {
                total: count,
                cursor: 1,
                step: None,
            };
            Vec::new()
        }
        (
            BatchPhase::Processing {
                total,
                cursor,
                step: current,
            },
            BatchMsg::StepStarted { index, step, title },
        ) if index == cursor && cursor <= total && current.map_or(true, |c| c < step) => {
            state.phase = BatchPhase::Processing {
                total,
                cursor,
                step: Some(step),
            };
            let (kind, message) = match (step, title.as_deref()) {
                (ItemStep::Extracting, _) => (
                    EventKind::Extracting,
                    format!("Extracting content from post {index}/{total}..."),
                ),
                (ItemStep::Rendering, Some(t)) => {
                    (EventKind::Rendering, format!("Generating PDF for: {t}..."))
                }
                (ItemStep::Rendering, None) => (
                    EventKind::Rendering,
                    format!("Generating PDF for post {index}/{total}..."),
                ),
                (ItemStep::Delivering, Some(t)) => {
                    (EventKind::Delivering, format!("Sending to Kindle: {t}..."))
                }
                (ItemStep::Delivering, None) => (
                    EventKind::Delivering,
                    format!("Sending post {index}/{total} to Kindle..."),
                ),
            };
            let event = ProgressEvent::new(kind, message)
                .item(index, total)
                .titled(title)
                .counters(state.succeeded, state.failed);
            state.record(event)
        }
        (BatchPhase::Processing { total, cursor, .. }, BatchMsg::ItemSucceeded { index, title })
            if index == cursor && cursor <= total =>
        {
            state.succeeded += 1;
            state.phase = BatchPhase::Processing {
                total,
                cursor: cursor + 1,
                step: None,
            };
            let event = ProgressEvent::new(
                EventKind::ItemSucceeded,
                format!("Successfully processed: {title}"),
            )
            .item(index, total)
            .titled(Some(title))
            .counters(state.succeeded, state.failed);
            state.record(event)
        }
        (BatchPhase::Processing { total, cursor, .. }, BatchMsg::ItemFailed { index, message })
            if index == cursor && cursor <= total =>
        {
            state.failed += 1;
            state.phase = BatchPhase::Processing {
                total,
                cursor: cursor + 1,
                step: None,
            };
            let event = ProgressEvent::new(
                EventKind::ItemFailed,
                format!("Failed to process post: {message}"),
            )
            .item(index, total)
            .counters(state.succeeded, state.failed);
            state.record(event)
        }
        (BatchPhase::Processing { total, cursor, .. }, BatchMsg::Finished) => {
            state.phase = BatchPhase::Done;
            let attempted = cursor - 1;
            let message = if attempted < total {
                format!(
                    "Processing stopped after {attempted} of {total} posts. Successfully sent {} posts, {} failed.",
                    state.succeeded, state.failed
                )
            } else {
                format!(
                    "Processing complete. Successfully sent {} posts, {} failed.",
                    state.succeeded, state.failed
                )
            };
            let event = ProgressEvent::new(EventKind::BatchFinished, message)
                .counters(state.succeeded, state.failed);
            state.record(event)
        }
        _ => Vec::new(),
    };

    (state, events)
}
