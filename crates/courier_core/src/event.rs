use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    Discovering,
    Extracting,
    Rendering,
    Delivering,
    ItemSucceeded,
    ItemFailed,
    BatchFinished,
    /// Terminal batch-level failure (nothing discovered, seed unreachable).
    Error,
}

impl EventKind {
    pub fn is_terminal(self) -> bool {
        matches!(self, EventKind::BatchFinished | EventKind::Error)
    }
}

/// One append-only record of a batch state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub message: String,
    pub succeeded: usize,
    pub failed: usize,
}

impl ProgressEvent {
    pub(crate) fn new(kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            index: None,
            total: None,
            title: None,
            message: message.into(),
            succeeded: 0,
            failed: 0,
        }
    }

    pub(crate) fn item(mut self, index: usize, total: usize) -> Self {
        self.index = Some(index);
        self.total = Some(total);
        self
    }

    pub(crate) fn titled(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    pub(crate) fn counters(mut self, succeeded: usize, failed: usize) -> Self {
        self.succeeded = succeeded;
        self.failed = failed;
        self
    }
}
