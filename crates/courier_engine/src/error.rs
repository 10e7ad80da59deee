use thiserror::Error;

use crate::{FailureKind, FetchError};

/// Failures of the article pipeline. Inside a batch every variant is turned
/// into an `item-failed` event; outside a batch they reach the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("timed out fetching {url}")]
    FetchTimeout { url: String },
    #[error("failed to fetch {url}: {kind}")]
    Fetch { url: String, kind: FailureKind },
    #[error("failed to extract content from {url}: {message}")]
    Extract { url: String, message: String },
    #[error("failed to generate PDF: {0}")]
    Render(String),
    #[error("failed to send email to {destination}: {message}")]
    Delivery {
        destination: String,
        message: String,
    },
    #[error("mail relay is not configured: {0}")]
    Config(String),
}

impl PipelineError {
    pub(crate) fn from_fetch(url: &str, err: FetchError) -> Self {
        match err.kind {
            FailureKind::Timeout => PipelineError::FetchTimeout {
                url: url.to_string(),
            },
            kind => PipelineError::Fetch {
                url: url.to_string(),
                kind,
            },
        }
    }

    pub(crate) fn delivery(destination: &str, message: impl ToString) -> Self {
        PipelineError::Delivery {
            destination: destination.to_string(),
            message: message.to_string(),
        }
    }

    /// True for errors the caller caused (bad input), as opposed to upstream
    /// or internal faults.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PipelineError::Fetch {
                kind: FailureKind::InvalidUrl,
                ..
            }
        )
    }
}
