//! Courier core: data model and the pure batch state machine.
mod article;
mod batch;
mod event;
mod filename;
mod request;

pub use article::{truncate_chars, Article, ArticleLink, MAX_BODY_CHARS, MAX_TITLE_CHARS};
pub use batch::{update, BatchMsg, BatchPhase, BatchResult, BatchState, ItemStep};
pub use event::{EventKind, ProgressEvent};
pub use filename::{attachment_filename, attachment_stem};
pub use request::{
    BatchRequest, RequestError, SeedRequest, DEFAULT_BATCH_LIMIT, DEFAULT_DISCOVERY_LIMIT,
};
