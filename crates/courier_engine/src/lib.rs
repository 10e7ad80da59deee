//! Courier engine: fetching, extraction, PDF rendering, mail delivery and
//! the batch orchestrator that strings them together.
mod decode;
mod deliver;
mod discover;
mod error;
mod extract;
mod fetch;
mod orchestrator;
mod render;
mod text;
mod types;

pub use decode::{decode_html, DecodedHtml};
pub use deliver::{
    build_message, escape_html, html_note, plain_note, Mailer, RelayConfig, RelaySettings,
    SmtpMailer, DEFAULT_RELAY_PORT, IMPLICIT_TLS_PORT, KINDLE_SUBJECT,
};
pub use discover::{collect_article_links, LinkDiscoverer};
pub use error::PipelineError;
pub use extract::{ContentExtractor, Extractor, HeuristicExtractor};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher, DEFAULT_USER_AGENT};
pub use orchestrator::{BatchHandle, BatchSettings, ChannelSink, EventSink, Orchestrator};
pub use render::{DocumentRenderer, PageSettings, RenderedDocument, REFLOW_COLUMNS};
pub use text::{looks_like_markup, markup_to_text, normalize_lines, reflow};
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput};
