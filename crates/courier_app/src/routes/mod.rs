//! Trigger endpoints.
//!
//! - `POST /api/process` streams batch progress as server-sent events
//! - `POST /api/generate-pdf` renders one document and returns it
//! - `POST /api/send-email` delivers an already rendered document
//! - `POST /api/crawl` previews discovery and extraction without delivery
//! - `GET /health` liveness probe

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

mod crawl;
mod documents;
mod process;

pub use crawl::{crawl, CrawlPayload, CrawlResponse};
pub use documents::{generate_pdf, send_email, GeneratePdfPayload, SendEmailPayload, SendEmailResponse};
pub use process::{process, ProcessPayload};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/process", post(process))
        .route("/generate-pdf", post(generate_pdf))
        .route("/send-email", post(send_email))
        .route("/crawl", post(crawl))
}

pub async fn health() -> &'static str {
    "ok"
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes())
        .with_state(state)
}

/// Treats `None` and blank strings alike.
pub(crate) fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, courier_core::RequestError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(courier_core::RequestError::MissingField(field))
}
