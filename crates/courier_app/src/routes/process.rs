use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use courier_core::BatchRequest;
use courier_logging::courier_info;
use serde::Deserialize;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessPayload {
    pub blog_url: Option<String>,
    pub kindle_email: Option<String>,
    pub post_limit: Option<usize>,
}

/// Starts a batch and streams its progress events, one `data:` frame each.
/// Request and relay problems are reported before the stream opens.
pub async fn process(
    State(state): State<AppState>,
    payload: Result<Json<ProcessPayload>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let Json(payload) = payload?;
    let request = BatchRequest::new(
        payload.blog_url.as_deref().unwrap_or_default(),
        payload.kindle_email.as_deref().unwrap_or_default(),
        payload.post_limit,
        state.default_limit,
    )?;
    state.orchestrator.mailer().ready()?;

    courier_info!(
        "Starting batch for {} (limit {}) to {}",
        request.seed.origin(),
        request.seed.limit(),
        request.destination
    );
    let handle = state.orchestrator.clone().spawn(request);
    let events = ReceiverStream::new(handle.events).map(|event| Event::default().json_data(&event));

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
