use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use courier_core::attachment_filename;
use courier_logging::{courier_info, courier_warn};
use serde::{Deserialize, Serialize};

use super::required;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct GeneratePdfPayload {
    pub title: Option<String>,
    pub content: Option<String>,
    pub url: Option<String>,
}

/// Renders one document and returns it as a PDF attachment.
pub async fn generate_pdf(
    State(state): State<AppState>,
    payload: Result<Json<GeneratePdfPayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let title = required(&payload.title, "title")?;
    let content = required(&payload.content, "content")?;
    let source = payload.url.as_deref().map(str::trim).filter(|u| !u.is_empty());

    let document = state
        .orchestrator
        .renderer()
        .render_markup(title, content, source)?;
    courier_info!("Generated {} ({} bytes)", document.filename, document.bytes.len());

    let disposition = format!("attachment; filename=\"{}\"", document.filename);
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.bytes,
    ))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailPayload {
    pub title: Option<String>,
    /// Base64 of the rendered PDF.
    pub pdf_buffer: Option<String>,
    pub kindle_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendEmailResponse {
    pub success: bool,
    pub message: String,
}

/// Delivers a caller-supplied document to one mailbox.
pub async fn send_email(
    State(state): State<AppState>,
    payload: Result<Json<SendEmailPayload>, JsonRejection>,
) -> Result<Json<SendEmailResponse>, ApiError> {
    let Json(payload) = payload?;
    let title = required(&payload.title, "title")?;
    let encoded = required(&payload.pdf_buffer, "pdfBuffer")?;
    let destination = required(&payload.kindle_email, "kindleEmail")?;

    let document = STANDARD.decode(encoded).map_err(|err| {
        courier_warn!("Rejected pdfBuffer for {}: {}", destination, err);
        ApiError::bad_request(format!("pdfBuffer is not valid base64: {err}"))
    })?;
    let filename = attachment_filename(title, Utc::now().timestamp_millis());

    state
        .orchestrator
        .mailer()
        .deliver(destination, &document, &filename, title)
        .await?;

    Ok(Json(SendEmailResponse {
        success: true,
        message: "Email sent successfully".to_string(),
    }))
}
