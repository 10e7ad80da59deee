use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use courier_core::{Article, SeedRequest};
use courier_logging::{courier_info, courier_warn};
use serde::{Deserialize, Serialize};

use super::required;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CrawlPayload {
    pub url: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlResponse {
    pub success: bool,
    pub posts: Vec<Article>,
    pub count: usize,
}

/// Discovers and extracts articles without rendering or delivering them.
/// Articles that fail to extract are left out of the listing.
pub async fn crawl(
    State(state): State<AppState>,
    payload: Result<Json<CrawlPayload>, JsonRejection>,
) -> Result<Json<CrawlResponse>, ApiError> {
    let Json(payload) = payload?;
    let url = required(&payload.url, "url")?;
    let seed = SeedRequest::new(url, payload.limit.unwrap_or(state.default_limit))?;

    let links = state.orchestrator.discoverer().discover(&seed).await?;
    let mut posts = Vec::with_capacity(links.len());
    for link in &links {
        match state.orchestrator.extractor().extract(link.as_str()).await {
            Ok(article) => posts.push(article),
            Err(err) => courier_warn!("Skipping {}: {}", link, err),
        }
    }

    courier_info!("Crawl of {} extracted {} of {} posts", url, posts.len(), links.len());
    let count = posts.len();
    Ok(Json(CrawlResponse {
        success: true,
        posts,
        count,
    }))
}
