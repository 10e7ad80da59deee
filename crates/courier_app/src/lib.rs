//! Kindle courier HTTP service: configuration, shared state and the trigger
//! endpoints that drive the courier engine.
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};

pub use config::{AppConfig, BatchConfig, ConfigError, FetchConfig};
pub use error::ApiError;
pub use routes::router;
pub use state::AppState;

/// CORS for the browser front end: a single allowed origin when configured,
/// any origin otherwise.
pub fn cors_layer(origin: Option<&str>) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);
    Ok(match origin {
        Some(origin) => layer.allow_origin(origin.parse::<HeaderValue>()?),
        None => layer.allow_origin(Any),
    })
}
