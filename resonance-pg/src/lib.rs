//! resonance-pg library interface for testing
//!
//! Exposes the router, application state and services so integration tests
//! can drive the HTTP surface with fake collaborators.

pub mod api;
pub mod config;
pub mod error;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::http::{header, HeaderValue};
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::services::PlaylistService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Playlist pipeline (holds the shared token cache)
    pub service: Arc<PlaylistService>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last generation failure for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(service: Arc<PlaylistService>) -> Self {
        Self {
            service,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::playlist_routes())
        .merge(api::health_routes())
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Outbound HTTP client shared by all upstream collaborators
///
/// Per-call deadlines are applied by the callers, not here.
pub fn build_http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("resonance-pg/", env!("CARGO_PKG_VERSION")))
        .build()
}
