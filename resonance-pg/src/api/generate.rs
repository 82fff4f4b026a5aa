//! Playlist generation endpoint
//!
//! `POST /generate-playlist` with `{"song": "<title>"}`.
//!
//! The body is read as raw bytes. Anything without a string `song` field,
//! and any blank song, is answered with 400 before an upstream call.
//! Bodies over axum's default 2 MB limit never reach validation; the
//! extractor answers them with 413.
//!
//! A generation failure is recorded for `/health`; the next success clears it.

use axum::{body::Bytes, extract::State, routing::post, Json, Router};
use resonance_common::SongRecord;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::services::PlaylistError;
use crate::AppState;

/// Successful playlist response
#[derive(Debug, Serialize)]
pub struct PlaylistResponse {
    pub playlist: Vec<SongRecord>,
}

/// Extract the `song` field, if the body carries one as a string
fn song_from_body(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value.get("song")?.as_str().map(str::to_string)
}

/// POST /generate-playlist
pub async fn generate_playlist(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<PlaylistResponse>> {
    let request_id = Uuid::new_v4();
    handle(state, body)
        .instrument(info_span!("generate_playlist", %request_id))
        .await
}

async fn handle(state: AppState, body: Bytes) -> ApiResult<Json<PlaylistResponse>> {
    let song = song_from_body(&body).ok_or(PlaylistError::InvalidInput)?;

    match state.service.generate_playlist(&song).await {
        Ok(playlist) => {
            info!(records = playlist.len(), "Playlist generated");
            *state.last_error.write().await = None;
            Ok(Json(PlaylistResponse { playlist }))
        }
        Err(PlaylistError::Generation(failure)) => {
            warn!(
                failure_kind = %failure.kind(),
                attempts = failure.attempts,
                error = %failure,
                "Playlist generation failed"
            );
            *state.last_error.write().await = Some(failure.to_string());
            Err(PlaylistError::Generation(failure).into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Build playlist routes
pub fn playlist_routes() -> Router<AppState> {
    Router::new().route("/generate-playlist", post(generate_playlist))
}
