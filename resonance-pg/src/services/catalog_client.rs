//! Music catalog track search
//!
//! `GET {search_url}?q={query}&type=track&limit=1` with a bearer token.
//! Only the id of the first track item is used.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Catalog search errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Network(String),

    #[error("catalog rejected the access token")]
    Unauthorized,

    #[error("catalog returned error {0}: {1}")]
    Api(u16, String),

    #[error("catalog response could not be parsed: {0}")]
    Parse(String),

    #[error("catalog search timed out after {} ms", .0.as_millis())]
    TimedOut(Duration),
}

/// Track lookup against a music catalog
#[async_trait]
pub trait TrackSearch: Send + Sync {
    /// Identifier of the best match for `query`, if any
    async fn search_first_track(
        &self,
        token: &str,
        query: &str,
    ) -> Result<Option<String>, CatalogError>;
}

/// Catalog search client
pub struct CatalogClient {
    http_client: reqwest::Client,
    search_url: String,
    deadline: Duration,
}

impl CatalogClient {
    pub fn new(http_client: reqwest::Client, search_url: impl Into<String>, deadline: Duration) -> Self {
        Self {
            http_client,
            search_url: search_url.into(),
            deadline,
        }
    }

    async fn search(&self, token: &str, query: &str) -> Result<Option<String>, CatalogError> {
        let response = self
            .http_client
            .get(&self.search_url)
            .bearer_auth(token)
            .query(&[("q", query), ("type", "track"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(CatalogError::Unauthorized);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api(status.as_u16(), error_text));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))?;

        Ok(body.first_track_id())
    }
}

#[async_trait]
impl TrackSearch for CatalogClient {
    async fn search_first_track(
        &self,
        token: &str,
        query: &str,
    ) -> Result<Option<String>, CatalogError> {
        debug!(query = %query, "Searching catalog");

        tokio::time::timeout(self.deadline, self.search(token, query))
            .await
            .map_err(|_| CatalogError::TimedOut(self.deadline))?
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Option<TrackPage>,
}

#[derive(Debug, Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<TrackItem>,
}

#[derive(Debug, Deserialize)]
struct TrackItem {
    id: Option<String>,
}

impl SearchResponse {
    fn first_track_id(self) -> Option<String> {
        self.tracks?.items.into_iter().next()?.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_track_id() {
        let body: SearchResponse = serde_json::from_str(
            r#"{"tracks":{"items":[{"id":"4u7EnebtmKWzUH433cf5Qv","name":"Bohemian Rhapsody"},{"id":"other"}]}}"#,
        )
        .unwrap();
        assert_eq!(body.first_track_id().as_deref(), Some("4u7EnebtmKWzUH433cf5Qv"));
    }

    #[test]
    fn test_empty_results_have_no_match() {
        let body: SearchResponse = serde_json::from_str(r#"{"tracks":{"items":[]}}"#).unwrap();
        assert!(body.first_track_id().is_none());

        let body: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(body.first_track_id().is_none());
    }
}
