//! Playlist generation pipeline
//!
//! validate → generate (with retry) → enrich → records

use resonance_common::SongRecord;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use super::catalog_client::CatalogClient;
use super::enrichment_coordinator::EnrichmentCoordinator;
use super::gemini_client::GeminiClient;
use super::generative_client::GenerativeClient;
use super::prompt_builder::PromptBuilder;
use super::retry_orchestrator::{GenerationFailure, RetryOrchestrator};
use super::token_provider::TokenProvider;
use crate::config::ServiceConfig;

#[derive(Debug, Error)]
pub enum PlaylistError {
    #[error("Invalid song input")]
    InvalidInput,

    #[error(transparent)]
    Generation(#[from] GenerationFailure),
}

/// Top-level pipeline for one request
pub struct PlaylistService {
    orchestrator: RetryOrchestrator,
    enrichment: EnrichmentCoordinator,
}

impl PlaylistService {
    pub fn new(orchestrator: RetryOrchestrator, enrichment: EnrichmentCoordinator) -> Self {
        Self {
            orchestrator,
            enrichment,
        }
    }

    /// Wire the production collaborators from resolved configuration
    pub fn from_config(config: &ServiceConfig, http_client: reqwest::Client) -> Self {
        let generator = GeminiClient::new(
            http_client.clone(),
            config.generation.base_url.clone(),
            config.generation.model.clone(),
            config.generation.api_key.clone(),
        );
        let orchestrator = RetryOrchestrator::new(
            PromptBuilder::new(config.generation.song_count),
            GenerativeClient::new(Arc::new(generator), config.generation.timeout()),
            config.retry_policy(),
        );

        let credentials = TokenProvider::new(
            http_client.clone(),
            config.catalog.token_url.clone(),
            config.catalog.client_id.clone(),
            config.catalog.client_secret.clone(),
            config.catalog.token_timeout(),
        );
        let catalog = CatalogClient::new(
            http_client,
            config.catalog.search_url.clone(),
            config.catalog.search_timeout(),
        );

        Self::new(
            orchestrator,
            EnrichmentCoordinator::new(Arc::new(credentials), Arc::new(catalog)),
        )
    }

    /// Whether records will be matched against the catalog
    pub fn catalog_enrichment_enabled(&self) -> bool {
        self.enrichment.is_configured()
    }

    /// Generate an enriched playlist for `song`
    ///
    /// Blank input is rejected before any upstream call.
    pub async fn generate_playlist(&self, song: &str) -> Result<Vec<SongRecord>, PlaylistError> {
        let song = song.trim();
        if song.is_empty() {
            return Err(PlaylistError::InvalidInput);
        }

        info!(song = %song, "Generating playlist");

        let records = self.orchestrator.run(song).await?;
        Ok(self.enrichment.enrich(records).await)
    }
}
