//! Playlist generation services
//!
//! Pipeline, leaf-first:
//! - `prompt_builder` builds the instruction text
//! - `generative_client` calls the generative service under a deadline
//!   (`gemini_client` is the shipped provider)
//! - `response_repairer` turns raw text into song records
//! - `retry_orchestrator` runs the three above with capped exponential backoff
//! - `token_provider` exchanges catalog client credentials for a cached token
//! - `catalog_client` searches the catalog for one track
//! - `enrichment_coordinator` matches every record concurrently
//! - `playlist_service` ties generation and enrichment together

pub mod catalog_client;
pub mod enrichment_coordinator;
pub mod gemini_client;
pub mod generative_client;
pub mod playlist_service;
pub mod prompt_builder;
pub mod response_repairer;
pub mod retry_orchestrator;
pub mod token_provider;

pub use catalog_client::{CatalogClient, CatalogError, TrackSearch};
pub use enrichment_coordinator::EnrichmentCoordinator;
pub use gemini_client::GeminiClient;
pub use generative_client::{FailureKind, GenerationError, GenerativeClient, TextGenerator};
pub use playlist_service::{PlaylistError, PlaylistService};
pub use prompt_builder::PromptBuilder;
pub use response_repairer::{normalize_song, repair};
pub use retry_orchestrator::{
    AttemptState, GenerationAttempt, GenerationFailure, RetryClass, RetryOrchestrator, RetryPolicy,
};
pub use token_provider::{CachedCredential, CredentialProvider, CredentialUnavailable, TokenProvider};
