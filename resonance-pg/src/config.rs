//! Resolved service configuration
//!
//! Combines the TOML bootstrap config with command-line overrides and
//! environment secrets. Missing secrets are not startup errors: generation
//! reports `config_missing` per request and enrichment is skipped.

use resonance_common::config::{
    resolve_secret, CatalogConfig, GenerationConfig, TomlConfig, ENV_CATALOG_CLIENT_ID,
    ENV_CATALOG_CLIENT_SECRET, ENV_GENERATION_API_KEY,
};

use crate::services::RetryPolicy;

/// Fully resolved configuration for one server instance
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    pub log_level: String,
    pub generation: GenerationConfig,
    pub catalog: CatalogConfig,
}

impl ServiceConfig {
    /// Resolve secrets (environment over TOML) and apply a port override
    pub fn resolve(toml: TomlConfig, port_override: Option<u16>) -> Self {
        let mut generation = toml.generation;
        generation.api_key = resolve_secret(
            "Generative API key",
            ENV_GENERATION_API_KEY,
            generation.api_key.as_deref(),
        );

        let mut catalog = toml.catalog;
        catalog.client_id = resolve_secret(
            "Catalog client id",
            ENV_CATALOG_CLIENT_ID,
            catalog.client_id.as_deref(),
        );
        catalog.client_secret = resolve_secret(
            "Catalog client secret",
            ENV_CATALOG_CLIENT_SECRET,
            catalog.client_secret.as_deref(),
        );

        Self {
            port: port_override.unwrap_or(toml.port),
            log_level: toml.logging.level,
            generation,
            catalog,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.generation.max_retries,
            self.generation.base_delay(),
            self.generation.max_delay(),
        )
    }

    /// Both catalog credentials are present
    pub fn catalog_configured(&self) -> bool {
        self.catalog.client_id.is_some() && self.catalog.client_secret.is_some()
    }
}
