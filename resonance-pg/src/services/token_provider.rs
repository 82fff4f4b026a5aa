//! Catalog client-credentials token provider
//!
//! Exchanges the service-level client id/secret for a bearer token
//! (`grant_type=client_credentials`, HTTP Basic auth) and caches it until
//! shortly before the reported expiry.
//!
//! The cache is one explicit value behind an async mutex. The lock is held
//! across check, exchange and store, so concurrent callers wait for a single
//! exchange instead of each starting their own. The exchange is bounded by
//! its own deadline, which bounds the wait as well.
//!
//! A failed exchange is remembered for `FAILURE_COOLDOWN`; callers queued
//! behind it report unavailable immediately instead of repeating the
//! exchange one after another.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Tokens are refreshed this long before their reported expiry
pub const EXPIRY_MARGIN_SECS: i64 = 30;

/// Lifetime assumed when the endpoint omits `expires_in`
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// How long a failed exchange short-circuits later callers
pub const FAILURE_COOLDOWN: Duration = Duration::from_secs(2);

/// Reasons a token could not be obtained
///
/// Never fatal: callers treat it as "enrichment unavailable".
#[derive(Debug, Clone, Error)]
pub enum CredentialUnavailable {
    #[error("catalog client credentials are not configured")]
    NotConfigured,

    #[error("token exchange timed out after {} ms", .0.as_millis())]
    TimedOut(Duration),

    #[error("token endpoint returned error {0}: {1}")]
    Status(u16, String),

    #[error("token request failed: {0}")]
    Network(String),

    #[error("token response could not be parsed: {0}")]
    Parse(String),

    #[error("token exchange failed recently: {0}")]
    RecentFailure(String),
}

/// Bearer token with its absolute expiry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedCredential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedCredential {
    pub fn from_expires_in(token: String, expires_in_secs: i64, now: DateTime<Utc>) -> Self {
        Self {
            token,
            expires_at: now + chrono::Duration::seconds(expires_in_secs.max(0)),
        }
    }

    /// Usable at `now`, keeping `EXPIRY_MARGIN_SECS` in reserve
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now + chrono::Duration::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

/// Source of catalog bearer tokens
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn get_token(&self) -> Result<String, CredentialUnavailable>;

    /// Drop the cached token if it is still `rejected_token`
    ///
    /// A rejection of an older token leaves a newer cached one in place.
    async fn invalidate(&self, _rejected_token: &str) {}

    /// Whether credentials are present at all
    fn is_configured(&self) -> bool {
        true
    }
}

#[derive(Debug, Default)]
struct TokenCache {
    credential: Option<CachedCredential>,
    last_failure: Option<(Instant, CredentialUnavailable)>,
}

/// Client-credentials token provider with an expiry-bounded cache
pub struct TokenProvider {
    http_client: reqwest::Client,
    token_url: String,
    client_id: Option<String>,
    client_secret: Option<String>,
    deadline: Duration,
    cache: Mutex<TokenCache>,
}

impl TokenProvider {
    pub fn new(
        http_client: reqwest::Client,
        token_url: impl Into<String>,
        client_id: Option<String>,
        client_secret: Option<String>,
        deadline: Duration,
    ) -> Self {
        Self {
            http_client,
            token_url: token_url.into(),
            client_id,
            client_secret,
            deadline,
            cache: Mutex::new(TokenCache::default()),
        }
    }

    /// Get a token, bounding any exchange by `deadline`
    pub async fn get_token_with_deadline(
        &self,
        deadline: Duration,
    ) -> Result<String, CredentialUnavailable> {
        let (client_id, client_secret) = match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => (id.as_str(), secret.as_str()),
            _ => return Err(CredentialUnavailable::NotConfigured),
        };

        let mut cache = self.cache.lock().await;

        if let Some(credential) = &cache.credential {
            if credential.is_fresh_at(Utc::now()) {
                return Ok(credential.token.clone());
            }
            debug!("Cached catalog token expired, exchanging a new one");
        }

        if let Some((failed_at, reason)) = &cache.last_failure {
            if failed_at.elapsed() < FAILURE_COOLDOWN {
                return Err(CredentialUnavailable::RecentFailure(reason.to_string()));
            }
        }

        match self.exchange(client_id, client_secret, deadline).await {
            Ok(credential) => {
                info!(
                    expires_at = %credential.expires_at,
                    "Obtained catalog access token"
                );
                let token = credential.token.clone();
                cache.credential = Some(credential);
                cache.last_failure = None;
                Ok(token)
            }
            Err(reason) => {
                warn!(error = %reason, "Catalog token exchange failed");
                cache.credential = None;
                cache.last_failure = Some((Instant::now(), reason.clone()));
                Err(reason)
            }
        }
    }

    async fn exchange(
        &self,
        client_id: &str,
        client_secret: &str,
        deadline: Duration,
    ) -> Result<CachedCredential, CredentialUnavailable> {
        let request = async {
            let response = self
                .http_client
                .post(&self.token_url)
                .basic_auth(client_id, Some(client_secret))
                .form(&[("grant_type", "client_credentials")])
                .send()
                .await
                .map_err(|e| CredentialUnavailable::Network(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let error_text = response.text().await.unwrap_or_default();
                return Err(CredentialUnavailable::Status(status.as_u16(), error_text));
            }

            response
                .json::<TokenResponse>()
                .await
                .map_err(|e| CredentialUnavailable::Parse(e.to_string()))
        };

        let body = tokio::time::timeout(deadline, request)
            .await
            .map_err(|_| CredentialUnavailable::TimedOut(deadline))??;

        Ok(CachedCredential::from_expires_in(
            body.access_token,
            body.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS),
            Utc::now(),
        ))
    }
}

#[async_trait]
impl CredentialProvider for TokenProvider {
    async fn get_token(&self) -> Result<String, CredentialUnavailable> {
        self.get_token_with_deadline(self.deadline).await
    }

    async fn invalidate(&self, rejected_token: &str) {
        let mut cache = self.cache.lock().await;
        if cache
            .credential
            .as_ref()
            .is_some_and(|credential| credential.token == rejected_token)
        {
            debug!("Dropping rejected catalog token");
            cache.credential = None;
        }
    }

    fn is_configured(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
}
