//! Generative service invocation under a deadline
//!
//! The provider call and the deadline timer are raced as a single future
//! (`tokio::time::timeout`). Whichever settles first wins; the losing
//! provider call is dropped and its result never observed.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Boxed error cause kept for diagnostics
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure kinds of one generation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    UpstreamTimeout,
    UpstreamFailure,
    MalformedOutput,
    ConfigMissing,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::UpstreamTimeout => "upstream_timeout",
            FailureKind::UpstreamFailure => "upstream_failure",
            FailureKind::MalformedOutput => "malformed_output",
            FailureKind::ConfigMissing => "config_missing",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generation errors
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generative service did not respond within {} ms", .0.as_millis())]
    TimedOut(Duration),

    #[error("generative service request failed: {message}")]
    UpstreamFailure {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("generative output contained no usable song records")]
    MalformedOutput,

    #[error("{0} is not configured")]
    ConfigMissing(String),
}

impl GenerationError {
    pub fn upstream(message: impl Into<String>) -> Self {
        GenerationError::UpstreamFailure {
            message: message.into(),
            source: None,
        }
    }

    pub fn upstream_with<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        GenerationError::UpstreamFailure {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            GenerationError::TimedOut(_) => FailureKind::UpstreamTimeout,
            GenerationError::UpstreamFailure { .. } => FailureKind::UpstreamFailure,
            GenerationError::MalformedOutput => FailureKind::MalformedOutput,
            GenerationError::ConfigMissing(_) => FailureKind::ConfigMissing,
        }
    }
}

/// A generative text provider
///
/// Implementations issue exactly one request per call and return the raw
/// text. Deadlines are enforced by `GenerativeClient`, not by providers.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &'static str;

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Deadline-bounded access to a `TextGenerator`
#[derive(Clone)]
pub struct GenerativeClient {
    generator: Arc<dyn TextGenerator>,
    timeout: Duration,
}

impl GenerativeClient {
    pub fn new(generator: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Generate with the configured deadline
    pub async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.generate_with_deadline(prompt, self.timeout).await
    }

    /// Generate, abandoning the wait after `deadline`
    pub async fn generate_with_deadline(
        &self,
        prompt: &str,
        deadline: Duration,
    ) -> Result<String, GenerationError> {
        debug!(
            provider = self.generator.name(),
            deadline_ms = deadline.as_millis() as u64,
            prompt_len = prompt.len(),
            "Invoking generative service"
        );

        match tokio::time::timeout(deadline, self.generator.generate(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::TimedOut(deadline)),
        }
    }
}
