//! Bounded retry around prompt → generate → repair
//!
//! State machine:
//!
//! ```text
//! Idle → Attempting ─┬─ records ──────────────→ Success
//!                    ├─ retryable, budget left → BackoffWait → Attempting
//!                    └─ terminal or exhausted ─→ Failed
//! ```
//!
//! **Backoff Strategy:**
//! - Delay after attempt index `i` (from 0): `min(base_delay * 2^i, max_delay)`
//! - At most `max_retries + 1` attempts
//! - Only `UpstreamTimeout`, `UpstreamFailure` and `MalformedOutput` are retried

use resonance_common::SongRecord;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::generative_client::{FailureKind, GenerationError, GenerativeClient};
use super::prompt_builder::PromptBuilder;
use super::response_repairer;

/// Retry classification of a failure kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    Retryable,
    Terminal,
}

impl FailureKind {
    /// Kinds not listed here are terminal
    pub fn retry_class(self) -> RetryClass {
        match self {
            FailureKind::UpstreamTimeout
            | FailureKind::UpstreamFailure
            | FailureKind::MalformedOutput => RetryClass::Retryable,
            _ => RetryClass::Terminal,
        }
    }
}

/// Retry budget and backoff schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    /// Total attempts allowed, first attempt included
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay between attempt `attempt_index` and the next one
    pub fn backoff_delay(&self, attempt_index: u32) -> Duration {
        2u32.checked_pow(attempt_index)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000), Duration::from_millis(10_000))
    }
}

/// Orchestrator states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    Idle,
    Attempting { attempt: u32 },
    BackoffWait { attempt: u32, delay: Duration },
    Success,
    Failed,
}

/// Progress of one retry loop; never outlives it
#[derive(Debug, Clone)]
pub struct GenerationAttempt {
    pub index: u32,
    pub elapsed: Duration,
    pub last_failure: Option<FailureKind>,
}

/// Terminal outcome of a retry loop that produced no records
#[derive(Debug, Error)]
#[error("generation failed after {attempts} attempt(s): {last}")]
pub struct GenerationFailure {
    pub attempts: u32,
    pub elapsed: Duration,
    #[source]
    pub last: GenerationError,
}

impl GenerationFailure {
    pub fn kind(&self) -> FailureKind {
        self.last.kind()
    }
}

/// Runs generation attempts until success, a terminal failure or budget exhaustion
pub struct RetryOrchestrator {
    prompt_builder: PromptBuilder,
    client: GenerativeClient,
    policy: RetryPolicy,
}

impl RetryOrchestrator {
    pub fn new(prompt_builder: PromptBuilder, client: GenerativeClient, policy: RetryPolicy) -> Self {
        Self {
            prompt_builder,
            client,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Generate a repaired, non-empty record sequence for `song`
    pub async fn run(&self, song: &str) -> Result<Vec<SongRecord>, GenerationFailure> {
        let started = Instant::now();
        let mut progress = GenerationAttempt {
            index: 0,
            elapsed: Duration::ZERO,
            last_failure: None,
        };
        transition(AttemptState::Idle);

        loop {
            transition(AttemptState::Attempting {
                attempt: progress.index,
            });

            let err = match self.attempt_once(song).await {
                Ok(records) => {
                    transition(AttemptState::Success);
                    info!(
                        attempt = progress.index,
                        records = records.len(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Playlist generation succeeded"
                    );
                    return Ok(records);
                }
                Err(err) => err,
            };

            let kind = err.kind();
            progress.last_failure = Some(kind);
            progress.elapsed = started.elapsed();

            if kind.retry_class() == RetryClass::Terminal {
                transition(AttemptState::Failed);
                error!(
                    attempt = progress.index,
                    failure_kind = %kind,
                    error = %err,
                    "Generation failed with terminal error, not retrying"
                );
                return Err(self.fail(&progress, err));
            }

            if progress.index >= self.policy.max_retries {
                transition(AttemptState::Failed);
                error!(
                    attempts = progress.index + 1,
                    failure_kind = %kind,
                    elapsed_ms = progress.elapsed.as_millis() as u64,
                    error = %err,
                    "Generation failed: retry budget exhausted"
                );
                return Err(self.fail(&progress, err));
            }

            let delay = self.policy.backoff_delay(progress.index);
            transition(AttemptState::BackoffWait {
                attempt: progress.index,
                delay,
            });
            warn!(
                attempt = progress.index,
                failure_kind = %kind,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Generation attempt failed, will retry after backoff"
            );

            tokio::time::sleep(delay).await;
            progress.index += 1;
        }
    }

    async fn attempt_once(&self, song: &str) -> Result<Vec<SongRecord>, GenerationError> {
        let prompt = self.prompt_builder.build(song);
        let raw = self.client.generate(&prompt).await?;
        response_repairer::repair(&raw)
    }

    fn fail(&self, progress: &GenerationAttempt, last: GenerationError) -> GenerationFailure {
        GenerationFailure {
            attempts: progress.index + 1,
            elapsed: progress.elapsed,
            last,
        }
    }
}

fn transition(state: AttemptState) {
    debug!(state = ?state, "Generation state");
}
