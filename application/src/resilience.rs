//! Retry with backoff and primary/fallback model failover.
//!
//! Wraps non-streaming inference calls only. A failed stream is not resumed
//! mid-flight; callers re-issue a fresh call through this layer if the whole
//! stream died before completing.

use crate::ports::inference::{ChatMessage, Completion, InferenceClient, InferenceError};
use panel_domain::SamplingConfig;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Exponential backoff schedule for one model's attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Smaller attempt budget used against the fallback model.
    pub fn for_fallback(&self) -> Self {
        Self {
            max_attempts: self.max_attempts.min(2),
            base_delay: self.base_delay,
        }
    }

    /// Delay before retrying after the given zero-based attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// Retry a non-streaming completion with exponential backoff.
///
/// Client rejections propagate immediately; retrying a request the provider
/// deemed malformed or unauthorized cannot change the outcome.
pub async fn complete_with_retry(
    client: &dyn InferenceClient,
    model_id: &str,
    messages: &[ChatMessage],
    sampling: &SamplingConfig,
    policy: &RetryPolicy,
) -> Result<Completion, InferenceError> {
    let mut last_error = InferenceError::Transport("no attempts were made".to_string());

    for attempt in 0..policy.max_attempts {
        if attempt > 0 {
            let delay = policy.delay_for(attempt - 1);
            debug!(model = model_id, attempt, ?delay, "retrying after backoff");
            tokio::time::sleep(delay).await;
        }

        match client.complete(model_id, messages, sampling).await {
            Ok(completion) => return Ok(completion),
            Err(error) if !error.is_retryable() => return Err(error),
            Err(error) => {
                warn!(model = model_id, attempt, %error, "inference attempt failed");
                last_error = error;
            }
        }
    }

    Err(last_error)
}

/// Both the primary and fallback synthesizer models exhausted their retries.
#[derive(Error, Debug)]
#[error("synthesis models exhausted (primary: {primary}, fallback: {fallback:?}): {last_error}")]
pub struct SynthesisExhausted {
    pub primary: String,
    pub fallback: Option<String>,
    pub last_error: String,
}

/// A completion together with the model that actually produced it.
#[derive(Debug, Clone)]
pub struct FailoverCompletion {
    pub completion: Completion,
    pub model_id: String,
}

/// Retry against the primary model, then run a fresh (smaller) retry
/// sequence against the fallback model if one is configured.
pub async fn complete_with_failover(
    client: &dyn InferenceClient,
    primary: &str,
    fallback: Option<&str>,
    messages: &[ChatMessage],
    sampling: &SamplingConfig,
    policy: &RetryPolicy,
) -> Result<FailoverCompletion, SynthesisExhausted> {
    let primary_error = match complete_with_retry(client, primary, messages, sampling, policy).await
    {
        Ok(completion) => {
            return Ok(FailoverCompletion {
                completion,
                model_id: primary.to_string(),
            });
        }
        Err(error) => error,
    };

    let Some(fallback_model) = fallback else {
        return Err(SynthesisExhausted {
            primary: primary.to_string(),
            fallback: None,
            last_error: primary_error.to_string(),
        });
    };

    warn!(
        primary,
        fallback = fallback_model,
        %primary_error,
        "primary synthesizer exhausted, failing over"
    );

    match complete_with_retry(
        client,
        fallback_model,
        messages,
        sampling,
        &policy.for_fallback(),
    )
    .await
    {
        Ok(completion) => Ok(FailoverCompletion {
            completion,
            model_id: fallback_model.to_string(),
        }),
        Err(fallback_error) => Err(SynthesisExhausted {
            primary: primary.to_string(),
            fallback: Some(fallback_model.to_string()),
            last_error: fallback_error.to_string(),
        }),
    }
}
