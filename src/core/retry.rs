//! Bounded retry with backoff for storage conflicts.
//!
//! The storage layer surfaces optimistic-concurrency aborts as
//! [`Error::Conflict`]; operations wrapped in [`with_conflict_retry`] are
//! re-run a bounded number of times with jittered exponential backoff before
//! the conflict reaches the caller. Validation and not-found failures pass
//! through on the first attempt.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::{future::Future, time::Duration};
use tracing::warn;

/// Upper bound on a single backoff delay.
const MAX_BACKOFF_MS: u64 = 2_000;

/// Conflict retry knobs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Total attempts before a conflict is surfaced (minimum 1)
    pub max_attempts: u32,
    /// Delay before the first retry; doubles each further retry
    pub base_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 50,
        }
    }
}

/// Deterministic jitter so concurrent writers against the same document do
/// not retry in lockstep.
const fn jitter_ms(seed: u64) -> u64 {
    seed.wrapping_mul(2_654_435_761) % 25
}

/// Delay before retry number `attempt` (1-based).
fn backoff_delay(attempt: u32, base_delay_ms: u64) -> Duration {
    let exponent = attempt.saturating_sub(1).min(6);
    let exponential = base_delay_ms.saturating_mul(1_u64 << exponent);
    let bounded = exponential.min(MAX_BACKOFF_MS);
    Duration::from_millis(bounded + jitter_ms(u64::from(attempt)))
}

/// Runs `operation`, retrying on [`Error::Conflict`] up to the configured
/// number of attempts.
///
/// The closure is invoked once per attempt and must re-run the whole
/// transactional unit; partial state never survives a failed attempt because
/// the transaction it belongs to rolled back with it.
pub async fn with_conflict_retry<T, F, Fut>(
    settings: &RetrySettings,
    operation_name: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = settings.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation().await {
            Err(Error::Conflict { message }) if attempt < max_attempts => {
                let delay = backoff_delay(attempt, settings.base_delay_ms);
                warn!(
                    operation = operation_name,
                    attempt,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "transaction conflict, retrying: {message}"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}
