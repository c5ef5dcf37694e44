//! Bounded retry for calls to the remote catalog.
//!
//! [`RetryPolicy`] is a plain value handed to [`crate::source::TvMazeClient`]
//! rather than something baked into the HTTP stack, so the attempt budget,
//! the backoff curve and the "is this worth retrying" rule can each be
//! swapped in tests.
//!
//! The default policy allows 3 retries after the first attempt and waits
//! `10 * n` seconds before retry `n` (10s, 20s, 30s, 60s in total). Rate
//! limiting (429), transport failures and any non-success status other than
//! 404 are retried. A 404 never is.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::error::SourceError;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BACKOFF_STEP: Duration = Duration::from_secs(10);

type BackoffFn = dyn Fn(u32) -> Duration + Send + Sync;
type RetryableFn = dyn Fn(&SourceError) -> bool + Send + Sync;

#[derive(Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff: Arc<BackoffFn>,
    retryable: Arc<RetryableFn>,
}

impl RetryPolicy {
    /// `max_retries` retries after the first attempt, waiting `step * n`
    /// before retry `n`.
    pub fn linear(max_retries: u32, step: Duration) -> Self {
        RetryPolicy {
            max_retries,
            backoff: Arc::new(move |retry| step * retry),
            retryable: Arc::new(is_transient),
        }
    }

    pub fn with_backoff<F>(mut self, backoff: F) -> Self
    where
        F: Fn(u32) -> Duration + Send + Sync + 'static,
    {
        self.backoff = Arc::new(backoff);
        self
    }

    pub fn with_retryable<F>(mut self, retryable: F) -> Self
    where
        F: Fn(&SourceError) -> bool + Send + Sync + 'static,
    {
        self.retryable = Arc::new(retryable);
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        (self.backoff)(retry)
    }

    pub fn is_retryable(&self, error: &SourceError) -> bool {
        (self.retryable)(error)
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable error,
    /// or the retry budget is spent. The last error is returned unchanged.
    ///
    /// Both the in-flight attempt and the backoff sleep stop as soon as
    /// `cancel` fires, yielding [`SourceError::Cancelled`].
    pub async fn run<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> Result<T, SourceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let mut retry = 0;
        loop {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(SourceError::Cancelled),
                outcome = operation() => outcome,
            };

            let err = match outcome {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !self.is_retryable(&err) {
                return Err(err);
            }
            if retry >= self.max_retries {
                error!(error = %err, attempts = retry + 1, "Giving up after retries");
                return Err(err);
            }

            retry += 1;
            let delay = self.delay_for(retry);
            warn!(
                error = %err,
                retry,
                max_retries = self.max_retries,
                delay_secs = delay.as_secs_f64(),
                "Transient failure, retrying"
            );
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(SourceError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::linear(DEFAULT_MAX_RETRIES, DEFAULT_BACKOFF_STEP)
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field(
                "delays",
                &(1..=self.max_retries)
                    .map(|retry| self.delay_for(retry))
                    .collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

/// Default retryable predicate.
pub fn is_transient(error: &SourceError) -> bool {
    match error {
        SourceError::Http { .. } => true,
        SourceError::Status { status, .. } => *status != StatusCode::NOT_FOUND,
        SourceError::Decode { .. } | SourceError::Cancelled => false,
    }
}
