use std::{collections::BTreeSet, fmt, sync::Arc, time::Duration};

use rand::Rng;

use crate::NetworkError;

/// Custom retry decision, consulted instead of the status set when present.
pub type RetryPredicate = Arc<dyn Fn(&NetworkError) -> bool + Send + Sync>;

/// Statuses retried when no custom predicate is configured.
pub const DEFAULT_RETRY_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Configures retry count, backoff and retry eligibility.
#[derive(Clone)]
pub struct RetryConfig {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: usize,
    /// Base retry backoff in milliseconds (exponential strategy).
    pub retry_delay_ms: u64,
    /// Upper bound (exclusive) of the random jitter added to each delay.
    pub max_jitter_ms: u64,
    /// Statuses that qualify for a retry.
    pub retry_on: BTreeSet<u16>,
    /// Overrides `retry_on` entirely when set.
    pub should_retry: Option<RetryPredicate>,
}

impl fmt::Debug for RetryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryConfig")
            .field("max_retries", &self.max_retries)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("max_jitter_ms", &self.max_jitter_ms)
            .field("retry_on", &self.retry_on)
            .field("should_retry", &self.should_retry.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            retry_delay_ms: 1_000,
            max_jitter_ms: 1_000,
            retry_on: DEFAULT_RETRY_STATUSES.into_iter().collect(),
            should_retry: None,
        }
    }
}

impl RetryConfig {
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay_ms(mut self, retry_delay_ms: u64) -> Self {
        self.retry_delay_ms = retry_delay_ms;
        self
    }

    pub fn with_max_jitter_ms(mut self, max_jitter_ms: u64) -> Self {
        self.max_jitter_ms = max_jitter_ms;
        self
    }

    /// Replaces the set of retryable statuses.
    pub fn with_retry_on<I>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = u16>,
    {
        self.retry_on = statuses.into_iter().collect();
        self
    }

    /// Installs a predicate that alone decides whether an error is retried.
    pub fn with_should_retry<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&NetworkError) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Some(Arc::new(predicate));
        self
    }

    /// Decides whether the failed attempt number `attempt` gets another try.
    pub fn should_retry_request(
        &self,
        error: &NetworkError,
        attempt: usize,
        max_retries: usize,
    ) -> bool {
        if attempt >= max_retries || !error.is_network() {
            return false;
        }

        if let Some(predicate) = &self.should_retry {
            return predicate(error);
        }

        error
            .status()
            .is_some_and(|status| self.retry_on.contains(&status))
    }

    /// Delay before the retry that follows failed attempt number `attempt`:
    /// `retry_delay_ms * 2^attempt` plus jitter in `[0, max_jitter_ms)`.
    pub fn backoff_delay(&self, attempt: usize) -> Duration {
        let multiplier = u32::try_from(attempt)
            .ok()
            .and_then(|exp| 2u64.checked_pow(exp))
            .unwrap_or(u64::MAX);
        let base_ms = self.retry_delay_ms.saturating_mul(multiplier);

        let jitter_ms = if self.max_jitter_ms == 0 {
            0
        } else {
            rand::rng().random_range(0..self.max_jitter_ms)
        };

        Duration::from_millis(base_ms.saturating_add(jitter_ms))
    }
}
