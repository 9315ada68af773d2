//! Retry policy for the fetch executor.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use super::error::FetchError;

/// Default number of retries after the first attempt.
pub const MAX_RETRIES: u32 = 3;

/// Default base delay between attempts in milliseconds.
pub const BASE_DELAY_MS: u64 = 1000;

/// HTTP statuses retried by default.
pub const RETRYABLE_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Cap used by [`Backoff::query_default`].
pub const BACKOFF_CAP_MS: u64 = 30_000;

/// Hook invoked before each retry sleep with the upcoming attempt number.
pub type RetryHook = Arc<dyn Fn(u32, &FetchError) + Send + Sync>;

/// How the delay grows between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backoff {
    /// `base * (n + 1)` before attempt `n + 1`.
    #[default]
    Linear,
    /// `min(base * 2^n, cap_ms)` before attempt `n + 1`.
    Exponential { cap_ms: u64 },
}

impl Backoff {
    /// The exponential policy used for background query refreshes.
    pub fn query_default() -> Self {
        Backoff::Exponential {
            cap_ms: BACKOFF_CAP_MS,
        }
    }

    /// Delay before the attempt following the failed attempt `attempt` (0-based).
    pub fn delay(&self, base_delay_ms: u64, attempt: u32) -> Duration {
        let ms = match self {
            Backoff::Linear => base_delay_ms.saturating_mul(u64::from(attempt) + 1),
            Backoff::Exponential { cap_ms } => base_delay_ms
                .saturating_mul(2u64.saturating_pow(attempt))
                .min(*cap_ms),
        };
        Duration::from_millis(ms)
    }
}

/// Governs how many times and with what delay a request is reattempted.
#[derive(Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub retryable_statuses: HashSet<u16>,
    pub backoff: Backoff,
    on_retry: Option<RetryHook>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            base_delay_ms: BASE_DELAY_MS,
            retryable_statuses: RETRYABLE_STATUSES.into_iter().collect(),
            backoff: Backoff::Linear,
            on_retry: None,
        }
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut statuses: Vec<_> = self.retryable_statuses.iter().collect();
        statuses.sort();
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("base_delay_ms", &self.base_delay_ms)
            .field("retryable_statuses", &statuses)
            .field("backoff", &self.backoff)
            .field("on_retry", &self.on_retry.is_some())
            .finish()
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self::default().with_max_retries(0)
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Zero is raised to 1ms.
    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms.max(1);
        self
    }

    pub fn with_retryable_statuses<I: IntoIterator<Item = u16>>(mut self, statuses: I) -> Self {
        self.retryable_statuses = statuses.into_iter().collect();
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn on_retry<F>(mut self, hook: F) -> Self
    where
        F: Fn(u32, &FetchError) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(hook));
        self
    }

    /// Total number of attempts this policy allows.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Whether a failed attempt may be repeated.
    /// Only retryable statuses, network failures and timeouts qualify.
    pub fn should_retry(&self, error: &FetchError) -> bool {
        match error {
            FetchError::Http { status, .. } => self.retryable_statuses.contains(status),
            FetchError::Network(_) | FetchError::Timeout => true,
            FetchError::MalformedBody(_) | FetchError::Validation(_) => false,
        }
    }

    /// Delay before the attempt following the failed attempt `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff.delay(self.base_delay_ms, attempt)
    }

    pub(crate) fn notify_retry(&self, attempt_number: u32, error: &FetchError) {
        if let Some(hook) = &self.on_retry {
            hook(attempt_number, error);
        }
    }
}
