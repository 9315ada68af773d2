use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use serde::de::DeserializeOwned;

use super::{DEFAULT_MAX_AGE, ResponseCache};
use crate::error::ErrorHandler;
use crate::http::{Fetch, FetchError, RequestOptions, RetryPolicy, decode};
use crate::logger::ErrorLogger;
use crate::notify::{NoticeLevel, Notifier};
use crate::runtime::Runtime;

/// Shown when cached data is served because a refresh failed.
pub const OFFLINE_NOTICE: &str = "You may be offline. Showing cached data.";

/// Result of a cached fetch.
#[derive(Debug)]
pub enum FetchOutcome<T> {
    /// Served from a fresh cache entry or a successful request.
    Fresh(T),
    /// The request failed; previously cached data was served instead.
    Stale { data: T, error: FetchError },
    /// The request failed and nothing was cached for the key.
    Failed(FetchError),
}

impl<T> FetchOutcome<T> {
    pub fn is_fresh(&self) -> bool {
        matches!(self, FetchOutcome::Fresh(_))
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, FetchOutcome::Stale { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FetchOutcome::Failed(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            FetchOutcome::Fresh(data) | FetchOutcome::Stale { data, .. } => Some(data),
            FetchOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            FetchOutcome::Fresh(_) => None,
            FetchOutcome::Stale { error, .. } | FetchOutcome::Failed(error) => Some(error),
        }
    }

    /// Stale data counts as success.
    pub fn into_result(self) -> Result<T, FetchError> {
        match self {
            FetchOutcome::Fresh(data) | FetchOutcome::Stale { data, .. } => Ok(data),
            FetchOutcome::Failed(error) => Err(error),
        }
    }
}

/// Fetch executor behind a response cache with stale fallback.
///
/// Concurrent misses on the same key each issue their own request.
pub struct CachedFetcher<R: Runtime, F: Fetch, N: Notifier> {
    fetcher: F,
    cache: ResponseCache<R>,
    handler: ErrorHandler<R, N>,
    policy: RetryPolicy,
    max_age: Duration,
}

impl<R: Runtime, F: Fetch, N: Notifier> CachedFetcher<R, F, N> {
    pub fn new(runtime: Arc<R>, fetcher: F, notifier: N) -> Self {
        let logger = Arc::new(ErrorLogger::new(runtime.clone()));
        Self {
            fetcher,
            cache: ResponseCache::new(runtime),
            handler: ErrorHandler::new(logger, notifier),
            policy: RetryPolicy::default(),
            max_age: DEFAULT_MAX_AGE,
        }
    }

    /// Policy used by [`CachedFetcher::fetch_with_cache`].
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Freshness window used when a call passes none.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn cache(&self) -> &ResponseCache<R> {
        &self.cache
    }

    pub fn handler(&self) -> &ErrorHandler<R, N> {
        &self.handler
    }

    pub fn logger(&self) -> &Arc<ErrorLogger<R>> {
        self.handler.logger()
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches `url` through the cache.
    ///
    /// `key` defaults to the URL and `max_age` to the configured window.
    pub async fn fetch_with_cache<T: DeserializeOwned>(
        &self,
        url: &str,
        options: &RequestOptions,
        key: Option<&str>,
        max_age: Option<Duration>,
    ) -> FetchOutcome<T> {
        self.fetch_with_policy(url, options, key, max_age, &self.policy)
            .await
    }

    /// Same as [`CachedFetcher::fetch_with_cache`] with a per-call policy.
    #[tracing::instrument(skip(self, options, policy))]
    pub async fn fetch_with_policy<T: DeserializeOwned>(
        &self,
        url: &str,
        options: &RequestOptions,
        key: Option<&str>,
        max_age: Option<Duration>,
        policy: &RetryPolicy,
    ) -> FetchOutcome<T> {
        let key = key.unwrap_or(url);
        let max_age = max_age.unwrap_or(self.max_age);

        if let Some(value) = self.cache.fresh(key, max_age) {
            debug!("Cache hit for {}", key);
            return match decode(value) {
                Ok(data) => FetchOutcome::Fresh(data),
                Err(error) => self.fail(error),
            };
        }

        // Only bodies that decode as `T` replace what is cached.
        let error = match self.fetcher.execute(url, options, policy).await {
            Ok(value) => match decode(value.clone()) {
                Ok(data) => {
                    self.cache.set(key, value);
                    return FetchOutcome::Fresh(data);
                }
                Err(error) => error,
            },
            Err(error) => error,
        };

        let Some(stale) = self.cache.peek_stale(key) else {
            return self.fail(error);
        };

        match decode(stale) {
            Ok(data) => {
                warn!("{}: serving cached data for {} ({})", url, key, error);
                self.handler.handle_silent(&error);
                self.handler.notice(NoticeLevel::Warning, OFFLINE_NOTICE);
                FetchOutcome::Stale { data, error }
            }
            Err(stale_error) => {
                debug!("Cached data for {} is unusable: {}", key, stale_error);
                self.fail(error)
            }
        }
    }

    /// Records the failure without a notice; the caller decides whether to raise one.
    fn fail<T>(&self, error: FetchError) -> FetchOutcome<T> {
        self.handler.handle_silent(&error);
        FetchOutcome::Failed(error)
    }
}
