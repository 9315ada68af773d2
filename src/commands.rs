//! Operations behind the CLI subcommands.

use anyhow::{Context, Result};
use log::info;
use serde_json::Value;
use std::time::Duration;

use crate::cache::{CachedFetcher, FetchOutcome};
use crate::config::Settings;
use crate::error::classify_error;
use crate::http::{Fetch, RequestOptions, RetryPolicy};
use crate::notify::{NoticeLevel, Notifier};
use crate::runtime::Runtime;

/// Fetches `url` through the cache. Stale data counts as success.
#[tracing::instrument(skip(fetcher, policy))]
pub async fn get<R: Runtime, F: Fetch, N: Notifier>(
    fetcher: &CachedFetcher<R, F, N>,
    url: &str,
    key: Option<&str>,
    max_age: Option<Duration>,
    policy: &RetryPolicy,
) -> Result<Value> {
    match fetcher
        .fetch_with_policy::<Value>(url, &RequestOptions::get(), key, max_age, policy)
        .await
    {
        FetchOutcome::Fresh(value) => Ok(value),
        FetchOutcome::Stale { data, error } => {
            info!("Served cached data for {} after: {}", url, error);
            Ok(data)
        }
        FetchOutcome::Failed(error) => {
            // Already recorded by the fetcher.
            let classification = classify_error(&error, None);
            fetcher
                .handler()
                .notice(NoticeLevel::Error, &classification.user_message);
            Err(anyhow::Error::from(error).context(classification.user_message))
        }
    }
}

/// Posts a JSON document. Posts bypass the cache.
#[tracing::instrument(skip(fetcher, data, policy))]
pub async fn post<R: Runtime, F: Fetch, N: Notifier>(
    fetcher: &CachedFetcher<R, F, N>,
    url: &str,
    data: &str,
    policy: &RetryPolicy,
) -> Result<Value> {
    let body: Value = serde_json::from_str(data).context("Invalid JSON in --data")?;

    match fetcher
        .fetcher()
        .execute(url, &RequestOptions::post(body), policy)
        .await
    {
        Ok(value) => Ok(value),
        Err(error) => {
            let classification = fetcher.handler().handle(&error, None);
            Err(anyhow::Error::from(error).context(classification.user_message))
        }
    }
}

/// Validates the environment and returns the missing variable names.
pub fn check_env<R: Runtime, F: Fetch, N: Notifier>(
    fetcher: &CachedFetcher<R, F, N>,
    settings: &Settings,
) -> Vec<&'static str> {
    settings.validate(fetcher.logger())
}
