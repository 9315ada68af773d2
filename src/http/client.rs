//! HTTP client with per-attempt timeout, retry and backoff.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;

use super::error::FetchError;
use super::request::RequestOptions;
use super::retry::RetryPolicy;

/// Fixed per-attempt timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Performs a request under a retry policy and returns the parsed JSON body.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn execute(
        &self,
        url: &str,
        options: &RequestOptions,
        policy: &RetryPolicy,
    ) -> Result<Value, FetchError>;
}

/// HTTP client with built-in retry logic for network operations.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            timeout: REQUEST_TIMEOUT,
        }
    }

    /// Overrides the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Performs a GET request with the default policy and deserializes the body.
    #[tracing::instrument(skip(self))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let value = self
            .execute(url, &RequestOptions::get(), &RetryPolicy::default())
            .await?;
        decode(value)
    }

    /// Performs a POST request with a JSON body and deserializes the response.
    #[tracing::instrument(skip(self, body))]
    pub async fn post_json<T, B>(&self, url: &str, body: &B) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body).map_err(|e| FetchError::Validation(e.to_string()))?;
        let value = self
            .execute(url, &RequestOptions::post(body), &RetryPolicy::default())
            .await?;
        decode(value)
    }

    /// Single attempt without retry, bounded by the timeout.
    async fn execute_once(&self, url: &str, options: &RequestOptions) -> Result<Value, FetchError> {
        let mut request = self
            .client
            .request(options.method.clone(), url)
            .headers(options.request_headers());

        if let Some(body) = &options.body {
            request = request.body(body.to_string());
        }

        let attempt = async {
            let response = request.send().await.map_err(FetchError::from_reqwest)?;
            read_response(response).await
        };

        match tokio::time::timeout(self.timeout, attempt).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout),
        }
    }
}

#[async_trait]
impl Fetch for HttpClient {
    #[tracing::instrument(skip(self, options, policy))]
    async fn execute(
        &self,
        url: &str,
        options: &RequestOptions,
        policy: &RetryPolicy,
    ) -> Result<Value, FetchError> {
        debug!("{} {}...", options.method, url);

        let attempts = policy.max_attempts();
        let mut last_error = None;

        for attempt in 0..attempts {
            match self.execute_once(url, options).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if !policy.should_retry(&e) {
                        debug!("{} {}: non-retryable error: {}", options.method, url, e);
                        return Err(e);
                    }

                    if attempt + 1 < attempts {
                        let delay = policy.delay_for(attempt);
                        policy.notify_retry(attempt + 1, &e);
                        warn!(
                            "{} {}: attempt {}/{} failed ({}), retrying in {}ms...",
                            options.method,
                            url,
                            attempt + 1,
                            attempts,
                            e,
                            delay.as_millis()
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            FetchError::Network(format!("{}: failed after {} attempts", url, attempts))
        }))
    }
}

/// Reads a response: 2xx bodies must be JSON, error bodies are parsed best-effort.
async fn read_response(response: Response) -> Result<Value, FetchError> {
    let status = response.status();

    if status.is_success() {
        let text = response.text().await.map_err(FetchError::from_reqwest)?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        return serde_json::from_str(&text).map_err(|e| FetchError::MalformedBody(e.to_string()));
    }

    let body = response
        .text()
        .await
        .ok()
        .and_then(|text| serde_json::from_str(&text).ok())
        .unwrap_or_else(|| json!({}));

    Err(FetchError::http(status, body))
}

pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T, FetchError> {
    serde_json::from_value(value).map_err(|e| FetchError::MalformedBody(e.to_string()))
}
