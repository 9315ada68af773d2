//! Admin endpoints answer with a `{ "success": bool, ... }` envelope.

use serde_json::Value;

use super::client::Fetch;
use super::error::{FetchError, body_message};
use super::request::RequestOptions;
use super::retry::RetryPolicy;

/// Passes a successful envelope through; anything else is a validation failure.
pub fn ensure_success(value: Value) -> Result<Value, FetchError> {
    match value.get("success").and_then(Value::as_bool) {
        Some(true) => Ok(value),
        Some(false) => Err(FetchError::Validation(
            body_message(&value).unwrap_or_else(|| "The server reported a failure".to_string()),
        )),
        None => Err(FetchError::Validation(
            "Response is missing the success flag".to_string(),
        )),
    }
}

/// Endpoints under `<base>/admin/api/`.
#[derive(Debug, Clone)]
pub struct AdminApi {
    base_url: String,
}

impl AdminApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }

    pub fn path(&self, endpoint: &str) -> String {
        format!(
            "{}/admin/api/{}",
            self.base_url,
            endpoint.trim_start_matches('/')
        )
    }

    /// Calls an endpoint and unwraps its envelope.
    #[tracing::instrument(skip(self, fetch, options, policy))]
    pub async fn call<F: Fetch + ?Sized>(
        &self,
        fetch: &F,
        endpoint: &str,
        options: &RequestOptions,
        policy: &RetryPolicy,
    ) -> Result<Value, FetchError> {
        let value = fetch.execute(&self.path(endpoint), options, policy).await?;
        ensure_success(value)
    }
}
