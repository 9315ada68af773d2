//! HTTP fetch executor with retry logic and typed errors.

mod client;
mod envelope;
mod error;
mod request;
mod retry;

#[cfg(test)]
pub use client::MockFetch;
pub use client::{Fetch, HttpClient, REQUEST_TIMEOUT};
pub(crate) use client::decode;
pub use envelope::{AdminApi, ensure_success};
pub use error::FetchError;
pub use request::RequestOptions;
pub use retry::{
    BACKOFF_CAP_MS, BASE_DELAY_MS, Backoff, MAX_RETRIES, RETRYABLE_STATUSES, RetryHook,
    RetryPolicy,
};
