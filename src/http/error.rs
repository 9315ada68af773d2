//! Typed failures produced by the fetch executor.

use reqwest::StatusCode;
use serde_json::Value;

/// A failed request.
///
/// Every variant carries enough to build a user message and a log record.
/// Values are never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The server answered with a non-2xx status.
    Http {
        status: u16,
        status_text: String,
        message: String,
        /// Parsed JSON body, or `{}` when the body was not JSON.
        body: Value,
    },
    /// No response was received (connect, DNS, reset, body stream).
    Network(String),
    /// The per-attempt timeout elapsed and the request was aborted.
    Timeout,
    /// A 2xx response whose body is not JSON.
    MalformedBody(String),
    /// The request could not be built, or an admin envelope reported failure.
    Validation(String),
}

impl FetchError {
    /// Builds an HTTP error from a status and its best-effort parsed body.
    pub fn http(status: StatusCode, body: Value) -> Self {
        let message = body_message(&body)
            .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));

        FetchError::Http {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            message,
            body,
        }
    }

    /// Maps a transport error from reqwest.
    pub fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchError::Timeout
        } else if error.is_builder() {
            FetchError::Validation(error.to_string())
        } else {
            FetchError::Network(error.to_string())
        }
    }

    /// Error name as reported to log records.
    pub fn name(&self) -> &'static str {
        match self {
            FetchError::Http { .. } => "HttpError",
            FetchError::Network(_) => "NetworkError",
            FetchError::Timeout => "AbortError",
            FetchError::MalformedBody(_) => "SyntaxError",
            FetchError::Validation(_) => "ValidationError",
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn http_status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn status_text(&self) -> Option<&str> {
        match self {
            FetchError::Http { status_text, .. } => Some(status_text),
            _ => None,
        }
    }

    pub fn response_body(&self) -> Option<&Value> {
        match self {
            FetchError::Http { body, .. } => Some(body),
            _ => None,
        }
    }

    /// True for failures where no response arrived.
    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Network(_) | FetchError::Timeout)
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Http { message, .. } => write!(f, "{}", message),
            FetchError::Network(msg) => write!(f, "Network request failed: {}", msg),
            FetchError::Timeout => write!(f, "The operation was aborted due to timeout"),
            FetchError::MalformedBody(msg) => write!(f, "Failed to parse JSON response: {}", msg),
            FetchError::Validation(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

/// Picks a human string out of an error body (`message`, then `error`).
pub(crate) fn body_message(body: &Value) -> Option<String> {
    ["message", "error"].iter().find_map(|field| {
        body.get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    })
}
