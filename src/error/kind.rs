//! Normalization of heterogeneous failure values into [`ErrorKind`].

use serde_json::{Value, json};

use crate::http::FetchError;

/// The closed set of failure kinds the classifier dispatches on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A response with a status code; `message` is the error's own text.
    Http { status: u16, message: String },
    Network,
    Timeout,
    MalformedResponse,
    Validation(String),
    /// A plain object from a mail-relay client, reduced to its best string.
    Relay(String),
    /// A bare string error, shown verbatim.
    Text(String),
    Unknown,
}

/// Anything the error handler accepts.
pub trait AsErrorKind {
    fn error_kind(&self) -> ErrorKind;

    /// Technical description for the log record.
    fn detail(&self) -> String;

    fn stack(&self) -> Option<String> {
        None
    }

    fn context(&self) -> Option<Value> {
        None
    }
}

impl AsErrorKind for FetchError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            FetchError::Http {
                status, message, ..
            } => ErrorKind::Http {
                status: *status,
                message: message.clone(),
            },
            FetchError::Network(_) => ErrorKind::Network,
            FetchError::Timeout => ErrorKind::Timeout,
            FetchError::MalformedBody(_) => ErrorKind::MalformedResponse,
            FetchError::Validation(msg) => ErrorKind::Validation(msg.clone()),
        }
    }

    fn detail(&self) -> String {
        format!("{}: {}", self.name(), self)
    }

    fn context(&self) -> Option<Value> {
        match self {
            FetchError::Http {
                status,
                status_text,
                body,
                ..
            } => Some(json!({
                "status": status,
                "status_text": status_text,
                "body": body,
            })),
            _ => None,
        }
    }
}

impl AsErrorKind for reqwest::Error {
    fn error_kind(&self) -> ErrorKind {
        if self.is_timeout() {
            ErrorKind::Timeout
        } else if let Some(status) = self.status() {
            ErrorKind::Http {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else if self.is_decode() {
            ErrorKind::MalformedResponse
        } else if self.is_builder() {
            ErrorKind::Validation(self.to_string())
        } else {
            ErrorKind::Network
        }
    }

    fn detail(&self) -> String {
        self.to_string()
    }
}

impl AsErrorKind for anyhow::Error {
    fn error_kind(&self) -> ErrorKind {
        if let Some(e) = self.downcast_ref::<FetchError>() {
            return e.error_kind();
        }
        if let Some(e) = self.downcast_ref::<reqwest::Error>() {
            return e.error_kind();
        }
        if self.downcast_ref::<serde_json::Error>().is_some() {
            return ErrorKind::MalformedResponse;
        }
        ErrorKind::Unknown
    }

    fn detail(&self) -> String {
        format!("{:#}", self)
    }

    fn stack(&self) -> Option<String> {
        let chain: Vec<String> = self.chain().skip(1).map(|c| c.to_string()).collect();
        if chain.is_empty() {
            None
        } else {
            Some(chain.join("\n"))
        }
    }

    fn context(&self) -> Option<Value> {
        self.downcast_ref::<FetchError>().and_then(|e| e.context())
    }
}

impl AsErrorKind for Value {
    /// Strings are shown verbatim; objects are read the way mail-relay
    /// clients shape their failures (`text`, then `message`, then `status`).
    fn error_kind(&self) -> ErrorKind {
        match self {
            Value::String(s) => ErrorKind::Text(s.clone()),
            Value::Object(map) => {
                let field = |name: &str| {
                    map.get(name)
                        .and_then(Value::as_str)
                        .filter(|s| !s.trim().is_empty())
                        .map(str::to_string)
                };

                if let Some(text) = field("text").or_else(|| field("message")) {
                    return ErrorKind::Relay(text);
                }
                match map.get("status") {
                    Some(Value::Number(n)) => {
                        ErrorKind::Relay(format!("Request failed with status {}", n))
                    }
                    Some(Value::String(s)) if !s.trim().is_empty() => {
                        ErrorKind::Relay(format!("Request failed with status {}", s))
                    }
                    _ => ErrorKind::Unknown,
                }
            }
            _ => ErrorKind::Unknown,
        }
    }

    fn detail(&self) -> String {
        self.to_string()
    }

    fn context(&self) -> Option<Value> {
        match self {
            Value::Object(_) => Some(self.clone()),
            _ => None,
        }
    }
}

impl AsErrorKind for str {
    fn error_kind(&self) -> ErrorKind {
        ErrorKind::Text(self.to_string())
    }

    fn detail(&self) -> String {
        self.to_string()
    }
}

impl AsErrorKind for String {
    fn error_kind(&self) -> ErrorKind {
        self.as_str().error_kind()
    }

    fn detail(&self) -> String {
        self.clone()
    }
}
