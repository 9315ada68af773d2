use super::kind::ErrorKind;
use crate::logger::{Category, Severity};

pub const MSG_BAD_REQUEST: &str = "Invalid request. Please check your input.";
pub const MSG_UNAUTHORIZED: &str = "You need to be logged in to perform this action.";
pub const MSG_FORBIDDEN: &str = "You don't have permission to perform this action.";
pub const MSG_NOT_FOUND: &str = "The requested resource was not found.";
pub const MSG_TOO_MANY_REQUESTS: &str = "Too many requests. Please wait a moment and try again.";
pub const MSG_SERVER_ERROR: &str = "Server error. Please try again later.";
pub const MSG_NETWORK: &str = "Network error. Please check your internet connection.";
pub const MSG_TIMEOUT: &str = "Request timeout. Please try again.";
pub const MSG_UNEXPECTED: &str = "An unexpected error occurred. Please try again.";

/// What the user is shown and how the failure is recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub user_message: String,
    pub severity: Severity,
    pub category: Category,
}

/// Maps an error kind to a display message, severity and category.
///
/// `custom_message` replaces the generic text for failures that have no
/// message of their own. Never fails.
pub fn classify(kind: &ErrorKind, custom_message: Option<&str>) -> Classification {
    let fallback = || custom_message.unwrap_or(MSG_UNEXPECTED).to_string();

    let (user_message, severity, category) = match kind {
        ErrorKind::Http { status, message } => {
            let (severity, category) = match *status {
                401 | 403 => (Severity::High, Category::Auth),
                500..=599 => (Severity::High, Category::Api),
                _ => (Severity::Medium, Category::Api),
            };
            (status_message(*status, message), severity, category)
        }
        ErrorKind::Network => (MSG_NETWORK.to_string(), Severity::Medium, Category::Network),
        ErrorKind::Timeout => (MSG_TIMEOUT.to_string(), Severity::Medium, Category::Network),
        ErrorKind::MalformedResponse => (fallback(), Severity::Medium, Category::Api),
        ErrorKind::Validation(msg) => (msg.clone(), Severity::Low, Category::Validation),
        ErrorKind::Relay(msg) => (msg.clone(), Severity::Low, Category::Validation),
        ErrorKind::Text(msg) => (msg.clone(), Severity::Low, Category::Unknown),
        ErrorKind::Unknown => (fallback(), Severity::Medium, Category::Unknown),
    };

    Classification {
        user_message,
        severity,
        category,
    }
}

fn status_message(status: u16, own_message: &str) -> String {
    match status {
        400 => MSG_BAD_REQUEST,
        401 => MSG_UNAUTHORIZED,
        403 => MSG_FORBIDDEN,
        404 => MSG_NOT_FOUND,
        429 => MSG_TOO_MANY_REQUESTS,
        500..=599 => MSG_SERVER_ERROR,
        _ => own_message,
    }
    .to_string()
}
