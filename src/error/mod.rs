//! Error classification: any failure value becomes an [`ErrorKind`], then a
//! user message with a severity and category.

mod classify;
mod handler;
mod kind;

pub use classify::{
    Classification, MSG_BAD_REQUEST, MSG_FORBIDDEN, MSG_NETWORK, MSG_NOT_FOUND, MSG_SERVER_ERROR,
    MSG_TIMEOUT, MSG_TOO_MANY_REQUESTS, MSG_UNAUTHORIZED, MSG_UNEXPECTED, classify,
};
pub use handler::ErrorHandler;
pub use kind::{AsErrorKind, ErrorKind};

/// Classifies any supported failure value.
pub fn classify_error<E: AsErrorKind + ?Sized>(
    error: &E,
    custom_message: Option<&str>,
) -> Classification {
    classify(&error.error_kind(), custom_message)
}
