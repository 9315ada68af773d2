use std::sync::Arc;

use super::classify::{Classification, classify};
use super::kind::AsErrorKind;
use crate::logger::{ErrorLogger, LogEntry};
use crate::notify::{NoticeLevel, Notifier};
use crate::runtime::Runtime;

/// Classifies failures, records them and raises user notices.
pub struct ErrorHandler<R: Runtime, N: Notifier> {
    logger: Arc<ErrorLogger<R>>,
    notifier: N,
}

impl<R: Runtime, N: Notifier> ErrorHandler<R, N> {
    pub fn new(logger: Arc<ErrorLogger<R>>, notifier: N) -> Self {
        Self { logger, notifier }
    }

    pub fn logger(&self) -> &Arc<ErrorLogger<R>> {
        &self.logger
    }

    /// Records the failure and raises exactly one error notice.
    pub fn handle<E: AsErrorKind + ?Sized>(
        &self,
        error: &E,
        custom_message: Option<&str>,
    ) -> Classification {
        let classification = self.record(error, custom_message);
        self.notifier
            .notify(NoticeLevel::Error, &classification.user_message);
        classification
    }

    /// Records the failure without notifying the user.
    pub fn handle_silent<E: AsErrorKind + ?Sized>(&self, error: &E) -> Classification {
        self.record(error, None)
    }

    /// Raises a notice that is not tied to a failure.
    pub fn notice(&self, level: NoticeLevel, message: &str) {
        self.notifier.notify(level, message);
    }

    fn record<E: AsErrorKind + ?Sized>(
        &self,
        error: &E,
        custom_message: Option<&str>,
    ) -> Classification {
        let classification = classify(&error.error_kind(), custom_message);

        let mut entry = LogEntry::new(
            error.detail(),
            classification.severity,
            classification.category,
        );
        if let Some(stack) = error.stack() {
            entry = entry.with_stack(stack);
        }
        if let Some(context) = error.context() {
            entry = entry.with_context(context);
        }
        self.logger.log(entry);

        classification
    }
}
