//! Environment configuration.
//!
//! Service credentials are checked for presence only: a missing value is
//! recorded as a critical log record and reported, never treated as fatal.

use anyhow::{Context, Result};
use log::debug;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::DEFAULT_MAX_AGE;
use crate::http::{BASE_DELAY_MS, MAX_RETRIES, RetryPolicy};
use crate::logger::{Category, ErrorLogger, LogEntry, Severity};
use crate::runtime::Runtime;

pub const DATASTORE_URL: &str = "SHOREFETCH_DATASTORE_URL";
pub const DATASTORE_KEY: &str = "SHOREFETCH_DATASTORE_KEY";
pub const MAIL_SERVICE_ID: &str = "SHOREFETCH_MAIL_SERVICE_ID";
pub const MAIL_TEMPLATE_ID: &str = "SHOREFETCH_MAIL_TEMPLATE_ID";
pub const MAIL_PUBLIC_KEY: &str = "SHOREFETCH_MAIL_PUBLIC_KEY";
pub const MAX_RETRIES_VAR: &str = "SHOREFETCH_MAX_RETRIES";
pub const BASE_DELAY_MS_VAR: &str = "SHOREFETCH_BASE_DELAY_MS";
pub const CACHE_MAX_AGE_MS_VAR: &str = "SHOREFETCH_CACHE_MAX_AGE_MS";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub datastore_url: Option<String>,
    pub datastore_key: Option<String>,
    pub mail_service_id: Option<String>,
    pub mail_template_id: Option<String>,
    pub mail_public_key: Option<String>,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub cache_max_age: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            datastore_url: None,
            datastore_key: None,
            mail_service_id: None,
            mail_template_id: None,
            mail_public_key: None,
            max_retries: MAX_RETRIES,
            base_delay_ms: BASE_DELAY_MS,
            cache_max_age: DEFAULT_MAX_AGE,
        }
    }
}

impl Settings {
    /// Reads settings from the environment. Fails only on malformed numbers.
    #[tracing::instrument(skip(runtime))]
    pub fn from_runtime<R: Runtime + ?Sized>(runtime: &R) -> Result<Self> {
        let defaults = Settings::default();

        let settings = Self {
            datastore_url: text_var(runtime, DATASTORE_URL),
            datastore_key: text_var(runtime, DATASTORE_KEY),
            mail_service_id: text_var(runtime, MAIL_SERVICE_ID),
            mail_template_id: text_var(runtime, MAIL_TEMPLATE_ID),
            mail_public_key: text_var(runtime, MAIL_PUBLIC_KEY),
            max_retries: parse_var(runtime, MAX_RETRIES_VAR)?.unwrap_or(defaults.max_retries),
            base_delay_ms: parse_var(runtime, BASE_DELAY_MS_VAR)?
                .unwrap_or(defaults.base_delay_ms),
            cache_max_age: parse_var(runtime, CACHE_MAX_AGE_MS_VAR)?
                .map(Duration::from_millis)
                .unwrap_or(defaults.cache_max_age),
        };

        debug!(
            "Loaded settings: retries={}, base delay={}ms, cache max age={:?}",
            settings.max_retries, settings.base_delay_ms, settings.cache_max_age
        );
        Ok(settings)
    }

    /// Names of required variables that are unset or blank.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            (DATASTORE_URL, &self.datastore_url),
            (DATASTORE_KEY, &self.datastore_key),
            (MAIL_SERVICE_ID, &self.mail_service_id),
            (MAIL_TEMPLATE_ID, &self.mail_template_id),
            (MAIL_PUBLIC_KEY, &self.mail_public_key),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| name)
        .collect()
    }

    /// Records each missing variable as a critical error and returns them.
    pub fn validate<R: Runtime>(&self, logger: &ErrorLogger<R>) -> Vec<&'static str> {
        let missing = self.missing();
        for name in &missing {
            logger.log(LogEntry::new(
                format!("Missing required environment variable: {}", name),
                Severity::Critical,
                Category::Unknown,
            ));
        }
        missing
    }

    /// The process-wide default retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_retries(self.max_retries)
            .with_base_delay_ms(self.base_delay_ms)
    }
}

fn text_var<R: Runtime + ?Sized>(runtime: &R, key: &str) -> Option<String> {
    runtime
        .env_var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T, R>(runtime: &R, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    R: Runtime + ?Sized,
{
    text_var(runtime, key)
        .map(|raw| {
            raw.parse::<T>()
                .with_context(|| format!("Invalid value for {}: {:?}", key, raw))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn runtime_with(vars: &[(&str, &str)]) -> MockRuntime {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let mut runtime = MockRuntime::new();
        runtime
            .expect_env_var()
            .returning(move |key| vars.get(key).cloned().ok_or(std::env::VarError::NotPresent));
        runtime.expect_now_ms().returning(|| 1_700_000_000_000);
        runtime
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let settings = Settings::from_runtime(&runtime_with(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.missing().len(), 5);
    }

    #[test]
    fn test_reads_credentials_and_tuning() {
        let runtime = runtime_with(&[
            (DATASTORE_URL, "https://db.resort.example"),
            (DATASTORE_KEY, "anon-key"),
            (MAIL_SERVICE_ID, "service_1"),
            (MAIL_TEMPLATE_ID, "template_1"),
            (MAIL_PUBLIC_KEY, "pk_1"),
            (MAX_RETRIES_VAR, "5"),
            (BASE_DELAY_MS_VAR, "250"),
            (CACHE_MAX_AGE_MS_VAR, "60000"),
        ]);

        let settings = Settings::from_runtime(&runtime).unwrap();

        assert_eq!(
            settings.datastore_url.as_deref(),
            Some("https://db.resort.example")
        );
        assert!(settings.missing().is_empty());
        assert_eq!(settings.cache_max_age, Duration::from_secs(60));

        let policy = settings.retry_policy();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.base_delay_ms, 250);
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let runtime = runtime_with(&[(DATASTORE_URL, "   "), (DATASTORE_KEY, "key")]);
        let settings = Settings::from_runtime(&runtime).unwrap();

        let missing = settings.missing();
        assert!(missing.contains(&DATASTORE_URL));
        assert!(!missing.contains(&DATASTORE_KEY));
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        let runtime = runtime_with(&[(MAX_RETRIES_VAR, "lots")]);
        let err = Settings::from_runtime(&runtime).unwrap_err();
        assert!(err.to_string().contains(MAX_RETRIES_VAR));
    }

    #[test]
    fn test_validate_logs_critical_records() {
        let runtime = Arc::new(runtime_with(&[
            (DATASTORE_URL, "https://db.resort.example"),
            (DATASTORE_KEY, "anon-key"),
        ]));
        let settings = Settings::from_runtime(runtime.as_ref()).unwrap();
        let logger = ErrorLogger::new(runtime);

        let missing = settings.validate(&logger);

        assert_eq!(
            missing,
            vec![MAIL_SERVICE_ID, MAIL_TEMPLATE_ID, MAIL_PUBLIC_KEY]
        );
        let records = logger.at_least(Severity::Critical);
        assert_eq!(records.len(), 3);
        assert!(records[0].message.contains(MAIL_SERVICE_ID));
    }
}
