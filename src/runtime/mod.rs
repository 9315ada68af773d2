//! Runtime abstraction for process services.
//!
//! The cache and the logger never read the clock or the environment directly;
//! they go through [`Runtime`] so tests can drive time and configuration.
//!
//! # Structure
//!
//! - `env` - Environment variables
//! - `clock` - Wall-clock time in epoch milliseconds

mod clock;
mod env;

use std::env as std_env;

#[cfg_attr(test, mockall::automock)]
pub trait Runtime: Send + Sync {
    // Environment
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError>;

    // Clock
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RealRuntime;

impl Runtime for RealRuntime {
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError> {
        self.env_var_impl(key)
    }

    fn now_ms(&self) -> u64 {
        self.now_ms_impl()
    }
}
