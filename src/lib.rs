//! Resilient data-fetch layer for the resort site and its admin panel.
//!
//! Callers go through [`cache::CachedFetcher`], which checks the response
//! cache, runs the [`http::HttpClient`] executor on a miss, and falls back to
//! stale data when a refresh fails. Failures are classified by [`error`] and
//! recorded in the bounded [`logger::ErrorLogger`].

pub mod cache;
pub mod commands;
pub mod config;
pub mod error;
pub mod http;
pub mod logger;
pub mod notify;
pub mod runtime;
