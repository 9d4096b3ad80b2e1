//! sharelink - token-bearing share links for internal resources
//!
//! Issues unguessable tokens that grant scoped, time-bounded access to one
//! record, dashboard or chart, and validates them on every access.
//!
//! # Architecture
//! - `storage`: SeaORM link store and access logs
//! - `cache`: read-through, write-invalidate token cache (moka / Redis / none)
//! - `services`: validation, lifecycle, shared content and analytics
//! - `analytics`: non-blocking access tracking pipeline
//! - `scheduler`: periodic expiry sweep and log retention
//! - `config`: static configuration
//! - `runtime`: component wiring and shutdown
//! - `system`: logging setup

pub mod analytics;
pub mod cache;
pub mod cli;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod scheduler;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
