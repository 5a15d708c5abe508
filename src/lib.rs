//! Quotagate - In-Process HTTP Rate Limiting
//!
//! This crate implements a per-key request-rate throttle for HTTP services.
//! Requests are counted against a rolling fixed window, rejected with a 429
//! once the quota is exceeded, and quota state is reported to the caller on
//! every response via `x-ratelimit-*` headers. Counters live in process
//! memory; distributed counter sharing is left as a backend extension point.

pub mod config;
pub mod error;
pub mod http;
pub mod ratelimit;
