//! Quota backend trait for abstracting the counter store.

/// Outcome of recording one request against a limiter key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaDecision {
    /// Whether the request is within quota
    pub allowed: bool,
    /// The configured per-window maximum
    pub limit: u64,
    /// Requests left in the current window
    pub remaining: u64,
    /// Unix seconds at which the window rolls over
    pub reset_unix_secs: u64,
}

/// Trait for quota backends.
///
/// Abstracts the in-process `RateLimiter` so an external or distributed
/// counter store can be substituted without touching the middleware.
pub trait QuotaBackend: Send + Sync {
    /// Record one request against `key` at `now_ms` and decide whether it is
    /// within quota.
    ///
    /// Every call consumes quota, including calls whose decision is a
    /// rejection: a caller retrying after a 429 keeps paying for each probe.
    fn check(&self, key: &str, now_ms: u64) -> QuotaDecision;
}
