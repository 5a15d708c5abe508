//! Core rate limiter implementation.

use tracing::debug;

use crate::config::RateLimitConfig;
use crate::error::Result;

use super::backend::{QuotaBackend, QuotaDecision};
use super::store::WindowStore;

/// The core fixed-window rate limiter.
///
/// Owns a [`WindowStore`] and the configured per-window maximum. Thread-safe;
/// share it across tasks behind an `Arc`.
pub struct RateLimiter {
    /// Window state for every active limiter key
    store: WindowStore,
    /// Maximum requests permitted per window
    max: u64,
}

impl RateLimiter {
    /// Create a new rate limiter from a validated configuration.
    ///
    /// Fails fast on misconfiguration (a zero-length window) rather than
    /// clamping to some arbitrary substitute.
    pub fn new(config: &RateLimitConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store: WindowStore::new(config.window_ms, config.grace_ms),
            max: config.max,
        })
    }

    /// Record one request against `key` and decide whether it is within quota.
    ///
    /// The stored count is incremented on every call, including calls that
    /// are rejected, so a caller cannot probe for free by retrying after a
    /// rejection. With `max = 0` the first request is already over quota.
    pub fn check(&self, key: &str, now_ms: u64) -> QuotaDecision {
        let entry = self.store.increment(key, now_ms);
        let allowed = entry.count <= self.max;

        if !allowed {
            debug!(key, count = entry.count, max = self.max, "Rate limit exceeded");
        }

        QuotaDecision {
            allowed,
            limit: self.max,
            remaining: entry.remaining(self.max),
            reset_unix_secs: entry.reset_unix_secs(),
        }
    }

    /// The configured per-window maximum.
    pub fn max(&self) -> u64 {
        self.max
    }

    /// Access the underlying window store, e.g. to schedule eviction sweeps.
    pub fn store(&self) -> &WindowStore {
        &self.store
    }
}

impl QuotaBackend for RateLimiter {
    fn check(&self, key: &str, now_ms: u64) -> QuotaDecision {
        RateLimiter::check(self, key, now_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(window_ms: u64, max: u64) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            window_ms,
            max,
            grace_ms: 0,
        })
        .unwrap()
    }

    #[test]
    fn test_zero_window_rejected_at_construction() {
        let result = RateLimiter::new(&RateLimitConfig {
            window_ms: 0,
            max: 20,
            grace_ms: 0,
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_remaining_counts_down() {
        let limiter = limiter(600_000, 5);

        for expected in [4, 3, 2, 1, 0] {
            let decision = limiter.check("key", 0);
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected);
            assert_eq!(decision.limit, 5);
        }
    }

    #[test]
    fn test_over_limit_rejected_and_still_counted() {
        let limiter = limiter(600_000, 3);

        for _ in 0..3 {
            assert!(limiter.check("key", 0).allowed);
        }

        let decision = limiter.check("key", 0);
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);

        // The rejected request still consumed quota
        assert_eq!(limiter.store().get("key").unwrap().count, 4);
    }

    #[test]
    fn test_rollover_discards_prior_count() {
        let limiter = limiter(1_000, 2);

        assert!(limiter.check("key", 0).allowed);
        assert!(limiter.check("key", 0).allowed);
        assert!(!limiter.check("key", 500).allowed);

        // Past the boundary the old count is gone entirely
        let decision = limiter.check("key", 1_001);
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 1);
        assert_eq!(limiter.store().get("key").unwrap().reset_at_ms, 2_001);
    }

    #[test]
    fn test_keys_do_not_share_quota() {
        let limiter = limiter(600_000, 1);

        assert!(limiter.check("a", 0).allowed);
        assert!(!limiter.check("a", 0).allowed);
        assert!(limiter.check("b", 0).allowed);
    }

    #[test]
    fn test_max_zero_always_rejects() {
        let limiter = limiter(600_000, 0);
        let decision = limiter.check("key", 0);
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
    }

    #[test]
    fn test_identical_configs_make_identical_decisions() {
        let a = limiter(1_000, 3);
        let b = limiter(1_000, 3);

        let times = [0u64, 100, 200, 300, 1_500, 1_600];
        for now in times {
            assert_eq!(a.check("key", now), b.check("key", now));
        }
    }

    #[test]
    fn test_reset_is_unix_seconds() {
        let limiter = limiter(600_000, 20);
        let decision = limiter.check("key", 1_000);
        // Window resets at 601_000 ms, reported as ceil(601_000 / 1000)
        assert_eq!(decision.reset_unix_secs, 601);
    }

    #[test]
    fn test_clock_moving_backward_still_rolls_over() {
        let limiter = limiter(1_000, 5);

        // Entry created late in wall-clock time
        limiter.check("key", 1_000_000);

        // Clock jumps backward; the stale entry must not pin the window open
        let decision = limiter.check("key", 50);
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 4);
        assert_eq!(limiter.store().get("key").unwrap().reset_at_ms, 1_050);
    }
}
