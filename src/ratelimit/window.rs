//! Fixed-window counter state.

/// State of one rate limit window for a single limiter key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowEntry {
    /// Requests observed in the current window
    pub count: u64,
    /// Wall-clock milliseconds since the Unix epoch at which this window
    /// rolls over
    pub reset_at_ms: u64,
}

impl WindowEntry {
    /// Create an empty entry whose window starts at `now_ms`.
    pub fn fresh(now_ms: u64, window_ms: u64) -> Self {
        Self {
            count: 0,
            reset_at_ms: now_ms.saturating_add(window_ms),
        }
    }

    /// Whether this window has expired at `now_ms`.
    ///
    /// Windows are half-open: a request arriving exactly at the reset time
    /// belongs to the next window. An entry whose reset time lies more than
    /// one full window in the future can only have been created before the
    /// system clock moved backward; it is treated as expired so a stale
    /// reset time never pins a window open.
    pub fn is_expired(&self, now_ms: u64, window_ms: u64) -> bool {
        now_ms >= self.reset_at_ms || self.reset_at_ms > now_ms.saturating_add(window_ms)
    }

    /// Remaining quota under `max`, saturating at zero.
    pub fn remaining(&self, max: u64) -> u64 {
        max.saturating_sub(self.count)
    }

    /// Unix seconds at which the window rolls over, rounded up.
    pub fn reset_unix_secs(&self) -> u64 {
        self.reset_at_ms.div_ceil(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_entry() {
        let entry = WindowEntry::fresh(1_000, 600_000);
        assert_eq!(entry.count, 0);
        assert_eq!(entry.reset_at_ms, 601_000);
    }

    #[test]
    fn test_expiry_is_half_open() {
        let entry = WindowEntry::fresh(0, 1_000);
        assert!(!entry.is_expired(999, 1_000));
        // A request at exactly the reset time lands in the new window
        assert!(entry.is_expired(1_000, 1_000));
        assert!(entry.is_expired(1_001, 1_000));
    }

    #[test]
    fn test_clock_backward_entry_expires() {
        // Entry created at t=100_000, then the clock jumps back to t=10
        let entry = WindowEntry::fresh(100_000, 1_000);
        assert!(entry.is_expired(10, 1_000));
    }

    #[test]
    fn test_remaining_saturates() {
        let mut entry = WindowEntry::fresh(0, 1_000);
        entry.count = 25;
        assert_eq!(entry.remaining(20), 0);
        entry.count = 3;
        assert_eq!(entry.remaining(20), 17);
    }

    #[test]
    fn test_reset_unix_secs_rounds_up() {
        let entry = WindowEntry {
            count: 0,
            reset_at_ms: 1_500,
        };
        assert_eq!(entry.reset_unix_secs(), 2);

        let entry = WindowEntry {
            count: 0,
            reset_at_ms: 2_000,
        };
        assert_eq!(entry.reset_unix_secs(), 2);
    }
}
