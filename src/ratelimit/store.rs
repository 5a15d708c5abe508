//! In-memory store of rate limit windows.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::{debug, trace};

use super::window::WindowEntry;

/// Number of increments between opportunistic eviction sweeps.
const SWEEP_EVERY: u64 = 4096;

/// Maps limiter keys to their current window state.
///
/// The store is the sole mutator of window entries. Every update runs under
/// the map's per-shard write lock, so the whole read-roll-increment sequence
/// is atomic with respect to other callers racing on the same key.
pub struct WindowStore {
    /// Window entries indexed by limiter key
    windows: DashMap<String, WindowEntry>,
    /// Window duration in milliseconds
    window_ms: u64,
    /// Retention period for expired entries before eviction, in milliseconds
    grace_ms: u64,
    /// Increment operations since creation, used to schedule sweeps
    ops: AtomicU64,
}

impl WindowStore {
    /// Create a new store with the given window and eviction grace period.
    pub fn new(window_ms: u64, grace_ms: u64) -> Self {
        Self {
            windows: DashMap::new(),
            window_ms,
            grace_ms,
            ops: AtomicU64::new(0),
        }
    }

    /// Return the live entry for `key`, installing a fresh one if no entry
    /// exists or the existing entry's window has expired.
    pub fn get_or_create(&self, key: &str, now_ms: u64) -> WindowEntry {
        let mut entry = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| {
                debug!(key, "Creating new window entry");
                WindowEntry::fresh(now_ms, self.window_ms)
            });

        if entry.is_expired(now_ms, self.window_ms) {
            trace!(key, prior_count = entry.count, "Window rolled over");
            *entry = WindowEntry::fresh(now_ms, self.window_ms);
        }

        *entry
    }

    /// Record one request against `key`, returning the updated entry.
    ///
    /// Equivalent to `get_or_create` followed by a count increment, observable
    /// as a single step: no caller sees the intermediate state, and two
    /// requests racing a rollover boundary cannot both reset the counter.
    pub fn increment(&self, key: &str, now_ms: u64) -> WindowEntry {
        let snapshot = {
            let mut entry = self
                .windows
                .entry(key.to_string())
                .or_insert_with(|| {
                    debug!(key, "Creating new window entry");
                    WindowEntry::fresh(now_ms, self.window_ms)
                });

            if entry.is_expired(now_ms, self.window_ms) {
                trace!(key, prior_count = entry.count, "Window rolled over");
                *entry = WindowEntry::fresh(now_ms, self.window_ms);
            }

            entry.count += 1;
            *entry
        };

        self.maybe_sweep(now_ms);
        snapshot
    }

    /// Remove entries whose window expired more than the grace period ago.
    pub fn evict_expired(&self, now_ms: u64) {
        let before = self.windows.len();
        let grace_ms = self.grace_ms;
        self.windows
            .retain(|_, entry| entry.reset_at_ms.saturating_add(grace_ms) >= now_ms);

        let evicted = before.saturating_sub(self.windows.len());
        if evicted > 0 {
            debug!(evicted, remaining = self.windows.len(), "Evicted stale window entries");
        }
    }

    /// Get the current entry for a key, if one exists.
    ///
    /// Returns the raw stored entry without applying rollover.
    pub fn get(&self, key: &str) -> Option<WindowEntry> {
        self.windows.get(key).map(|e| *e)
    }

    /// Number of live window entries.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Remove all entries.
    ///
    /// This is primarily useful for testing.
    pub fn clear(&self) {
        self.windows.clear();
    }

    /// Run an eviction sweep on a fraction of increments so the hot path
    /// stays O(1) amortized.
    fn maybe_sweep(&self, now_ms: u64) {
        let ops = self.ops.fetch_add(1, Ordering::Relaxed);
        if ops % SWEEP_EVERY == SWEEP_EVERY - 1 {
            self.evict_expired(now_ms);
        }
    }
}
