//! Rate limiting logic and state management.

mod backend;
mod key;
mod limiter;
mod store;
mod window;

pub use backend::{QuotaBackend, QuotaDecision};
pub use key::KeyExtractor;
pub use limiter::RateLimiter;
pub use store::WindowStore;
pub use window::WindowEntry;

/// Current wall-clock time as milliseconds since the Unix epoch.
pub fn now_unix_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}
