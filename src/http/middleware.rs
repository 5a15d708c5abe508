//! Rate limiting middleware.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::trace;

use crate::ratelimit::{now_unix_ms, KeyExtractor, QuotaBackend, QuotaDecision, RateLimiter};

/// Quota telemetry header names.
pub mod headers {
    /// Maximum requests allowed in the window.
    pub const LIMIT: &str = "x-ratelimit-limit";
    /// Remaining requests in the current window.
    pub const REMAINING: &str = "x-ratelimit-remaining";
    /// Unix seconds at which the window resets.
    pub const RESET: &str = "x-ratelimit-reset";
    /// Seconds to wait before retrying (on 429 only).
    pub const RETRY_AFTER: &str = "retry-after";
}

/// Shared state for the rate limiting middleware.
///
/// Holds the quota backend and the key derivation strategy. Construct one
/// per limiter instance; sharing a state between routers shares its quota,
/// which is only appropriate when intentionally injected.
#[derive(Clone)]
pub struct RateLimitState {
    /// The quota backend charged on every request
    backend: Arc<dyn QuotaBackend>,
    /// Key derivation strategy
    extractor: KeyExtractor,
}

impl RateLimitState {
    /// Create middleware state backed by an in-process rate limiter.
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self {
            backend: limiter,
            extractor: KeyExtractor::default(),
        }
    }

    /// Create middleware state over an arbitrary quota backend.
    pub fn with_backend(backend: Arc<dyn QuotaBackend>) -> Self {
        Self {
            backend,
            extractor: KeyExtractor::default(),
        }
    }

    /// Replace the default key derivation strategy.
    pub fn with_extractor(mut self, extractor: KeyExtractor) -> Self {
        self.extractor = extractor;
        self
    }
}

/// Middleware entry point: derive the limiter key, charge the quota, and
/// either forward the request or short-circuit with a 429.
///
/// The quota is charged exactly once per invocation, rejected requests
/// included, and the three telemetry headers are attached to every response
/// regardless of the decision.
pub async fn enforce(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    let key = state.extractor.derive(&request);
    let now_ms = now_unix_ms();
    let decision = state.backend.check(&key, now_ms);

    trace!(
        key = %key,
        allowed = decision.allowed,
        remaining = decision.remaining,
        "Rate limit decision"
    );

    if !decision.allowed {
        return reject(&decision, now_ms);
    }

    let mut response = next.run(request).await;
    annotate(response.headers_mut(), &decision);
    response
}

/// Build the 429 short-circuit response.
fn reject(decision: &QuotaDecision, now_ms: u64) -> Response {
    let retry_after = decision
        .reset_unix_secs
        .saturating_sub(now_ms / 1000)
        .max(1);

    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({ "message": "Too many requests" })),
    )
        .into_response();

    annotate(response.headers_mut(), decision);
    response
        .headers_mut()
        .insert(headers::RETRY_AFTER, HeaderValue::from(retry_after));
    response
}

/// Attach the quota telemetry headers.
fn annotate(headers: &mut HeaderMap, decision: &QuotaDecision) {
    headers.insert(headers::LIMIT, HeaderValue::from(decision.limit));
    headers.insert(headers::REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(headers::RESET, HeaderValue::from(decision.reset_unix_secs));
}
