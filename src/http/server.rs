//! HTTP server implementation.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{middleware, routing::get, Json, Router};
use serde_json::json;
use tracing::{error, info};

use crate::error::Result;
use crate::ratelimit::{KeyExtractor, RateLimiter};

use super::middleware::{enforce, RateLimitState};

/// HTTP server hosting the rate limited gateway routes.
pub struct HttpServer {
    /// Address to bind to
    addr: SocketAddr,
    /// The rate limiter instance
    limiter: Arc<RateLimiter>,
    /// Key derivation strategy for the middleware
    extractor: KeyExtractor,
}

impl HttpServer {
    /// Create a new HTTP server guarded by the given rate limiter.
    pub fn new(addr: SocketAddr, limiter: Arc<RateLimiter>) -> Self {
        Self {
            addr,
            limiter,
            extractor: KeyExtractor::default(),
        }
    }

    /// Replace the default key derivation strategy.
    pub fn with_extractor(mut self, extractor: KeyExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    fn router(&self) -> Router {
        let state = RateLimitState::new(self.limiter.clone())
            .with_extractor(self.extractor.clone());

        let guarded = Router::new()
            .route("/", get(index))
            .layer(middleware::from_fn_with_state(state, enforce));

        // Health checks are served outside the quota
        Router::new().route("/healthz", get(healthz)).merge(guarded)
    }

    /// Start the HTTP server.
    ///
    /// This method will block until the server is shut down.
    pub async fn serve(self) -> Result<()> {
        let addr = self.addr;
        let router = self.router();

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .map_err(|e| {
            error!(error = %e, "HTTP server failed");
            e.into()
        })
    }

    /// Start the HTTP server with graceful shutdown.
    ///
    /// The server will shut down when the provided signal resolves.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr = self.addr;
        let router = self.router();

        info!(addr = %addr, "Starting HTTP server with graceful shutdown");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(signal)
        .await
        .map_err(|e| {
            error!(error = %e, "HTTP server failed");
            e.into()
        })
    }
}

async fn index() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}
