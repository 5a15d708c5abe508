//! HTTP middleware and server for the rate limited gateway.

mod middleware;
mod server;

pub use middleware::{enforce, headers, RateLimitState};
pub use server::HttpServer;
