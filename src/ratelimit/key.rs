//! Limiter key derivation.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request};

/// Strategy for deriving the limiter key from an inbound request.
///
/// Requests that share a key share one quota. The default strategy keys on
/// the caller address plus the request route; the route is the URI path
/// only, never the raw URL, so query-string variation cannot be used to
/// evade the quota or blow up the key space.
#[derive(Clone, Default)]
pub enum KeyExtractor {
    /// Caller network address joined with the request route (default)
    #[default]
    PeerAndRoute,
    /// The value of a named request header, e.g. an API key
    Header(String),
    /// One shared key for every request
    Global,
    /// Caller-supplied derivation function
    Custom(Arc<dyn Fn(&Request) -> String + Send + Sync>),
}

impl KeyExtractor {
    /// Derive the limiter key for a request.
    pub fn derive(&self, request: &Request) -> String {
        match self {
            KeyExtractor::PeerAndRoute => {
                format!("{}:{}", peer_addr(request), request.uri().path())
            }
            KeyExtractor::Header(name) => request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("anonymous")
                .to_string(),
            KeyExtractor::Global => "global".to_string(),
            KeyExtractor::Custom(f) => f(request),
        }
    }
}

impl std::fmt::Debug for KeyExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PeerAndRoute => write!(f, "KeyExtractor::PeerAndRoute"),
            Self::Header(name) => f.debug_tuple("KeyExtractor::Header").field(name).finish(),
            Self::Global => write!(f, "KeyExtractor::Global"),
            Self::Custom(_) => write!(f, "KeyExtractor::Custom(<fn>)"),
        }
    }
}

/// Client address as seen by the listener, falling back to the first
/// `x-forwarded-for` entry when no connection info extension is present.
fn peer_addr(request: &Request) -> String {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    if let Some(forwarded) = request.headers().get("x-forwarded-for") {
        if let Ok(value) = forwarded.to_str() {
            if let Some(first) = value.split(',').next() {
                let first = first.trim();
                if !first.is_empty() {
                    return first.to_string();
                }
            }
        }
    }

    "unknown".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(uri: &str) -> Request {
        axum::http::Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn request_with_header(uri: &str, name: &str, value: &str) -> Request {
        axum::http::Request::builder()
            .uri(uri)
            .header(name, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_peer_and_route_from_connect_info() {
        let mut req = request("/api/x");
        let addr: SocketAddr = "1.2.3.4:55555".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));

        let key = KeyExtractor::PeerAndRoute.derive(&req);
        assert_eq!(key, "1.2.3.4:/api/x");
    }

    #[test]
    fn test_peer_and_route_falls_back_to_forwarded_for() {
        let req = request_with_header("/api/x", "x-forwarded-for", "5.6.7.8, 10.0.0.1");
        let key = KeyExtractor::PeerAndRoute.derive(&req);
        assert_eq!(key, "5.6.7.8:/api/x");
    }

    #[test]
    fn test_peer_and_route_without_address() {
        let req = request("/api/x");
        let key = KeyExtractor::PeerAndRoute.derive(&req);
        assert_eq!(key, "unknown:/api/x");
    }

    #[test]
    fn test_query_string_is_stripped() {
        let req = request_with_header("/api/x?page=1&cb=123", "x-forwarded-for", "1.2.3.4");
        let other = request_with_header("/api/x?page=2&cb=456", "x-forwarded-for", "1.2.3.4");

        let extractor = KeyExtractor::PeerAndRoute;
        assert_eq!(extractor.derive(&req), extractor.derive(&other));
        assert_eq!(extractor.derive(&req), "1.2.3.4:/api/x");
    }

    #[test]
    fn test_header_strategy() {
        let req = request_with_header("/api/x", "x-api-key", "secret-key");
        let key = KeyExtractor::Header("x-api-key".to_string()).derive(&req);
        assert_eq!(key, "secret-key");
    }

    #[test]
    fn test_header_strategy_missing_header() {
        let req = request("/api/x");
        let key = KeyExtractor::Header("x-api-key".to_string()).derive(&req);
        assert_eq!(key, "anonymous");
    }

    #[test]
    fn test_global_strategy() {
        let req = request("/anything");
        assert_eq!(KeyExtractor::Global.derive(&req), "global");
    }

    #[test]
    fn test_custom_strategy() {
        let req = request("/api/x");
        let extractor = KeyExtractor::Custom(Arc::new(|req: &Request| {
            format!("custom:{}", req.uri().path())
        }));
        assert_eq!(extractor.derive(&req), "custom:/api/x");
    }
}
