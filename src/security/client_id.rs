//! Client identity used to key rate limits and stamp submissions.

use std::net::SocketAddr;

use axum::http::HeaderMap;

pub const UNKNOWN_CLIENT: &str = "unknown";

/// Pick the identifier for the client behind a request.
///
/// Order: first `X-Forwarded-For` entry (when trusted), then the transport
/// peer address, then [`UNKNOWN_CLIENT`]. Unidentified clients share the
/// sentinel and therefore share a rate-limit window.
pub fn resolve_client_id(headers: &HeaderMap, peer: Option<SocketAddr>, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(client) = forwarded {
            return client.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> Option<SocketAddr> {
        Some("10.0.0.7:5123".parse().unwrap())
    }

    #[test]
    fn test_forwarded_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(" 203.0.113.9 , 10.0.0.1"));
        assert_eq!(resolve_client_id(&headers, peer(), true), "203.0.113.9");
        assert_eq!(resolve_client_id(&headers, peer(), false), "10.0.0.7");
    }

    #[test]
    fn test_fallbacks() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(" , "));
        assert_eq!(resolve_client_id(&headers, peer(), true), "10.0.0.7");
        assert_eq!(resolve_client_id(&HeaderMap::new(), None, true), UNKNOWN_CLIENT);
    }
}
