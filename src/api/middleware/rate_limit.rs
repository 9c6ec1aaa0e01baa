//! Rate limiting middleware using token bucket algorithm.

use std::net::IpAddr;
use std::sync::Arc;

use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{
    GovernorError, GovernorLayer,
    governor::GovernorConfigBuilder,
    key_extractor::{KeyExtractor, PeerIpKeyExtractor, SmartIpKeyExtractor},
};

/// Per-client-IP key extractor.
///
/// Uses the socket peer address by default. Behind a trusted reverse proxy
/// the peer is the proxy itself, so `X-Forwarded-For` / `X-Real-IP` /
/// `Forwarded` are read instead.
#[derive(Debug, Clone, Copy)]
pub struct ClientIpKeyExtractor {
    behind_proxy: bool,
}

impl ClientIpKeyExtractor {
    pub fn new(behind_proxy: bool) -> Self {
        Self { behind_proxy }
    }
}

impl KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        if self.behind_proxy {
            SmartIpKeyExtractor.extract(req)
        } else {
            PeerIpKeyExtractor.extract(req)
        }
    }
}

pub type RateLimitLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

fn build(behind_proxy: bool, per_second: u64, burst_size: u32) -> RateLimitLayer {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(ClientIpKeyExtractor::new(behind_proxy))
            .per_second(per_second)
            .burst_size(burst_size)
            .finish()
            .expect("rate limit quota must be non-zero"),
    );

    GovernorLayer::new(governor_conf)
}

/// Creates a rate limiter for read endpoints.
///
/// # Limits
///
/// - **Rate**: 2 requests per second
/// - **Burst**: 100 requests
///
/// Requests exceeding the limit receive `429 Too Many Requests`.
pub fn layer(behind_proxy: bool) -> RateLimitLayer {
    build(behind_proxy, 2, 100)
}

/// Creates a stricter rate limiter for mutating endpoints.
///
/// # Limits
///
/// - **Rate**: 1 request per second
/// - **Burst**: 10 requests
///
/// Used for registration, credit top-ups, link mutations and payments.
pub fn secure_layer(behind_proxy: bool) -> RateLimitLayer {
    build(behind_proxy, 1, 10)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::ConnectInfo;
    use std::net::SocketAddr;

    fn request(peer: &str, forwarded_for: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/api/health");
        if let Some(ip) = forwarded_for {
            builder = builder.header("x-forwarded-for", ip);
        }
        let mut req = builder.body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(peer.parse::<SocketAddr>().unwrap()));
        req
    }

    #[test]
    fn test_direct_uses_peer_address() {
        let req = request("10.0.0.1:5000", Some("203.0.113.7"));
        let ip = ClientIpKeyExtractor::new(false).extract(&req).unwrap();

        assert_eq!(ip, "10.0.0.1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_behind_proxy_uses_forwarded_header() {
        let req = request("10.0.0.1:5000", Some("203.0.113.7"));
        let ip = ClientIpKeyExtractor::new(true).extract(&req).unwrap();

        assert_eq!(ip, "203.0.113.7".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_behind_proxy_falls_back_to_peer() {
        let req = request("10.0.0.1:5000", None);
        let ip = ClientIpKeyExtractor::new(true).extract(&req).unwrap();

        assert_eq!(ip, "10.0.0.1".parse::<IpAddr>().unwrap());
    }
}
