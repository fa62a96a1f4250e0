//! Rate limiting middleware using governor and `tower_governor`.
//!
//! Only the OTP endpoints are limited: every hit there costs an SMS or a
//! guess at a four-digit code.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Client IP from reverse-proxy headers.
///
/// Checks `CF-Connecting-IP`, then the first `X-Forwarded-For` hop, then
/// `X-Real-IP`, then the peer address when the server records it.
#[derive(Clone, Copy)]
pub struct ProxyIpKeyExtractor;

const IP_HEADERS: &[&str] = &["cf-connecting-ip", "x-forwarded-for", "x-real-ip"];

impl tower_governor::key_extractor::KeyExtractor for ProxyIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let headers = req.headers();
        IP_HEADERS
            .iter()
            .filter_map(|name| headers.get(*name))
            .filter_map(|v| v.to_str().ok())
            .filter_map(|s| s.split(',').next())
            .find_map(|s| s.trim().parse::<IpAddr>().ok())
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ProxyIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for OTP endpoints: ~15 requests per minute per IP.
///
/// Configuration: 1 request every 4 seconds (replenish), burst of 8. Enough
/// for a phone submit, a few wrong codes and a resend.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers (`per_second(4)` and `burst_size(8)`), which are always accepted
/// by `GovernorConfigBuilder`.
#[must_use]
pub fn otp_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ProxyIpKeyExtractor)
        .per_second(4)
        .burst_size(8)
        .finish()
        .expect("rate limiter config with per_second(4) and burst_size(8) is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    fn request(headers: &[(&str, &str)]) -> Request<()> {
        let mut builder = Request::builder().uri("/auth/phone");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap()
    }

    #[test]
    fn test_prefers_cloudflare_header() {
        let req = request(&[
            ("x-forwarded-for", "10.0.0.1"),
            ("cf-connecting-ip", "203.0.113.7"),
        ]);
        assert_eq!(
            ProxyIpKeyExtractor.extract(&req).unwrap(),
            "203.0.113.7".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_first_forwarded_hop() {
        let req = request(&[("x-forwarded-for", "198.51.100.2, 10.0.0.1")]);
        assert_eq!(
            ProxyIpKeyExtractor.extract(&req).unwrap(),
            "198.51.100.2".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_falls_back_to_peer_address() {
        let mut req = request(&[]);
        req.extensions_mut()
            .insert(ConnectInfo("192.0.2.9:51000".parse::<SocketAddr>().unwrap()));
        assert_eq!(
            ProxyIpKeyExtractor.extract(&req).unwrap(),
            "192.0.2.9".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_no_headers() {
        assert!(ProxyIpKeyExtractor.extract(&request(&[])).is_err());
    }
}
