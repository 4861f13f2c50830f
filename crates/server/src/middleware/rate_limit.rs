//! Rate limiting for write endpoints using governor and `tower_governor`.
//!
//! - `contact_rate_limiter`: contact form submissions (burst of 5, then 1 per 2 min)
//! - `review_rate_limiter`: review creation and image uploads (~20/min)
//! - `report_rate_limiter`: review reports (~10/min)
//!
//! Limiters are attached per handler, so reads are never throttled.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request, StatusCode, header};
use axum::response::{IntoResponse, Response};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

use crate::error::AppError;

/// Single-address proxy headers, checked after `X-Forwarded-For`.
const SINGLE_IP_HEADERS: [&str; 2] = ["x-real-ip", "fly-client-ip"];

fn header_ip(headers: &HeaderMap, name: &str) -> Option<IpAddr> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
}

/// Best-effort client address from proxy headers.
///
/// `X-Forwarded-For` is consulted after `CF-Connecting-IP` and before the
/// single-address headers; its first entry is the original client.
#[must_use]
pub fn client_ip_from_headers(headers: &HeaderMap) -> Option<IpAddr> {
    if let Some(ip) = header_ip(headers, "cf-connecting-ip") {
        return Some(ip);
    }

    if let Some(ip) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
    {
        return Some(ip);
    }

    SINGLE_IP_HEADERS
        .iter()
        .find_map(|name| header_ip(headers, name))
}

/// Key extractor: proxy headers first, then the socket peer address.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        client_ip_from_headers(req.headers())
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
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

fn limiter(replenish_secs: u64, burst: u32) -> Option<RateLimiterLayer> {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(replenish_secs)
        .burst_size(burst)
        .finish()?;
    Some(GovernorLayer::new(Arc::new(config)))
}

/// Contact form: 1 token every 2 minutes, burst of 5.
///
/// # Panics
///
/// Does not panic; the period and burst are positive constants, which
/// `GovernorConfigBuilder` always accepts.
#[must_use]
pub fn contact_rate_limiter() -> RateLimiterLayer {
    limiter(120, 5)
        .expect("contact rate limiter config with per_second(120) and burst_size(5) is valid")
}

/// Review creation and image uploads: 1 token every 3 seconds, burst of 10.
///
/// The per-user review cooldown is enforced separately.
///
/// # Panics
///
/// Does not panic; see [`contact_rate_limiter`].
#[must_use]
pub fn review_rate_limiter() -> RateLimiterLayer {
    limiter(3, 10)
        .expect("review rate limiter config with per_second(3) and burst_size(10) is valid")
}

/// Review reports: 1 token every 6 seconds, burst of 5.
///
/// # Panics
///
/// Does not panic; see [`contact_rate_limiter`].
#[must_use]
pub fn report_rate_limiter() -> RateLimiterLayer {
    limiter(6, 5).expect("report rate limiter config with per_second(6) and burst_size(5) is valid")
}

/// Rewrite the limiter's plain-text 429 into the API error body.
///
/// Use with [`axum::middleware::map_response`]. `Retry-After` and
/// `x-ratelimit-*` headers from the limiter are kept.
pub async fn json_rate_limit_response(response: Response) -> Response {
    if response.status() != StatusCode::TOO_MANY_REQUESTS {
        return response;
    }
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if is_json {
        return response;
    }

    let mut normalized = AppError::RateLimited.into_response();
    for (name, value) in response.headers() {
        if name == header::RETRY_AFTER || name.as_str().starts_with("x-ratelimit") {
            normalized.headers_mut().insert(name.clone(), value.clone());
        }
    }
    normalized
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::HeaderValue;
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    fn request(headers: &[(&'static str, &'static str)]) -> Request<()> {
        let mut builder = Request::builder();
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap()
    }

    #[test]
    fn test_cloudflare_header_first() {
        let req = request(&[
            ("x-forwarded-for", "10.0.0.1, 10.0.0.2"),
            ("cf-connecting-ip", "203.0.113.7"),
        ]);
        assert_eq!(
            ClientIpKeyExtractor.extract(&req).unwrap(),
            "203.0.113.7".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_forwarded_for_first_entry() {
        let req = request(&[("x-forwarded-for", "198.51.100.4, 10.0.0.2")]);
        assert_eq!(
            ClientIpKeyExtractor.extract(&req).unwrap(),
            "198.51.100.4".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_connect_info_fallback() {
        let mut req = request(&[]);
        let addr: SocketAddr = "192.0.2.9:5000".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        assert_eq!(ClientIpKeyExtractor.extract(&req).unwrap(), addr.ip());
    }

    #[test]
    fn test_no_address_is_an_error() {
        let req = request(&[("x-real-ip", "not an ip")]);
        assert!(ClientIpKeyExtractor.extract(&req).is_err());
    }

    #[test]
    fn test_limiters_build() {
        let _ = contact_rate_limiter();
        let _ = review_rate_limiter();
        let _ = report_rate_limiter();
    }

    #[tokio::test]
    async fn test_plain_429_becomes_json() {
        let mut plain =
            (StatusCode::TOO_MANY_REQUESTS, "Too Many Requests! Wait for 3s").into_response();
        plain
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from_static("3"));

        let response = json_rate_limit_response(plain).await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "3");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "rate_limited");
    }

    #[tokio::test]
    async fn test_other_responses_untouched() {
        let ok = Response::new(Body::from("fine"));
        assert_eq!(json_rate_limit_response(ok).await.status(), StatusCode::OK);
    }
}
