//! HTTP middleware stack for the Muhan API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span with method, path, status, latency)
//! 3. Request ID (`x-request-id`, recorded on the span)
//! 4. CORS
//! 5. Rate-limit response normalizer (plain 429 → JSON error body)
//! 6. Per-handler rate limiting on write endpoints (governor)
//!
//! Authentication is not a layer: handlers opt in through the
//! [`RequireUser`], [`OptionalUser`] and [`RequireAdmin`] extractors.

pub mod auth;
pub mod rate_limit;
pub mod request_id;

pub use auth::{OptionalUser, RequireAdmin, RequireUser};
pub use rate_limit::{
    contact_rate_limiter, json_rate_limit_response, report_rate_limiter, review_rate_limiter,
};
pub use request_id::request_id_middleware;
