//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with in-memory store)
//! 5. Rate limiting on the OTP endpoints (governor)

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use auth::{
    OptionalAuth, RequireAuth, clear_current_customer, open_auth_href, set_current_customer,
};
pub use rate_limit::otp_rate_limiter;
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
