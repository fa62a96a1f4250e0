//! Integration tests for Optica.
//!
//! These tests drive a running storefront over HTTP. They are `#[ignore]`d
//! by default.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the storefront with the fake OTP gateway and the seed catalog
//! AUTH_GATEWAY=fake CATALOG_SOURCE=static cargo run -p optica-storefront
//!
//! # Run integration tests
//! cargo test -p optica-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_BASE_URL` - Storefront under test (default `http://localhost:3000`)

use reqwest::Client;

/// Phone number the fake gateway knows as an existing customer.
pub const DEMO_PHONE: &str = "0901234567";

/// Base URL for the storefront (configurable via environment).
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// A client that keeps the session cookie across requests.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn session_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// The demo code rendered on the code step by the fake gateway.
///
/// The login page marks it as `data-demo-code="1234"`.
#[must_use]
pub fn extract_demo_code(html: &str) -> Option<String> {
    const MARKER: &str = "data-demo-code=\"";
    let start = html.find(MARKER)? + MARKER.len();
    let rest = html.get(start..)?;
    let end = rest.find('"')?;
    rest.get(..end).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_demo_code() {
        let html = r#"<p>Mã demo: <strong data-demo-code="4821">4821</strong></p>"#;
        assert_eq!(extract_demo_code(html).as_deref(), Some("4821"));
        assert_eq!(extract_demo_code("<p>no code</p>"), None);
    }
}
