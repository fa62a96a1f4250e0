//! In-process HTTP tests for the storefront router.
//!
//! Each test builds the full [`optica_storefront::app`] with the seed catalog,
//! a fake gateway that always sends `4321`, and in-memory voucher storage.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use optica_core::OtpCode;
use optica_storefront::catalog::StaticCatalog;
use optica_storefront::config::StorefrontConfig;
use optica_storefront::gateway::{DEMO_CUSTOMER_PHONE, FakeGateway};
use optica_storefront::state::AppState;
use optica_storefront::vouchers::InMemoryVoucherStore;
use tower::ServiceExt;

const CODE: &str = "4321";

/// A browser: one router plus the session cookie it was handed.
struct Browser {
    app: Router,
    cookie: Option<String>,
}

struct Page {
    status: StatusCode,
    location: Option<String>,
    body: String,
}

impl Browser {
    fn new() -> Self {
        let state = AppState::from_parts(
            StorefrontConfig::local(),
            None,
            Arc::new(StaticCatalog::seeded().unwrap()),
            Arc::new(FakeGateway::with_fixed_code(OtpCode::parse(CODE).unwrap())),
            Arc::new(InMemoryVoucherStore::new()),
        );
        Self {
            app: optica_storefront::app(state),
            cookie: None,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> Page {
        let response = self.app.clone().oneshot(request).await.unwrap();
        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        Page {
            status,
            location,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            // The OTP rate limiter keys on the client address
            .header("x-forwarded-for", "203.0.113.10");
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder
    }

    async fn get(&mut self, uri: &str) -> Page {
        let request = self.request("GET", uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    async fn post(&mut self, uri: &str, form: &[(&str, &str)]) -> Page {
        let body = form
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let request = self
            .request("POST", uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Log in as the demo customer, returning the final redirect.
    async fn log_in(&mut self, next: &str) -> Page {
        let open = format!("/auth/open?next={}", urlencoding::encode(next));
        assert_eq!(self.get(&open).await.location.as_deref(), Some("/auth/login"));
        self.post("/auth/phone", &[("phone", DEMO_CUSTOMER_PHONE)]).await;
        self.post("/auth/otp", &[("code", CODE)]).await
    }
}

#[tokio::test]
async fn test_health() {
    let mut browser = Browser::new();
    assert_eq!(browser.get("/health").await.status, StatusCode::OK);
    assert_eq!(browser.get("/health/ready").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_member_pages_open_the_gate() {
    let mut browser = Browser::new();

    let page = browser.get("/cart").await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(page.location.as_deref(), Some("/auth/open?next=%2Fcart"));

    let page = browser.get("/vouchers").await;
    assert_eq!(
        page.location.as_deref(),
        Some("/auth/open?next=%2Fvouchers")
    );
}

#[tokio::test]
async fn test_login_with_wrong_then_right_code() {
    let mut browser = Browser::new();

    browser.get("/auth/open?next=%2Fvouchers").await;
    let page = browser.get("/auth/login").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains(r#"data-step="collecting_phone""#));

    let page = browser
        .post("/auth/phone", &[("phone", "0901 234 567")])
        .await;
    assert_eq!(page.location.as_deref(), Some("/auth/login"));
    let page = browser.get("/auth/login").await;
    assert!(page.body.contains(r#"data-step="awaiting_otp""#));
    assert!(page.body.contains(r#"data-demo-code="4321""#));

    browser.post("/auth/otp", &[("code", "1111")]).await;
    let page = browser.get("/auth/login").await;
    assert!(page.body.contains("OTP không chính xác"));

    // The error is shown once
    let page = browser.get("/auth/login").await;
    assert!(!page.body.contains("OTP không chính xác"));

    let page = browser.post("/auth/otp", &[("code", CODE)]).await;
    assert_eq!(page.location.as_deref(), Some("/vouchers"));

    let page = browser.get("/account").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Nguyễn Minh Anh"));
}

#[tokio::test]
async fn test_invalid_phone_is_reported_on_the_phone_step() {
    let mut browser = Browser::new();
    browser.get("/auth/open").await;

    browser.post("/auth/phone", &[("phone", "12345")]).await;
    let page = browser.get("/auth/login").await;
    assert!(page.body.contains(r#"data-step="collecting_phone""#));
    assert!(page.body.contains("form-error"));
}

#[tokio::test]
async fn test_resend_during_cooldown_is_refused() {
    let mut browser = Browser::new();
    browser.get("/auth/open").await;
    browser
        .post("/auth/phone", &[("phone", DEMO_CUSTOMER_PHONE)])
        .await;

    let page = browser.post("/auth/resend", &[]).await;
    assert_eq!(page.location.as_deref(), Some("/auth/login"));
    let page = browser.get("/auth/login").await;
    assert!(page.body.contains(r#"data-step="awaiting_otp""#));
    assert!(page.body.contains("disabled"));
}

#[tokio::test]
async fn test_cancel_drops_the_gate() {
    let mut browser = Browser::new();
    browser.get("/auth/open").await;
    browser
        .post("/auth/phone", &[("phone", DEMO_CUSTOMER_PHONE)])
        .await;

    let page = browser.post("/auth/cancel", &[]).await;
    assert_eq!(page.location.as_deref(), Some("/"));

    // A late code submission has no gate to land on
    let page = browser.post("/auth/otp", &[("code", CODE)]).await;
    assert_eq!(page.location.as_deref(), Some("/auth/open"));
    let page = browser.get("/account").await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_new_phone_registers() {
    let mut browser = Browser::new();
    browser.get("/auth/open").await;
    browser.post("/auth/phone", &[("phone", "0912345678")]).await;

    let page = browser.post("/auth/otp", &[("code", CODE)]).await;
    assert_eq!(page.location.as_deref(), Some("/auth/register"));

    let page = browser.get("/auth/register").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("0912 345 678"));

    let page = browser
        .post("/auth/register", &[("full_name", "  "), ("email", "not-an-email")])
        .await;
    assert_eq!(page.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(page.body.contains("Vui lòng nhập họ tên"));
    assert!(page.body.contains("Email không hợp lệ"));

    let page = browser
        .post(
            "/auth/register",
            &[("full_name", "Lê Thu Hà"), ("email", "ha@example.com")],
        )
        .await;
    assert_eq!(page.location.as_deref(), Some("/account"));

    let page = browser.get("/account").await;
    assert!(page.body.contains("Lê Thu Hà"));
    assert!(page.body.contains("ha@example.com"));
}

#[tokio::test]
async fn test_logout_clears_the_customer() {
    let mut browser = Browser::new();
    browser.log_in("/account").await;
    assert_eq!(browser.get("/account").await.status, StatusCode::OK);

    let page = browser.post("/auth/logout", &[]).await;
    assert_eq!(page.location.as_deref(), Some("/"));
    assert_eq!(browser.get("/account").await.status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_product_pages() {
    let mut browser = Browser::new();

    let page = browser.get("/products?category=sunglasses&sort=price-asc").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Xóa tất cả") || page.body.contains("bộ lọc"));

    let page = browser.get("/products/ray-ban-rb5154-clubmaster").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Đăng nhập để xem giá thành viên"));

    let page = browser.get("/products/no-such-frame").await;
    assert_eq!(page.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_catalog_json() {
    let mut browser = Browser::new();
    let page = browser.get("/api/products?category=sunglasses").await;
    assert_eq!(page.status, StatusCode::OK);

    let view: serde_json::Value = serde_json::from_str(&page.body).unwrap();
    let items = view["items"].as_array().unwrap();
    assert!(!items.is_empty());
    assert!(items.iter().all(|p| p["category"] == "sunglasses"));
    assert_eq!(view["summary"]["active_count"], 1);
}

#[tokio::test]
async fn test_member_price_after_login() {
    let mut browser = Browser::new();
    browser.log_in("/products/ray-ban-rb5154-clubmaster").await;

    let page = browser.get("/products/ray-ban-rb5154-clubmaster").await;
    assert!(page.body.contains("Giá thành viên"));
    assert!(page.body.contains("Thêm vào giỏ"));
}

#[tokio::test]
async fn test_cart_add_and_remove() {
    let mut browser = Browser::new();
    browser.log_in("/cart").await;

    let page = browser
        .post(
            "/cart/add",
            &[("slug", "ray-ban-rb5154-clubmaster"), ("quantity", "2")],
        )
        .await;
    assert_eq!(page.location.as_deref(), Some("/cart"));

    let page = browser.get("/cart").await;
    assert!(page.body.contains("Giỏ hàng (2)"));

    let page = browser
        .post("/cart/add", &[("slug", "no-such-frame")])
        .await;
    assert_eq!(page.status, StatusCode::NOT_FOUND);

    browser.post("/cart/remove", &[("product_id", "1")]).await;
    let page = browser.get("/cart").await;
    assert!(page.body.contains("Giỏ hàng đang trống"));
}

#[tokio::test]
async fn test_voucher_claim_is_idempotent() {
    let mut browser = Browser::new();
    browser.log_in("/vouchers").await;

    let first = browser.post("/vouchers/WELCOME50K/claim", &[]).await;
    assert_eq!(
        first.location.as_deref(),
        Some("/vouchers?claimed=WELCOME50K")
    );
    browser.post("/vouchers/WELCOME50K/claim", &[]).await;

    let page = browser.get("/vouchers").await;
    assert_eq!(page.body.matches("data-voucher-code=").count(), 1);
    assert!(page.body.contains("data-voucher-code=\"WELCOME"));
}

#[tokio::test]
async fn test_refused_claims_render_inline() {
    let mut browser = Browser::new();
    browser.log_in("/vouchers").await;

    let page = browser.post("/vouchers/TET2026/claim", &[]).await;
    assert_eq!(page.status, StatusCode::GONE);
    assert!(page.body.contains("Chương trình đã kết thúc ngày 28/02/2026"));

    let page = browser.post("/vouchers/tet2026/claim", &[]).await;
    assert_eq!(page.status, StatusCode::GONE);
    assert!(page.body.contains("Chương trình đã kết thúc ngày 28/02/2026"));

    let page = browser.post("/vouchers/NOPE/claim", &[]).await;
    assert_eq!(page.status, StatusCode::NOT_FOUND);
    assert!(page.body.contains("Chương trình ưu đãi không tồn tại"));
}

#[tokio::test]
async fn test_trade_in_validation_and_confirmation() {
    let mut browser = Browser::new();

    let page = browser
        .get("/trade-in?desired=ray-ban-rb5154-clubmaster")
        .await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(
        page.body
            .contains(r#"value="ray-ban-rb5154-clubmaster" selected"#)
    );

    let page = browser.post("/trade-in", &[("full_name", "")]).await;
    assert_eq!(page.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(page.body.contains("Vui lòng nhập họ tên"));
    assert!(page.body.contains("Vui lòng chọn tình trạng"));

    let page = browser
        .post(
            "/trade-in",
            &[
                ("full_name", "Trần Văn Bình"),
                ("phone", "0912345678"),
                ("old_brand", "Rayban"),
                ("old_category", "sunglasses"),
                ("old_description", "Kính mát gọng kim loại, trầy nhẹ"),
                ("condition", "good"),
                ("desired_product", ""),
                ("note", ""),
            ],
        )
        .await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    let confirmation = page.location.unwrap();

    let page = browser.get(&confirmation).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Trần Văn Bình"));
    assert!(page.body.contains("700.000₫"));

    // Another browser cannot read the request
    let mut stranger = Browser {
        app: browser.app.clone(),
        cookie: None,
    };
    assert_eq!(
        stranger.get(&confirmation).await.status,
        StatusCode::NOT_FOUND
    );
}
