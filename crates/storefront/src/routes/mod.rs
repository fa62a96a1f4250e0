//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (hot deals, new arrivals)
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness
//!
//! # Products
//! GET  /products               - Product listing (filters in the query string)
//! GET  /products/{slug}        - Product detail (member price when logged in)
//! GET  /api/products           - JSON catalog view, same query parameters
//!
//! # Auth (phone + OTP)
//! GET  /auth/open              - Open the gate (?next=&prompt=), then /auth/login
//! GET  /auth/login             - Gate view: phone or code step
//! POST /auth/phone             - Submit phone number
//! POST /auth/otp               - Submit code
//! POST /auth/resend            - Send a new code once the cooldown is over
//! POST /auth/cancel            - Close the gate
//! GET  /auth/register          - Registration form for a verified new phone
//! POST /auth/register          - Register and log in
//! POST /auth/logout            - Logout
//!
//! # Requires login (otherwise redirected through /auth/open)
//! GET  /account                - Profile
//! GET  /cart                   - Cart
//! POST /cart/add               - Add a product
//! POST /cart/remove            - Remove a line
//! GET  /vouchers               - Voucher programs and claimed codes
//! POST /vouchers/{program}/claim - Claim a voucher
//!
//! # Trade-in
//! GET  /trade-in               - Trade-in form
//! POST /trade-in               - Submit a trade-in request
//! GET  /trade-in/{id}          - Confirmation for this browser's last request
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod home;
pub mod products;
pub mod trade_in;
pub mod vouchers;

use axum::{
    Router,
    routing::{get, post},
};
use crate::middleware::otp_rate_limiter;
use crate::state::AppState;

/// Create the auth routes router.
///
/// Endpoints that send or check a code are rate limited.
pub fn auth_routes() -> Router<AppState> {
    let otp = Router::new()
        .route("/phone", post(auth::submit_phone))
        .route("/otp", post(auth::submit_otp))
        .route("/resend", post(auth::resend))
        .layer(otp_rate_limiter());

    Router::new()
        .route("/open", get(auth::open))
        .route("/login", get(auth::login_page))
        .route("/cancel", post(auth::cancel))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
        .merge(otp)
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{slug}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/remove", post(cart::remove))
}

/// Create the voucher routes router.
pub fn voucher_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(vouchers::index))
        .route("/{program}/claim", post(vouchers::claim))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .route("/api/products", get(products::api_index))
        .nest("/auth", auth_routes())
        .route("/account", get(account::index))
        .nest("/cart", cart_routes())
        .nest("/vouchers", voucher_routes())
        .route("/trade-in", get(trade_in::form).post(trade_in::submit))
        .route("/trade-in/{id}", get(trade_in::show))
}
