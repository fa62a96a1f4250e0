//! Cart route handlers.
//!
//! The cart lives in the session and is only reachable when logged in, so
//! every line is priced at the member price.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use optica_core::{Price, ProductId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::catalog::{find_by_id, find_by_slug};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{Cart, CurrentCustomer, session_keys};
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub product_id: i32,
    pub slug: String,
    pub name: String,
    pub brand: String,
    pub quantity: u32,
    pub unit_price: Price,
    pub member_unit_price: Price,
    pub line_total: Price,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart.html")]
pub struct CartTemplate {
    pub customer: Option<CurrentCustomer>,
    pub items: Vec<CartItemView>,
    pub item_count: u32,
    pub subtotal: Price,
    pub member_savings: Price,
    pub total: Price,
    pub member_discount_percent: u8,
}

#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub slug: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: i32,
}

async fn load_cart(session: &Session) -> Result<Cart> {
    Ok(session
        .get::<Cart>(session_keys::CART)
        .await?
        .unwrap_or_default())
}

/// Display cart page.
#[instrument(skip_all, fields(customer_id = %customer.id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
) -> Result<CartTemplate> {
    let cart = load_cart(&session).await?;
    let products = state.catalog().products().await?;
    let discount = state.config().member_discount_percent;

    let mut items = Vec::with_capacity(cart.lines.len());
    let mut subtotal = Price::ZERO;
    for line in &cart.lines {
        // Lines for products that left the catalog are skipped
        let Some(product) = find_by_id(&products, line.product_id) else {
            tracing::warn!(product_id = %line.product_id, "Cart line for unknown product");
            continue;
        };
        let member_unit_price = product.price.member_price(discount);
        subtotal = subtotal + product.price.times(line.quantity);

        items.push(CartItemView {
            product_id: product.id.as_i32(),
            slug: product.slug.clone(),
            name: product.name.clone(),
            brand: product.brand.clone(),
            quantity: line.quantity,
            unit_price: product.price,
            member_unit_price,
            line_total: member_unit_price.times(line.quantity),
        });
    }
    let total: Price = items.iter().map(|i| i.line_total).sum();

    Ok(CartTemplate {
        item_count: items.iter().map(|i| i.quantity).sum(),
        items,
        subtotal,
        member_savings: subtotal.saturating_sub(total),
        total,
        member_discount_percent: discount,
        customer: Some(customer),
    })
}

/// Add item to cart.
#[instrument(skip_all, fields(slug = %form.slug))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let products = state.catalog().products().await?;
    let product = find_by_slug(&products, &form.slug)
        .ok_or_else(|| AppError::NotFound(format!("product '{}'", form.slug)))?;

    let mut cart = load_cart(&session).await?;
    cart.add(product.id, form.quantity);
    session.insert(session_keys::CART, &cart).await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("slug", product.slug.as_str())]),
    );
    tracing::info!(customer_id = %customer.id, product_id = %product.id, "Added to cart");
    Ok(Redirect::to("/cart").into_response())
}

/// Remove item from cart.
#[instrument(skip_all)]
pub async fn remove(
    session: Session,
    RequireAuth(_): RequireAuth,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let mut cart = load_cart(&session).await?;
    if cart.remove(ProductId::new(form.product_id)) {
        session.insert(session_keys::CART, &cart).await?;
    }
    Ok(Redirect::to("/cart").into_response())
}
