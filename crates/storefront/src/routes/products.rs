//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use optica_core::{Price, Product};
use serde::Serialize;
use tracing::instrument;

use crate::catalog::{
    BrowseQuery, CatalogBrowser, ChipLink, Facet, FacetOption, engine, find_by_slug,
};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{OptionalAuth, open_auth_href};
use crate::models::CurrentCustomer;
use crate::state::AppState;

/// Related products shown under the detail view.
const RELATED_LEN: usize = 4;

/// Product display data for templates.
#[derive(Debug, Clone, Serialize)]
pub struct ProductCard {
    pub id: i32,
    pub slug: String,
    pub name: String,
    pub brand: String,
    pub category: &'static str,
    pub price: Price,
    pub original_price: Option<Price>,
    pub discount_percent: Option<u8>,
    /// Present only for logged-in customers.
    pub member_price: Option<Price>,
    pub rating: String,
    pub review_count: u32,
    pub is_new: bool,
    pub is_hot_deal: bool,
    pub is_on_sale: bool,
}

impl ProductCard {
    /// `member_discount` is the member percentage when a customer is logged in.
    #[must_use]
    pub fn new(product: &Product, member_discount: Option<u8>) -> Self {
        Self {
            id: product.id.as_i32(),
            slug: product.slug.clone(),
            name: product.name.clone(),
            brand: product.brand.clone(),
            category: product.category.label(),
            price: product.price,
            original_price: product.original_price,
            discount_percent: product.discount_percent(),
            member_price: member_discount.map(|pct| product.price.member_price(pct)),
            rating: format!("{:.1}", product.rating),
            review_count: product.review_count,
            is_new: product.is_new,
            is_hot_deal: product.is_hot_deal,
            is_on_sale: product.is_on_sale,
        }
    }
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub customer: Option<CurrentCustomer>,
    pub products: Vec<ProductCard>,
    pub total: usize,
    pub shown: usize,
    pub load_more_href: Option<String>,
    pub clear_all_href: String,
    pub chips: Vec<ChipLink>,
    pub active_count: usize,
    pub show_clear_all: bool,
    pub facets: Vec<Facet>,
    pub sort_options: Vec<FacetOption>,
}

/// Detail attributes shown as a definition list.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub label: &'static str,
    pub value: String,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub customer: Option<CurrentCustomer>,
    pub product: ProductCard,
    pub description: Option<String>,
    pub attributes: Vec<Attribute>,
    pub features: Vec<String>,
    pub colors: Vec<String>,
    pub member_discount_percent: u8,
    /// Opens the auth gate and returns here; shown to guests.
    pub login_href: String,
    pub trade_in_href: String,
    pub related: Vec<ProductCard>,
}

fn member_discount(state: &AppState, customer: Option<&CurrentCustomer>) -> Option<u8> {
    customer.map(|_| state.config().member_discount_percent)
}

/// Display product listing page.
#[instrument(skip(state, customer))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(customer): OptionalAuth,
    Query(query): Query<BrowseQuery>,
) -> Result<ProductsIndexTemplate> {
    let products = state.catalog().products().await?;
    let browser = CatalogBrowser::from_query(&query, engine::price_ceiling(&products));
    let view = browser.view(&products);
    let discount = member_discount(&state, customer.as_ref());

    tracing::debug!(total = view.total, shown = view.shown, "Catalog listing");

    Ok(ProductsIndexTemplate {
        products: view
            .items
            .iter()
            .map(|p| ProductCard::new(p, discount))
            .collect(),
        total: view.total,
        shown: view.shown,
        load_more_href: view.load_more_href,
        clear_all_href: view.clear_all_href,
        chips: view.chips,
        active_count: view.summary.active_count,
        show_clear_all: view.summary.show_clear_all,
        facets: browser.facets(&engine::brands(&products)),
        sort_options: browser.sort_options(),
        customer,
    })
}

/// JSON catalog view for the listing query parameters.
#[instrument(skip(state))]
pub async fn api_index(
    State(state): State<AppState>,
    Query(query): Query<BrowseQuery>,
) -> Result<Response> {
    let products = state.catalog().products().await?;
    let browser = CatalogBrowser::from_query(&query, engine::price_ceiling(&products));
    Ok(Json(browser.view(&products)).into_response())
}

/// Display product detail page.
#[instrument(skip(state, customer))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(customer): OptionalAuth,
    Path(slug): Path<String>,
) -> Result<ProductShowTemplate> {
    let products = state.catalog().products().await?;
    let product = find_by_slug(&products, &slug)
        .ok_or_else(|| AppError::NotFound(format!("product '{slug}'")))?;
    let discount = member_discount(&state, customer.as_ref());

    add_breadcrumb(
        "navigation",
        "Viewed product page",
        Some(&[("slug", product.slug.as_str())]),
    );

    let mut attributes = vec![
        Attribute {
            label: "Thương hiệu",
            value: product.brand.clone(),
        },
        Attribute {
            label: "Danh mục",
            value: product.category.label().to_string(),
        },
    ];
    if let Some(shape) = product.shape {
        attributes.push(Attribute {
            label: "Kiểu dáng",
            value: shape.label().to_string(),
        });
    }
    if let Some(material) = product.material {
        attributes.push(Attribute {
            label: "Chất liệu",
            value: material.label().to_string(),
        });
    }
    if let Some(design) = product.frame_design {
        attributes.push(Attribute {
            label: "Thiết kế gọng",
            value: design.label().to_string(),
        });
    }

    let related = products
        .iter()
        .filter(|p| p.id != product.id && p.category == product.category)
        .take(RELATED_LEN)
        .map(|p| ProductCard::new(p, discount))
        .collect();

    let here = format!("/products/{}", product.slug);
    Ok(ProductShowTemplate {
        product: ProductCard::new(product, discount),
        description: product.description.clone(),
        attributes,
        features: product.features.clone(),
        colors: product.colors.clone(),
        member_discount_percent: state.config().member_discount_percent,
        login_href: format!(
            "{}&prompt={}",
            open_auth_href(&here),
            urlencoding::encode("Đăng nhập để xem giá thành viên")
        ),
        trade_in_href: format!("/trade-in?desired={}", urlencoding::encode(&product.slug)),
        related,
        customer,
    })
}
