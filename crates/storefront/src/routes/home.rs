//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::CurrentCustomer;
use crate::routes::products::ProductCard;
use crate::state::AppState;

/// Products per home page strip.
const STRIP_LEN: usize = 4;

/// A promotional banner linking into the catalog.
#[derive(Clone)]
pub struct Banner {
    pub eyebrow: &'static str,
    pub title: &'static str,
    pub button_text: &'static str,
    pub button_url: &'static str,
}

const BANNERS: &[Banner] = &[
    Banner {
        eyebrow: "Bộ sưu tập mới",
        title: "Gọng titan siêu nhẹ cho dân văn phòng",
        button_text: "Khám phá",
        button_url: "/products?material=titanium",
    },
    Banner {
        eyebrow: "Thu cũ đổi mới",
        title: "Trợ giá đến 30% khi đổi kính cũ",
        button_text: "Định giá ngay",
        button_url: "/trade-in",
    },
];

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub customer: Option<CurrentCustomer>,
    pub banners: &'static [Banner],
    pub hot_deals: Vec<ProductCard>,
    pub new_arrivals: Vec<ProductCard>,
}

/// Display the home page.
#[instrument(skip(state, customer))]
pub async fn home(
    State(state): State<AppState>,
    OptionalAuth(customer): OptionalAuth,
) -> Result<HomeTemplate> {
    let products = state.catalog().products().await?;
    let discount = customer
        .as_ref()
        .map(|_| state.config().member_discount_percent);

    let hot_deals = products
        .iter()
        .filter(|p| p.is_hot_deal)
        .take(STRIP_LEN)
        .map(|p| ProductCard::new(p, discount))
        .collect();
    let new_arrivals = products
        .iter()
        .filter(|p| p.is_new)
        .take(STRIP_LEN)
        .map(|p| ProductCard::new(p, discount))
        .collect();

    Ok(HomeTemplate {
        customer,
        banners: BANNERS,
        hot_deals,
        new_arrivals,
    })
}
