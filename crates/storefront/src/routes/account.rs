//! Account route handlers.
//!
//! These routes require authentication.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use optica_core::Email;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::CurrentCustomer;
use crate::state::AppState;
use crate::vouchers::{VoucherView, shop_today};

/// Account overview page template.
#[derive(Template, WebTemplate)]
#[template(path = "account.html")]
pub struct AccountTemplate {
    pub customer: Option<CurrentCustomer>,
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub member_discount_percent: u8,
    /// Only vouchers this customer holds a code for.
    pub claimed: Vec<VoucherView>,
}

/// Display account overview page.
#[instrument(skip_all, fields(customer_id = %customer.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
) -> Result<AccountTemplate> {
    let claimed = state
        .vouchers()
        .list_for(customer.id, shop_today())
        .await?
        .into_iter()
        .filter(VoucherView::is_claimed)
        .collect();

    Ok(AccountTemplate {
        full_name: customer.full_name.clone(),
        phone: customer.phone.formatted(),
        email: customer.email.as_ref().map(|e| Email::as_str(e).to_string()),
        member_discount_percent: state.config().member_discount_percent,
        claimed,
        customer: Some(customer),
    })
}
