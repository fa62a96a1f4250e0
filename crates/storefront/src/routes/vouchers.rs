//! Voucher route handlers.
//!
//! Claim buttons post to `/vouchers/{program}/claim`. A successful claim
//! redirects back to the list with the fresh code highlighted; a refused claim
//! renders the list again with the reason next to the program, or at the top
//! of the page when the program does not exist.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::CurrentCustomer;
use crate::state::AppState;
use crate::vouchers::{VoucherError, VoucherView, shop_today};

/// Voucher list template.
#[derive(Template, WebTemplate)]
#[template(path = "vouchers.html")]
pub struct VouchersTemplate {
    pub customer: Option<CurrentCustomer>,
    pub vouchers: Vec<VoucherView>,
    /// Program whose code was just issued.
    pub just_claimed: Option<String>,
    /// Canonical id of the program the error belongs to, and the message.
    pub error: Option<(String, String)>,
    /// Refusal that belongs to no listed program.
    pub alert: Option<String>,
}

impl VouchersTemplate {
    /// Inline error for `program_id`, if any.
    #[must_use]
    pub fn error_for(&self, program_id: &str) -> Option<&str> {
        self.error
            .as_ref()
            .filter(|(id, _)| id == program_id)
            .map(|(_, message)| message.as_str())
    }

    #[must_use]
    pub fn is_just_claimed(&self, program_id: &str) -> bool {
        self.just_claimed.as_deref() == Some(program_id)
    }
}

#[derive(Debug, Deserialize)]
pub struct VouchersQuery {
    pub claimed: Option<String>,
}

/// Display the programs with this customer's claim state.
#[instrument(skip_all, fields(customer_id = %customer.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Query(query): Query<VouchersQuery>,
) -> Result<VouchersTemplate> {
    let vouchers = state.vouchers().list_for(customer.id, shop_today()).await?;
    Ok(VouchersTemplate {
        customer: Some(customer),
        vouchers,
        just_claimed: query.claimed,
        error: None,
        alert: None,
    })
}

/// Claim a voucher.
#[instrument(skip_all, fields(customer_id = %customer.id, program = %program))]
pub async fn claim(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Path(program): Path<String>,
) -> Result<Response> {
    let today = shop_today();
    match state.vouchers().claim(customer.id, &program, today).await {
        Ok(claim) => {
            add_breadcrumb(
                "vouchers",
                "Claimed voucher",
                Some(&[("program", claim.program_id.as_str())]),
            );
            let href = format!("/vouchers?claimed={}", urlencoding::encode(&claim.program_id));
            Ok(Redirect::to(&href).into_response())
        }
        Err(e @ (VoucherError::UnknownProgram(_) | VoucherError::Expired { .. })) => {
            tracing::info!(error = %e, "Voucher claim refused");
            let message = e.user_message();
            let (status, error, alert) = match e {
                VoucherError::Expired { program, .. } => {
                    (StatusCode::GONE, Some((program.to_string(), message)), None)
                }
                _ => (StatusCode::NOT_FOUND, None, Some(message)),
            };
            let vouchers = state.vouchers().list_for(customer.id, today).await?;
            let page = VouchersTemplate {
                customer: Some(customer),
                vouchers,
                just_claimed: None,
                error,
                alert,
            };
            Ok((status, page).into_response())
        }
        Err(e) => Err(AppError::from(e)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn page(error: Option<(&str, &str)>, claimed: Option<&str>) -> VouchersTemplate {
        VouchersTemplate {
            customer: None,
            vouchers: Vec::new(),
            just_claimed: claimed.map(str::to_string),
            error: error.map(|(id, msg)| (id.to_string(), msg.to_string())),
            alert: None,
        }
    }

    #[test]
    fn test_error_for_matches_program_only() {
        let page = page(Some(("TET2026", "Chương trình đã kết thúc")), None);
        assert_eq!(page.error_for("TET2026"), Some("Chương trình đã kết thúc"));
        assert_eq!(page.error_for("WELCOME"), None);
    }

    #[test]
    fn test_is_just_claimed() {
        let page = page(None, Some("WELCOME"));
        assert!(page.is_just_claimed("WELCOME"));
        assert!(!page.is_just_claimed("TET2026"));
    }
}
