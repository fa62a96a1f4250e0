//! Trade-in route handlers.
//!
//! Anyone can submit a trade-in request. A logged-in customer gets name and
//! phone pre-filled; `?desired=<slug>` pre-selects the product to exchange for.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use optica_core::{Category, DeviceCondition, Price, TradeInId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::{CurrentCustomer, session_keys};
use crate::state::AppState;
use crate::trade_in::{MAX_CREDIT_PERCENT, TradeInErrors, TradeInForm, TradeInRequest};

/// A `<select>` option.
#[derive(Clone)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

/// Trade-in form template.
#[derive(Template, WebTemplate)]
#[template(path = "trade_in/form.html")]
pub struct TradeInFormTemplate {
    pub customer: Option<CurrentCustomer>,
    pub form: TradeInForm,
    pub errors: TradeInErrors,
    pub categories: Vec<Choice>,
    pub conditions: Vec<Choice>,
    pub products: Vec<Choice>,
    pub max_credit_percent: u8,
}

/// Confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "trade_in/success.html")]
pub struct TradeInSuccessTemplate {
    pub customer: Option<CurrentCustomer>,
    pub request: TradeInRequest,
    pub phone: String,
    pub estimate: Price,
}

#[derive(Debug, Deserialize)]
pub struct TradeInQuery {
    pub desired: Option<String>,
}

fn category_choices() -> Vec<Choice> {
    Category::ALL
        .iter()
        .map(|c| Choice {
            value: c.slug().to_string(),
            label: c.label().to_string(),
        })
        .collect()
}

fn condition_choices() -> Vec<Choice> {
    DeviceCondition::ALL
        .iter()
        .map(|c| Choice {
            value: c.slug().to_string(),
            label: format!("{} ({}%)", c.label(), c.credit_percent()),
        })
        .collect()
}

async fn form_page(
    state: &AppState,
    customer: Option<CurrentCustomer>,
    form: TradeInForm,
    errors: TradeInErrors,
) -> Result<TradeInFormTemplate> {
    let products = state.catalog().products().await?;
    Ok(TradeInFormTemplate {
        customer,
        form,
        errors,
        categories: category_choices(),
        conditions: condition_choices(),
        products: products
            .iter()
            .map(|p| Choice {
                value: p.slug.clone(),
                label: format!("{} {}", p.brand, p.name),
            })
            .collect(),
        max_credit_percent: MAX_CREDIT_PERCENT,
    })
}

/// Display the trade-in form.
#[instrument(skip_all)]
pub async fn form(
    State(state): State<AppState>,
    OptionalAuth(customer): OptionalAuth,
    Query(query): Query<TradeInQuery>,
) -> Result<TradeInFormTemplate> {
    let mut form = TradeInForm {
        desired_product: query.desired.unwrap_or_default(),
        ..TradeInForm::default()
    };
    if let Some(customer) = &customer {
        form.full_name.clone_from(&customer.full_name);
        form.phone = customer.phone.as_str().to_string();
    }
    form_page(&state, customer, form, TradeInErrors::default()).await
}

/// Handle trade-in form submission.
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
    Form(form): Form<TradeInForm>,
) -> Result<Response> {
    let products = state.catalog().products().await?;
    let valid = match form.validate(&products) {
        Ok(valid) => valid,
        Err(errors) => {
            tracing::debug!(?errors, "Trade-in form rejected");
            let page = form_page(&state, customer, form, errors).await?;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    let request = state.trade_ins().submit(valid);
    session
        .insert(session_keys::LAST_TRADE_IN, request.id)
        .await?;
    add_breadcrumb("trade_in", "Submitted trade-in", None);

    Ok(Redirect::to(&format!("/trade-in/{}", request.id)).into_response())
}

/// Confirmation for the request this browser just submitted.
#[instrument(skip(state, session, customer))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
    Path(id): Path<TradeInId>,
) -> Result<TradeInSuccessTemplate> {
    // Requests carry contact details; only the submitting browser sees them
    let own = session.get::<TradeInId>(session_keys::LAST_TRADE_IN).await?;
    if own != Some(id) {
        return Err(AppError::NotFound(format!("trade-in {id}")));
    }
    let request = state
        .trade_ins()
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("trade-in {id}")))?;

    Ok(TradeInSuccessTemplate {
        customer,
        phone: request.phone.masked(),
        estimate: request.estimate,
        request,
    })
}
