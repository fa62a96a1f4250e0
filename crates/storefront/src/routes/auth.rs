//! Authentication route handlers.
//!
//! The phone-OTP gate lives in the session. Every handler loads it, lets
//! [`AuthFlow`](crate::services::auth::AuthFlow) drive one step, and writes
//! it back only when the step still belongs to the live gate. A response for
//! a gate that was closed or reopened meanwhile is dropped without touching
//! the session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use optica_core::Email;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::gateway::CustomerProfile;
use crate::middleware::{OptionalAuth, clear_current_customer, set_current_customer};
use crate::models::{CurrentCustomer, session_keys};
use crate::services::auth::{
    AuthGate, AuthGateError, GateOutcome, GateStep, RegistrationErrors, RegistrationInput,
    Settled, sanitize_redirect,
};
use crate::state::AppState;

const LOGIN_PATH: &str = "/auth/login";
const REGISTER_PATH: &str = "/auth/register";
const OPEN_PATH: &str = "/auth/open";
const DEFAULT_LANDING: &str = "/account";

// =============================================================================
// Form Types
// =============================================================================

/// Query parameters of `/auth/open`.
#[derive(Debug, Deserialize)]
pub struct OpenQuery {
    pub next: Option<String>,
    pub prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PhoneForm {
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub struct OtpForm {
    pub code: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Gate dialog template (phone and code steps).
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub customer: Option<CurrentCustomer>,
    /// Step name, e.g. `collecting_phone` or `awaiting_otp`.
    pub step: &'static str,
    pub phone: Option<String>,
    pub prompt: Option<String>,
    pub error: Option<String>,
    /// Code shown in demo mode only.
    pub demo_code: Option<String>,
    pub cooldown_remaining: u32,
    pub can_resend: bool,
    pub otp_length: usize,
}

/// Registration form for a verified, unknown phone.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub customer: Option<CurrentCustomer>,
    pub phone: String,
    pub full_name: String,
    pub email: String,
    pub errors: RegistrationErrors,
    /// Backend refusal recorded on the gate.
    pub error: Option<String>,
}

// =============================================================================
// Session helpers
// =============================================================================

async fn load_gate(session: &Session) -> Result<Option<AuthGate>> {
    Ok(session.get::<AuthGate>(session_keys::AUTH_GATE).await?)
}

async fn save_gate(session: &Session, gate: &AuthGate) -> Result<()> {
    session.insert(session_keys::AUTH_GATE, gate).await?;
    Ok(())
}

/// The page that shows `gate` in its current step.
const fn gate_page(gate: &AuthGate) -> &'static str {
    match gate.step() {
        GateStep::NewRegistration { .. } => REGISTER_PATH,
        _ => LOGIN_PATH,
    }
}

/// Store the customer in the session and drop the gate.
async fn log_in(session: &Session, profile: CustomerProfile) -> Result<()> {
    let customer = CurrentCustomer::from(profile);
    set_current_customer(session, &customer).await?;
    session.remove::<AuthGate>(session_keys::AUTH_GATE).await?;

    set_sentry_user(&customer.id, customer.email.as_ref().map(Email::as_str));
    add_breadcrumb("auth", "Logged in", None);
    tracing::info!(customer_id = %customer.id, "Customer logged in");
    Ok(())
}

/// Turn the result of one gate step into a response.
async fn settle(
    session: &Session,
    gate: &AuthGate,
    result: std::result::Result<Settled<GateOutcome>, AuthGateError>,
) -> Result<Response> {
    match result {
        Ok(Settled::Stale) => Ok(Redirect::to(LOGIN_PATH).into_response()),
        Ok(Settled::Current(GateOutcome::Pending)) => {
            save_gate(session, gate).await?;
            Ok(Redirect::to(gate_page(gate)).into_response())
        }
        Ok(Settled::Current(GateOutcome::Register)) => {
            save_gate(session, gate).await?;
            Ok(Redirect::to(REGISTER_PATH).into_response())
        }
        Ok(Settled::Current(GateOutcome::LoggedIn { customer, redirect })) => {
            log_in(session, customer).await?;
            let target = redirect.unwrap_or_else(|| DEFAULT_LANDING.to_string());
            Ok(Redirect::to(&target).into_response())
        }
        Err(e) if e.is_recorded() => {
            save_gate(session, gate).await?;
            Ok(Redirect::to(gate_page(gate)).into_response())
        }
        Err(e) => {
            // Duplicate submit, stale form or wrong step: nothing to save
            tracing::debug!(error = %e, "Ignoring auth action");
            Ok(Redirect::to(gate_page(gate)).into_response())
        }
    }
}

// =============================================================================
// Gate routes
// =============================================================================

/// Open the gate, replacing any gate this browser already had.
///
/// This is the shared "open login" entry point: cart icon, buy buttons and
/// price-reveal links all land here with their own return target.
#[instrument(skip_all)]
pub async fn open(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
    Query(query): Query<OpenQuery>,
) -> Result<Response> {
    let next = query.next.as_deref().and_then(sanitize_redirect);
    if customer.is_some() {
        let target = next.unwrap_or_else(|| DEFAULT_LANDING.to_string());
        return Ok(Redirect::to(&target).into_response());
    }

    let previous = load_gate(&session).await?;
    let gate = state.auth().open(
        previous.as_ref(),
        next.as_deref(),
        query.prompt.as_deref(),
        Utc::now(),
    );
    save_gate(&session, &gate).await?;
    Ok(Redirect::to(LOGIN_PATH).into_response())
}

/// Display the gate in its current step.
#[instrument(skip_all)]
pub async fn login_page(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
) -> Result<Response> {
    if customer.is_some() {
        return Ok(Redirect::to(DEFAULT_LANDING).into_response());
    }
    let Some(mut gate) = load_gate(&session).await? else {
        return Ok(Redirect::to(OPEN_PATH).into_response());
    };
    if !state.auth().is_current(&gate) {
        // Expired or closed elsewhere: start over with the same target
        let href = gate.redirect().map_or_else(
            || OPEN_PATH.to_string(),
            crate::middleware::open_auth_href,
        );
        session.remove::<AuthGate>(session_keys::AUTH_GATE).await?;
        return Ok(Redirect::to(&href).into_response());
    }
    if matches!(gate.step(), GateStep::NewRegistration { .. }) {
        return Ok(Redirect::to(REGISTER_PATH).into_response());
    }

    gate.sync_cooldown(Utc::now());
    let page = LoginTemplate {
        customer: None,
        step: gate.step().name(),
        phone: gate.step().phone().map(optica_core::PhoneNumber::formatted),
        prompt: gate.prompt().map(str::to_string),
        error: gate.error().map(str::to_string),
        demo_code: gate.demo_code().map(|c| c.as_str().to_string()),
        cooldown_remaining: gate.cooldown().remaining(),
        can_resend: gate.cooldown().can_resend(),
        otp_length: optica_core::OTP_LENGTH,
    };

    // Errors are shown once
    gate.clear_error();
    save_gate(&session, &gate).await?;
    Ok(page.into_response())
}

/// Handle phone submission.
#[instrument(skip_all)]
pub async fn submit_phone(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<PhoneForm>,
) -> Result<Response> {
    let Some(mut gate) = load_gate(&session).await? else {
        return Ok(Redirect::to(OPEN_PATH).into_response());
    };
    let result = state
        .auth()
        .submit_phone(&mut gate, &form.phone, Utc::now())
        .await;
    settle(&session, &gate, result).await
}

/// Handle code submission.
#[instrument(skip_all)]
pub async fn submit_otp(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<OtpForm>,
) -> Result<Response> {
    let Some(mut gate) = load_gate(&session).await? else {
        return Ok(Redirect::to(OPEN_PATH).into_response());
    };
    let result = state.auth().submit_otp(&mut gate, &form.code).await;
    settle(&session, &gate, result).await
}

/// Handle a resend request.
#[instrument(skip_all)]
pub async fn resend(State(state): State<AppState>, session: Session) -> Result<Response> {
    let Some(mut gate) = load_gate(&session).await? else {
        return Ok(Redirect::to(OPEN_PATH).into_response());
    };
    let result = state.auth().resend(&mut gate, Utc::now()).await;
    settle(&session, &gate, result).await
}

/// Close the gate. An established login is not affected.
#[instrument(skip_all)]
pub async fn cancel(State(state): State<AppState>, session: Session) -> Result<Response> {
    if let Some(mut gate) = load_gate(&session).await? {
        state.auth().cancel(&mut gate);
        session.remove::<AuthGate>(session_keys::AUTH_GATE).await?;
        add_breadcrumb("auth", "Closed login", None);
    }
    Ok(Redirect::to("/").into_response())
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration form, pre-filled with the verified phone.
#[instrument(skip_all)]
pub async fn register_page(State(state): State<AppState>, session: Session) -> Result<Response> {
    let Some(mut gate) = load_gate(&session).await? else {
        return Ok(Redirect::to(OPEN_PATH).into_response());
    };
    let phone = match gate.step() {
        GateStep::NewRegistration { phone } if state.auth().is_current(&gate) => {
            phone.formatted()
        }
        _ => return Ok(Redirect::to(LOGIN_PATH).into_response()),
    };

    let page = RegisterTemplate {
        customer: None,
        phone,
        full_name: String::new(),
        email: String::new(),
        errors: RegistrationErrors::default(),
        error: gate.error().map(str::to_string),
    };
    gate.clear_error();
    save_gate(&session, &gate).await?;
    Ok(page.into_response())
}

/// Handle registration form submission.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let Some(mut gate) = load_gate(&session).await? else {
        return Ok(Redirect::to(OPEN_PATH).into_response());
    };
    let input = RegistrationInput {
        full_name: &form.full_name,
        email: &form.email,
    };
    let result = match state.auth().register(&mut gate, input).await {
        Err(AuthGateError::InvalidRegistration(errors)) => {
            let phone = gate
                .step()
                .phone()
                .map(optica_core::PhoneNumber::formatted)
                .unwrap_or_default();
            let page = RegisterTemplate {
                customer: None,
                phone,
                full_name: form.full_name,
                email: form.email,
                errors,
                error: None,
            };
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
        other => other,
    };
    settle(&session, &gate, result).await
}

// =============================================================================
// Logout Route
// =============================================================================

/// Handle logout.
///
/// Clears the customer and destroys the session.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
) -> Response {
    if let Some(customer) = customer {
        state.auth().logout(customer.id);
        tracing::info!(customer_id = %customer.id, "Customer logged out");
    }

    if let Err(e) = clear_current_customer(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }

    // Also destroy the entire session
    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {}", e);
    }
    clear_sentry_user();

    Redirect::to("/").into_response()
}
