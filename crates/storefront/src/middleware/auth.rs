//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring a logged-in customer in route handlers.
//! Instead of failing, a page that needs login sends the visitor through
//! `/auth/open`, which opens the phone-OTP gate and returns them afterwards.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentCustomer, session_keys};

/// Extractor that requires a logged-in customer.
///
/// If the customer is not logged in, returns a redirect into the auth gate
/// with the current path as the return target.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(customer): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Xin chào, {}!", customer.display_name())
/// }
/// ```
pub struct RequireAuth(pub CurrentCustomer);

/// Error returned when authentication is required but the customer is not logged in.
pub enum AuthRejection {
    /// Open the auth gate, then come back to `next`.
    OpenAuth { next: String },
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::OpenAuth { next } => Redirect::to(&open_auth_href(&next)).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// Link that opens the auth gate and returns to `next` afterwards.
#[must_use]
pub fn open_auth_href(next: &str) -> String {
    format!("/auth/open?next={}", urlencoding::encode(next))
}

/// Where to come back to after logging in.
///
/// A form POST returns to the page the form lives on rather than replaying
/// the POST.
fn return_target(parts: &Parts) -> String {
    if parts.method == axum::http::Method::GET {
        return parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path().to_string(), ToString::to_string);
    }
    let path = parts.uri.path();
    if path.starts_with("/cart") {
        "/cart".to_string()
    } else if path.starts_with("/vouchers") {
        "/vouchers".to_string()
    } else {
        "/".to_string()
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        let customer: CurrentCustomer = session
            .get(session_keys::CURRENT_CUSTOMER)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| {
                if parts.uri.path().starts_with("/api/") {
                    AuthRejection::Unauthorized
                } else {
                    AuthRejection::OpenAuth {
                        next: return_target(parts),
                    }
                }
            })?;

        Ok(Self(customer))
    }
}

/// Extractor that optionally gets the current customer.
///
/// Unlike `RequireAuth`, this does not reject the request if the customer is not logged in.
pub struct OptionalAuth(pub Option<CurrentCustomer>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let customer = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentCustomer>(session_keys::CURRENT_CUSTOMER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(customer))
    }
}

/// Helper to set the current customer in the session.
///
/// Cycles the session id first so a pre-login session id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_customer(
    session: &Session,
    customer: &CurrentCustomer,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session
        .insert(session_keys::CURRENT_CUSTOMER, customer)
        .await
}

/// Helper to clear the current customer from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_customer(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentCustomer>(session_keys::CURRENT_CUSTOMER)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_auth_href_encodes_target() {
        assert_eq!(
            open_auth_href("/products?brand=Rayban&sort=price-asc"),
            "/auth/open?next=%2Fproducts%3Fbrand%3DRayban%26sort%3Dprice-asc"
        );
    }
}
