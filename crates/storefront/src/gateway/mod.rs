//! Customer authentication gateway.
//!
//! The auth gate never talks to a backend directly; it goes through
//! [`AuthGateway`]. Two implementations exist:
//!
//! - [`FakeGateway`] - in-memory customers and a fixed artificial delay, used
//!   for local development and every test
//! - [`GraphqlGateway`] - the commerce backend's customer mutations

mod fake;
mod graphql;

pub use fake::{DEMO_CUSTOMER_PHONE, FakeGateway};
pub use graphql::GraphqlGateway;

use async_trait::async_trait;
use optica_core::{CustomerId, Email, OtpCode, PhoneNumber};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::BackendError;

/// Message shown when a submitted OTP does not match the one sent.
pub const INCORRECT_OTP_MESSAGE: &str = "OTP không chính xác";

/// A customer as known to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub id: CustomerId,
    pub phone: PhoneNumber,
    pub full_name: String,
    pub email: Option<Email>,
}

/// Fields collected by the registration form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    /// Phone number already proven by OTP.
    pub phone: PhoneNumber,
    pub full_name: String,
    pub email: Option<Email>,
}

/// Result of requesting an OTP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpDispatch {
    /// The code itself, only when the gateway runs in demo mode.
    pub dev_code: Option<OtpCode>,
}

/// Outcome of checking a submitted code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpVerdict {
    Verified,
    Rejected { message: String },
}

/// Errors returned by an [`AuthGateway`].
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport or protocol failure talking to the backend.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// The backend refused to send a code.
    #[error("OTP could not be sent: {0}")]
    SendFailed(String),

    /// No customer exists for the phone number.
    #[error("customer not found")]
    CustomerNotFound,

    /// The phone number already has an account.
    #[error("phone number already registered")]
    AlreadyRegistered,

    /// The backend rejected the registration.
    #[error("registration rejected: {0}")]
    RegistrationRejected(String),

    /// The backend answered with data we could not interpret.
    #[error("malformed gateway response: {0}")]
    Malformed(String),
}

impl GatewayError {
    /// Vietnamese message safe to render next to the form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend(BackendError::RateLimited(seconds)) => {
                format!("Bạn thao tác quá nhanh, vui lòng thử lại sau {seconds} giây")
            }
            Self::Backend(_) | Self::Malformed(_) => {
                "Không thể kết nối máy chủ, vui lòng thử lại".to_string()
            }
            Self::SendFailed(message) | Self::RegistrationRejected(message)
                if !message.trim().is_empty() =>
            {
                message.clone()
            }
            Self::SendFailed(_) => "Không gửi được mã OTP, vui lòng thử lại".to_string(),
            Self::RegistrationRejected(_) => "Đăng ký không thành công".to_string(),
            Self::CustomerNotFound => "Không tìm thấy tài khoản".to_string(),
            Self::AlreadyRegistered => "Số điện thoại đã được đăng ký".to_string(),
        }
    }

    /// Whether the failure comes from infrastructure rather than the user.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::Backend(_) | Self::Malformed(_))
    }
}

/// Remote collaborator behind the phone-OTP flow.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Whether an account exists for `phone`. Reveals nothing else.
    async fn check_phone_exists(&self, phone: &PhoneNumber) -> Result<bool, GatewayError>;

    /// Send a fresh code to `phone`, invalidating any earlier one.
    async fn send_otp(&self, phone: &PhoneNumber) -> Result<OtpDispatch, GatewayError>;

    /// Check `code` against the last one sent to `phone`.
    async fn verify_otp(
        &self,
        phone: &PhoneNumber,
        code: &OtpCode,
    ) -> Result<OtpVerdict, GatewayError>;

    /// Fetch the profile of an existing customer.
    async fn login_customer(&self, phone: &PhoneNumber) -> Result<CustomerProfile, GatewayError>;

    /// Create an account for a verified phone number.
    async fn register_customer(
        &self,
        customer: NewCustomer,
    ) -> Result<CustomerProfile, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_backend_text() {
        let err = GatewayError::SendFailed("Số điện thoại bị khóa".to_string());
        assert_eq!(err.user_message(), "Số điện thoại bị khóa");

        let err = GatewayError::SendFailed(String::new());
        assert_eq!(err.user_message(), "Không gửi được mã OTP, vui lòng thử lại");
    }

    #[test]
    fn test_backend_errors_hide_details() {
        let err = GatewayError::Backend(BackendError::EmptyResponse("SendOtp"));
        assert!(err.is_server_error());
        assert!(!err.user_message().contains("SendOtp"));

        let err = GatewayError::Backend(BackendError::RateLimited(30));
        assert!(err.user_message().contains("30"));
        assert!(!GatewayError::CustomerNotFound.is_server_error());
    }
}
