//! Auth gate error types.

use optica_core::{OtpError, PhoneError};
use thiserror::Error;

/// Field-level problems with the registration form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationErrors {
    pub full_name: Option<&'static str>,
    pub email: Option<&'static str>,
}

impl RegistrationErrors {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.email.is_none()
    }
}

/// Errors that can occur while driving the auth gate.
#[derive(Debug, Error)]
pub enum AuthGateError {
    /// The submitted phone number is malformed.
    #[error("invalid phone number: {0}")]
    InvalidPhone(#[from] PhoneError),

    /// The submitted code is malformed.
    #[error("invalid OTP: {0}")]
    InvalidOtp(#[from] OtpError),

    /// The action is not allowed in the gate's current step.
    #[error("cannot {action} while {step}")]
    WrongStep {
        action: &'static str,
        step: &'static str,
    },

    /// A resend was requested before the cooldown elapsed.
    #[error("resend available in {0} seconds")]
    CooldownActive(u32),

    /// Another request for the same phone number has not settled yet.
    #[error("a request for this phone number is already in progress")]
    InFlight,

    /// A result arrived for a request the gate no longer expects.
    #[error("ticket does not match the current gate")]
    StaleTicket,

    /// The registration form has field errors.
    #[error("registration form is invalid")]
    InvalidRegistration(RegistrationErrors),
}

impl AuthGateError {
    /// Whether the gate recorded this error and must be saved back.
    ///
    /// Other errors leave the stored gate untouched.
    #[must_use]
    pub const fn is_recorded(&self) -> bool {
        matches!(
            self,
            Self::InvalidPhone(_) | Self::InvalidOtp(_) | Self::CooldownActive(_)
        )
    }
}
