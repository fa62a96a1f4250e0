//! One-time passcode type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Number of digits in every OTP issued by the storefront.
///
/// All login and registration flows share this single length.
pub const OTP_LENGTH: usize = 4;

const OTP_MODULUS: u32 = 10_000;

/// Errors that can occur when parsing an [`OtpCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OtpError {
    /// The code does not have [`OTP_LENGTH`] characters.
    #[error("OTP must have {} digits (got {})", OTP_LENGTH, .0)]
    WrongLength(usize),
    /// The code contains a non-digit character.
    #[error("OTP may only contain digits")]
    NonDigit,
}

impl OtpError {
    /// Short Vietnamese message for inline form errors.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::WrongLength(_) => "Vui lòng nhập đủ 4 số OTP",
            Self::NonDigit => "Mã OTP chỉ gồm chữ số",
        }
    }
}

/// A syntactically valid OTP code.
///
/// Validation is purely local: a well-formed code may still be rejected by the
/// verification backend.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct OtpCode(String);

impl OtpCode {
    /// Parse a code, ignoring surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError`] on a length mismatch or non-digit characters.
    pub fn parse(input: &str) -> Result<Self, OtpError> {
        let code = input.trim();
        let len = code.chars().count();
        if len != OTP_LENGTH {
            return Err(OtpError::WrongLength(len));
        }
        if !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(OtpError::NonDigit);
        }
        Ok(Self(code.to_owned()))
    }

    /// Build a code from a number in `0..10^OTP_LENGTH`, zero-padded.
    #[must_use]
    pub fn from_number(n: u32) -> Self {
        Self(format!("{:0width$}", n % OTP_MODULUS, width = OTP_LENGTH))
    }

    /// The code digits.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Codes are secrets; keep them out of logs.
impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OtpCode([REDACTED])")
    }
}

impl TryFrom<String> for OtpCode {
    type Error = OtpError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<OtpCode> for String {
    fn from(code: OtpCode) -> Self {
        code.0
    }
}
