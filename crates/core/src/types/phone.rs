//! Vietnamese mobile phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input is empty after stripping separators.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input contains something other than digits and separators.
    #[error("phone number may only contain digits")]
    InvalidCharacter,
    /// The number has the wrong number of digits.
    #[error("phone number must have {expected} digits (got {actual})")]
    WrongLength {
        /// Required digit count.
        expected: usize,
        /// Digit count found.
        actual: usize,
    },
    /// The number does not start with a mobile network prefix.
    #[error("phone number must start with 03, 05, 07, 08 or 09")]
    InvalidPrefix,
}

impl PhoneError {
    /// Short Vietnamese message for inline form errors.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Empty => "Vui lòng nhập số điện thoại",
            Self::InvalidCharacter | Self::WrongLength { .. } | Self::InvalidPrefix => {
                "Số điện thoại không hợp lệ"
            }
        }
    }
}

/// A normalized Vietnamese mobile number, stored as 10 digits starting with `0`.
///
/// ## Normalization
///
/// - Spaces, dots, dashes and parentheses are removed
/// - A `+84` or `84` country prefix is rewritten to a leading `0`
///
/// ## Examples
///
/// ```
/// use optica_core::PhoneNumber;
///
/// let phone = PhoneNumber::parse("+84 901 234 567").unwrap();
/// assert_eq!(phone.as_str(), "0901234567");
///
/// assert!(PhoneNumber::parse("0901234567").is_ok());
/// assert!(PhoneNumber::parse("0201234567").is_err()); // landline prefix
/// assert!(PhoneNumber::parse("090123").is_err());     // too short
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Number of digits in a normalized number.
    pub const DIGITS: usize = 10;

    const MOBILE_PREFIXES: [u8; 5] = [b'3', b'5', b'7', b'8', b'9'];

    /// Parse and normalize a phone number.
    ///
    /// # Errors
    ///
    /// Returns a [`PhoneError`] if the input is empty, contains letters, has
    /// the wrong digit count or a non-mobile prefix.
    pub fn parse(input: &str) -> Result<Self, PhoneError> {
        let mut digits = String::with_capacity(input.len());
        for (i, ch) in input.trim().chars().enumerate() {
            match ch {
                '0'..='9' => digits.push(ch),
                ' ' | '.' | '-' | '(' | ')' => {}
                '+' if i == 0 => {}
                _ => return Err(PhoneError::InvalidCharacter),
            }
        }

        if digits.is_empty() {
            return Err(PhoneError::Empty);
        }

        if let Some(rest) = digits.strip_prefix("84")
            && rest.len() == Self::DIGITS - 1
        {
            digits = format!("0{rest}");
        }

        if digits.len() != Self::DIGITS {
            return Err(PhoneError::WrongLength {
                expected: Self::DIGITS,
                actual: digits.len(),
            });
        }

        let bytes = digits.as_bytes();
        let valid_prefix = bytes.first() == Some(&b'0')
            && bytes
                .get(1)
                .is_some_and(|b| Self::MOBILE_PREFIXES.contains(b));
        if !valid_prefix {
            return Err(PhoneError::InvalidPrefix);
        }

        Ok(Self(digits))
    }

    /// Returns the normalized digits.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display form with the middle digits hidden, e.g. `090****567`.
    #[must_use]
    pub fn masked(&self) -> String {
        let head = self.0.get(..3).unwrap_or_default();
        let tail = self.0.get(7..).unwrap_or_default();
        format!("{head}****{tail}")
    }

    /// Grouped display form, e.g. `0901 234 567`.
    #[must_use]
    pub fn formatted(&self) -> String {
        let a = self.0.get(..4).unwrap_or_default();
        let b = self.0.get(4..7).unwrap_or_default();
        let c = self.0.get(7..).unwrap_or_default();
        format!("{a} {b} {c}")
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(phone: PhoneNumber) -> Self {
        phone.0
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
