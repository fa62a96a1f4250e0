//! Email address type (optional contact field on customer profiles).

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input string is empty.
    #[error("email cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input does not contain exactly one @ symbol.
    #[error("email must contain exactly one @ symbol")]
    AtSymbol,
    /// The local part (before @) is empty or contains whitespace.
    #[error("email local part is invalid")]
    InvalidLocalPart,
    /// The domain part (after @) has no dot or an empty label.
    #[error("email domain is invalid")]
    InvalidDomain,
}

/// A contact email address.
///
/// ## Constraints
///
/// - Surrounding whitespace is trimmed, the domain is lower-cased
/// - Length: 1-254 characters (RFC 5321 limit)
/// - Exactly one @ symbol, no whitespace
/// - Domain must contain a dot and no empty labels
///
/// ## Examples
///
/// ```
/// use optica_core::Email;
///
/// let email = Email::parse(" Lan.Nguyen@Gmail.COM ").unwrap();
/// assert_eq!(email.as_str(), "Lan.Nguyen@gmail.com");
///
/// assert!(Email::parse("lan@localhost").is_err());
/// assert!(Email::parse("a@@b.vn").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Email` from a string.
    ///
    /// # Errors
    ///
    /// Returns an [`EmailError`] describing the first constraint violated.
    pub fn parse(input: &str) -> Result<Self, EmailError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let mut parts = s.split('@');
        let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(EmailError::AtSymbol);
        };

        if local.is_empty() || local.chars().any(char::is_whitespace) {
            return Err(EmailError::InvalidLocalPart);
        }

        let domain = domain.to_ascii_lowercase();
        let labels_ok = domain.contains('.')
            && domain
                .split('.')
                .all(|label| !label.is_empty() && !label.chars().any(char::is_whitespace));
        if !labels_ok {
            return Err(EmailError::InvalidDomain);
        }

        Ok(Self(format!("{local}@{domain}")))
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the domain part of the email (after the @).
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.rsplit('@').next().unwrap_or_default()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_domain_case() {
        let email = Email::parse("Minh@Optica.VN").unwrap();
        assert_eq!(email.as_str(), "Minh@optica.vn");
        assert_eq!(email.domain(), "optica.vn");
    }

    #[test]
    fn test_rejects_structural_errors() {
        assert_eq!(Email::parse(""), Err(EmailError::Empty));
        assert_eq!(Email::parse("no-at.vn"), Err(EmailError::AtSymbol));
        assert_eq!(Email::parse("a@b@c.vn"), Err(EmailError::AtSymbol));
        assert_eq!(Email::parse("@c.vn"), Err(EmailError::InvalidLocalPart));
        assert_eq!(Email::parse("a b@c.vn"), Err(EmailError::InvalidLocalPart));
        assert_eq!(Email::parse("a@localhost"), Err(EmailError::InvalidDomain));
        assert_eq!(Email::parse("a@c..vn"), Err(EmailError::InvalidDomain));
    }

    #[test]
    fn test_too_long() {
        let long = format!("{}@optica.vn", "a".repeat(250));
        assert!(matches!(Email::parse(&long), Err(EmailError::TooLong { .. })));
    }
}
