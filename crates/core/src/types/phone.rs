//! Mexican phone number type.
//!
//! Customers type numbers in many shapes ("55 1234 5678", "(55) 1234-5678",
//! "+52 55 1234 5678"). The identity provider expects E.164 for SMS OTP, so
//! every accepted input normalizes to `+52` followed by ten digits.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input has characters other than digits, spaces, dashes, dots,
    /// parentheses, or a leading plus sign.
    #[error("phone number contains invalid characters")]
    InvalidCharacters,
    /// The number starts with a country code other than +52.
    #[error("only Mexican (+52) phone numbers are supported")]
    UnsupportedCountryCode,
    /// The national number does not have exactly ten digits.
    #[error("phone number must have 10 digits (got {0})")]
    WrongLength(usize),
}

/// A Mexican phone number in E.164 form (`+52XXXXXXXXXX`).
///
/// ## Examples
///
/// ```
/// use tienda_core::Phone;
///
/// let phone = Phone::parse("(55) 1234-5678").unwrap();
/// assert_eq!(phone.as_str(), "+525512345678");
/// assert_eq!(phone.national(), "5512345678");
///
/// assert!(Phone::parse("12345").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Phone(String);

impl Phone {
    /// Country calling code for Mexico.
    pub const COUNTRY_CODE: &'static str = "52";
    /// Digits in a Mexican national number.
    pub const NATIONAL_DIGITS: usize = 10;

    /// Parse and normalize a phone number.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, contains unexpected characters,
    /// or does not reduce to ten national digits.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PhoneError::Empty);
        }

        let (has_plus, rest) = trimmed
            .strip_prefix('+')
            .map_or((false, trimmed), |rest| (true, rest));

        if !rest
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '.' | '(' | ')'))
        {
            return Err(PhoneError::InvalidCharacters);
        }

        let digits: String = rest.chars().filter(char::is_ascii_digit).collect();
        let national = match digits.strip_prefix(Self::COUNTRY_CODE) {
            Some(national) if has_plus || digits.len() == Self::NATIONAL_DIGITS + 2 => national,
            _ if has_plus => return Err(PhoneError::UnsupportedCountryCode),
            _ => digits.as_str(),
        };

        if national.len() != Self::NATIONAL_DIGITS {
            return Err(PhoneError::WrongLength(national.len()));
        }

        Ok(Self(format!("+{}{national}", Self::COUNTRY_CODE)))
    }

    /// Returns the number in E.164 form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the ten national digits without the country code.
    #[must_use]
    pub fn national(&self) -> &str {
        self.0
            .get(1 + Self::COUNTRY_CODE.len()..)
            .unwrap_or_default()
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Phone {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Phone {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Phone> for String {
    fn from(phone: Phone) -> Self {
        phone.0
    }
}
