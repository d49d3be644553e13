//! Form validation run before any network call.
//!
//! Every failure carries the exact Spanish message shown to the customer.

use secrecy::SecretString;
use thiserror::Error;

use tienda_core::{Email, Phone};

use crate::auth::OtpTarget;

/// Minimum password length accepted by the identity provider.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Digits in a Mexican postal code.
const POSTAL_CODE_DIGITS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Completa todos los campos.")]
    MissingFields,

    #[error("Ingresa un correo electrónico válido.")]
    InvalidEmail,

    #[error("Las contraseñas no coinciden.")]
    PasswordMismatch,

    #[error("La contraseña debe tener al menos 6 caracteres.")]
    PasswordTooShort,

    #[error("Ingresa un número de teléfono válido de 10 dígitos.")]
    InvalidPhone,

    #[error("Ingresa un código postal válido de 5 dígitos.")]
    InvalidPostalCode,

    #[error("Ingresa el código de verificación.")]
    MissingCode,

    #[error("Ingresa tu correo o tu teléfono, no ambos.")]
    AmbiguousTarget,
}

/// Fail with [`ValidationError::MissingFields`] if any field is blank.
///
/// # Errors
///
/// Returns `MissingFields` when a value is empty after trimming.
pub fn require_all(fields: &[&str]) -> Result<(), ValidationError> {
    if fields.iter().any(|field| field.trim().is_empty()) {
        return Err(ValidationError::MissingFields);
    }
    Ok(())
}

/// # Errors
///
/// Returns `InvalidEmail` if the address does not parse.
pub fn email(value: &str) -> Result<Email, ValidationError> {
    Email::parse(value).map_err(|_| ValidationError::InvalidEmail)
}

/// # Errors
///
/// Returns `InvalidPhone` if the number is not ten Mexican digits.
pub fn phone(value: &str) -> Result<Phone, ValidationError> {
    Phone::parse(value).map_err(|_| ValidationError::InvalidPhone)
}

/// Check a new password and its confirmation.
///
/// # Errors
///
/// Returns `MissingFields`, `PasswordMismatch` or `PasswordTooShort`, in
/// that order of precedence.
pub fn new_password(password: &str, confirmation: &str) -> Result<SecretString, ValidationError> {
    require_all(&[password, confirmation])?;
    if password != confirmation {
        return Err(ValidationError::PasswordMismatch);
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(SecretString::from(password.to_string()))
}

/// # Errors
///
/// Returns `InvalidPostalCode` unless the value is exactly five digits.
pub fn postal_code(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.len() == POSTAL_CODE_DIGITS && trimmed.chars().all(|c| c.is_ascii_digit()) {
        Ok(trimmed.to_string())
    } else {
        Err(ValidationError::InvalidPostalCode)
    }
}

/// Resolve a reset form's email-or-phone into an OTP target.
///
/// # Errors
///
/// Returns `MissingFields` if neither is given, `AmbiguousTarget` if both
/// are, or the email/phone error for a malformed value.
pub fn otp_target(
    correo: Option<&str>,
    telefono: Option<&str>,
) -> Result<OtpTarget, ValidationError> {
    let correo = correo.map(str::trim).filter(|v| !v.is_empty());
    let telefono = telefono.map(str::trim).filter(|v| !v.is_empty());
    match (correo, telefono) {
        (Some(correo), None) => email(correo).map(OtpTarget::Email),
        (None, Some(telefono)) => phone(telefono).map(OtpTarget::Phone),
        (Some(_), Some(_)) => Err(ValidationError::AmbiguousTarget),
        (None, None) => Err(ValidationError::MissingFields),
    }
}

/// # Errors
///
/// Returns `MissingCode` when the code is blank.
pub fn otp_code(value: &str) -> Result<String, ValidationError> {
    let code: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    if code.is_empty() {
        return Err(ValidationError::MissingCode);
    }
    Ok(code)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_require_all() {
        assert!(require_all(&["a", "b"]).is_ok());
        assert_eq!(require_all(&["a", "  "]), Err(ValidationError::MissingFields));
    }

    #[test]
    fn test_new_password_precedence() {
        assert_eq!(
            new_password("", "").unwrap_err(),
            ValidationError::MissingFields
        );
        assert_eq!(
            new_password("abc", "abd").unwrap_err(),
            ValidationError::PasswordMismatch
        );
        assert_eq!(
            new_password("abc", "abc").unwrap_err(),
            ValidationError::PasswordTooShort
        );
        assert_eq!(
            new_password("secreto1", "secreto1").unwrap().expose_secret(),
            "secreto1"
        );
    }

    #[test]
    fn test_messages_are_spanish() {
        assert_eq!(
            ValidationError::PasswordMismatch.to_string(),
            "Las contraseñas no coinciden."
        );
        assert_eq!(
            ValidationError::InvalidPhone.to_string(),
            "Ingresa un número de teléfono válido de 10 dígitos."
        );
        assert_eq!(
            ValidationError::MissingFields.to_string(),
            "Completa todos los campos."
        );
    }

    #[test]
    fn test_postal_code() {
        assert_eq!(postal_code(" 06600 ").unwrap(), "06600");
        assert!(postal_code("6600").is_err());
        assert!(postal_code("0660a").is_err());
    }

    #[test]
    fn test_otp_target() {
        assert!(matches!(
            otp_target(Some("ana@correo.mx"), None),
            Ok(OtpTarget::Email(_))
        ));
        assert!(matches!(
            otp_target(Some(""), Some("55 1234 5678")),
            Ok(OtpTarget::Phone(_))
        ));
        assert_eq!(
            otp_target(None, None).unwrap_err(),
            ValidationError::MissingFields
        );
        assert_eq!(
            otp_target(Some("ana@correo.mx"), Some("5512345678")).unwrap_err(),
            ValidationError::AmbiguousTarget
        );
        assert_eq!(
            otp_target(None, Some("123")).unwrap_err(),
            ValidationError::InvalidPhone
        );
    }

    #[test]
    fn test_otp_code_strips_spaces() {
        assert_eq!(otp_code(" 123 456 ").unwrap(), "123456");
        assert_eq!(otp_code("  ").unwrap_err(), ValidationError::MissingCode);
    }
}
