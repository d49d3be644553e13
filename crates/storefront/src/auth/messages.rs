//! Spanish wording for identity provider errors.
//!
//! Provider messages are matched case-insensitively by substring against a
//! fixed table. The first hit wins. Messages with no entry are shown as the
//! provider wrote them.

use serde::Serialize;

/// Provider message fragment and the text shown to the customer.
const PROVIDER_MESSAGES: &[(&str, &str)] = &[
    ("invalid login credentials", "Correo o contraseña incorrectos."),
    (
        "email not confirmed",
        "Debes confirmar tu correo electrónico antes de iniciar sesión.",
    ),
    (
        "user already registered",
        "Ya existe una cuenta registrada con este correo.",
    ),
    (
        "password should be at least",
        "La contraseña debe tener al menos 6 caracteres.",
    ),
    (
        "unable to validate email address",
        "El correo electrónico no es válido.",
    ),
    (
        "rate limit",
        "Demasiados intentos. Espera unos minutos e inténtalo de nuevo.",
    ),
    (
        "token has expired or is invalid",
        "El código es inválido o ha expirado.",
    ),
    (
        "signups not allowed for otp",
        "No existe una cuenta asociada a este correo.",
    ),
    ("user not found", "No existe una cuenta asociada a este correo."),
    (
        "new password should be different",
        "La nueva contraseña debe ser diferente a la anterior.",
    ),
    (
        "failed to fetch",
        "No se pudo conectar con el servidor. Revisa tu conexión.",
    ),
    (
        "network",
        "No se pudo conectar con el servidor. Revisa tu conexión.",
    ),
];

/// Auth operation a failure came from. Picks the fallback message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthOperation {
    Login,
    Register,
    Logout,
    ResetRequest,
    ResetConfirm,
    UpdatePhone,
    Refresh,
}

impl AuthOperation {
    /// Message used when the provider gave no message at all.
    #[must_use]
    pub const fn fallback_message(self) -> &'static str {
        match self {
            Self::Login => "Error al iniciar sesión",
            Self::Register => "Error al registrarse",
            Self::Logout => "No se pudo cerrar sesión.",
            Self::ResetRequest => "No se pudo enviar el correo de recuperación.",
            Self::ResetConfirm => "No se pudo restablecer la contraseña.",
            Self::UpdatePhone => "No se pudo actualizar el teléfono.",
            Self::Refresh => "Tu sesión expiró. Inicia sesión de nuevo.",
        }
    }
}

/// Translate a provider message, falling back to the raw text.
#[must_use]
pub fn translate(raw: &str) -> String {
    let lower = raw.to_lowercase();
    PROVIDER_MESSAGES
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map_or_else(|| raw.to_string(), |(_, message)| (*message).to_string())
}

/// Translate for a specific operation; blank messages use its fallback.
#[must_use]
pub fn translate_for(operation: AuthOperation, raw: &str) -> String {
    if raw.trim().is_empty() {
        operation.fallback_message().to_string()
    } else {
        translate(raw)
    }
}
