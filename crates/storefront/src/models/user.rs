//! Signed-in user projection and auth form payloads.

use serde::{Deserialize, Serialize};

use tienda_core::{Role, UserId};

/// Read-only view of the signed-in user, derived from the provider session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProjection {
    pub id: UserId,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub nombre: String,
    pub apellido_paterno: String,
    pub apellido_materno: String,
    #[serde(rename = "rol")]
    pub role: Role,
    pub email_verified: bool,
}

impl UserProjection {
    /// Both surnames joined by a space, skipping blanks.
    #[must_use]
    pub fn surnames(&self) -> String {
        [self.apellido_paterno.trim(), self.apellido_materno.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Name shown in the navbar: given name, else the email.
    #[must_use]
    pub fn display_name(&self) -> String {
        if self.nombre.trim().is_empty() {
            self.email.clone().unwrap_or_default()
        } else {
            self.nombre.trim().to_string()
        }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub correo: String,
    pub contrasena: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub nombre: String,
    pub apellido_paterno: String,
    pub apellido_materno: String,
    pub correo: String,
    pub contrasena: String,
    pub confirmar_contrasena: String,
}

/// Where to send a password reset code. Exactly one of the two is set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResetRequestForm {
    pub correo: Option<String>,
    pub telefono: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResetConfirmForm {
    pub correo: Option<String>,
    pub telefono: Option<String>,
    pub codigo: String,
    pub nueva_contrasena: String,
    pub confirmar_contrasena: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn projection(nombre: &str, paterno: &str, materno: &str) -> UserProjection {
        UserProjection {
            id: UserId::new(Uuid::nil()),
            email: Some("cliente@correo.mx".to_string()),
            phone: None,
            nombre: nombre.to_string(),
            apellido_paterno: paterno.to_string(),
            apellido_materno: materno.to_string(),
            role: Role::default(),
            email_verified: false,
        }
    }

    #[test]
    fn test_surnames_skip_blanks() {
        assert_eq!(projection("Ana", "López", "").surnames(), "López");
        assert_eq!(projection("Ana", "López", "Ruiz").surnames(), "López Ruiz");
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        assert_eq!(projection("", "", "").display_name(), "cliente@correo.mx");
        assert_eq!(projection(" Ana ", "", "").display_name(), "Ana");
    }
}
