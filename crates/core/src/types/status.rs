//! Account roles and order statuses.
//!
//! Values match the strings stored in the identity provider's user metadata
//! and in the order backend's `estado_pedido`/`estado_pago` columns.

use serde::{Deserialize, Serialize};

/// Account role stored in the user's metadata (`rol`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Store owner, can manage staff.
    SuperAdmin,
    /// Store administrator.
    Admin,
    /// Store staff.
    Empleado,
    /// Regular customer.
    #[default]
    Cliente,
}

impl Role {
    /// Whether the role can access back-office features.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin | Self::SuperAdmin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SuperAdmin => write!(f, "super_admin"),
            Self::Admin => write!(f, "admin"),
            Self::Empleado => write!(f, "empleado"),
            Self::Cliente => write!(f, "cliente"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "empleado" => Ok(Self::Empleado),
            "cliente" => Ok(Self::Cliente),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// Fulfilment state of an order (`estado_pedido`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Received, waiting for the store to confirm it over WhatsApp.
    #[default]
    Pendiente,
    Confirmado,
    Enviado,
    Entregado,
    Cancelado,
}

impl OrderStatus {
    /// Whether the order can no longer change.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        matches!(self, Self::Entregado | Self::Cancelado)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pendiente => write!(f, "pendiente"),
            Self::Confirmado => write!(f, "confirmado"),
            Self::Enviado => write!(f, "enviado"),
            Self::Entregado => write!(f, "entregado"),
            Self::Cancelado => write!(f, "cancelado"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pendiente" => Ok(Self::Pendiente),
            "confirmado" => Ok(Self::Confirmado),
            "enviado" => Ok(Self::Enviado),
            "entregado" => Ok(Self::Entregado),
            "cancelado" => Ok(Self::Cancelado),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Payment state of an order (`estado_pago`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pendiente,
    Pagado,
    Rechazado,
    Reembolsado,
}

impl PaymentStatus {
    #[must_use]
    pub const fn is_paid(&self) -> bool {
        matches!(self, Self::Pagado)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pendiente => write!(f, "pendiente"),
            Self::Pagado => write!(f, "pagado"),
            Self::Rechazado => write!(f, "rechazado"),
            Self::Reembolsado => write!(f, "reembolsado"),
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pendiente" => Ok(Self::Pendiente),
            "pagado" => Ok(Self::Pagado),
            "rechazado" => Ok(Self::Rechazado),
            "reembolsado" => Ok(Self::Reembolsado),
            _ => Err(format!("invalid payment status: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip() {
        for role in [Role::SuperAdmin, Role::Admin, Role::Empleado, Role::Cliente] {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
        assert!("gerente".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_admin_check() {
        assert!(Role::SuperAdmin.is_admin());
        assert!(Role::Admin.is_admin());
        assert!(!Role::Empleado.is_admin());
        assert!(!Role::default().is_admin());
    }

    #[test]
    fn test_order_status_roundtrip() {
        for status in [
            OrderStatus::Pendiente,
            OrderStatus::Confirmado,
            OrderStatus::Enviado,
            OrderStatus::Entregado,
            OrderStatus::Cancelado,
        ] {
            assert_eq!(status.to_string().parse::<OrderStatus>().unwrap(), status);
        }
        assert_eq!(" Enviado ".parse::<OrderStatus>().unwrap(), OrderStatus::Enviado);
        assert!("perdido".parse::<OrderStatus>().is_err());
        assert!(OrderStatus::Cancelado.is_final());
        assert!(!OrderStatus::default().is_final());
    }

    #[test]
    fn test_payment_status_roundtrip() {
        for status in [
            PaymentStatus::Pendiente,
            PaymentStatus::Pagado,
            PaymentStatus::Rechazado,
            PaymentStatus::Reembolsado,
        ] {
            assert_eq!(status.to_string().parse::<PaymentStatus>().unwrap(), status);
        }
        assert!(PaymentStatus::Pagado.is_paid());
        assert!(!PaymentStatus::default().is_paid());
        assert_eq!(
            serde_json::to_value(PaymentStatus::Reembolsado).unwrap(),
            "reembolsado"
        );
    }
}
