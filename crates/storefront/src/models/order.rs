//! Checkout form and order submission payloads.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tienda_core::{OrderStatus, PaymentStatus};

use super::cart::{CartItem, CartSummary};
use super::user::UserProjection;

/// Shipping and contact details entered at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutForm {
    pub nombre: String,
    pub apellidos: String,
    pub email: String,
    pub telefono: String,
    pub calle: String,
    pub colonia: String,
    pub codigo_postal: String,
    pub ciudad: String,
    pub estado: String,
    pub referencias: String,
}

impl CheckoutForm {
    /// Fill blank name and email fields from the signed-in user.
    pub fn prefill(&mut self, user: &UserProjection) {
        if self.nombre.trim().is_empty() {
            self.nombre.clone_from(&user.nombre);
        }
        if self.apellidos.trim().is_empty() {
            self.apellidos = user.surnames();
        }
        if self.email.trim().is_empty()
            && let Some(email) = &user.email
        {
            self.email.clone_from(email);
        }
        if self.telefono.trim().is_empty()
            && let Some(phone) = &user.phone
        {
            self.telefono.clone_from(phone);
        }
    }
}

/// Body posted to `procesar_pedido.php`.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    pub items: Vec<CartItem>,
    #[serde(flatten)]
    pub form: CheckoutForm,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub envio: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

impl OrderRequest {
    #[must_use]
    pub fn new(summary: CartSummary, form: CheckoutForm) -> Self {
        Self {
            items: summary.items,
            form,
            subtotal: summary.subtotal,
            envio: summary.shipping,
            total: summary.total,
        }
    }
}

/// Reply from `procesar_pedido.php`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, deserialize_with = "super::lenient::string_or_number")]
    pub id_pedido: Option<String>,
    #[serde(default)]
    pub whatsapp_url: Option<String>,
    #[serde(default, deserialize_with = "super::lenient::known_status")]
    pub estado_pedido: Option<OrderStatus>,
    #[serde(default, deserialize_with = "super::lenient::known_status")]
    pub estado_pago: Option<PaymentStatus>,
}
