//! Order submission and checkout.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;
use tienda_core::{OrderStatus, PaymentStatus, Price};
use tracing::{error, info, instrument, warn};

use crate::auth::AuthBridge;
use crate::cart::CartManager;
use crate::catalog::{CatalogClient, CatalogError};
use crate::models::{CartSummary, CheckoutForm, OrderRequest, OrderResponse};
use crate::validation::{self, ValidationError};

const DEFAULT_REJECTION: &str = "No se pudo procesar el pedido. Intenta de nuevo.";

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Tu carrito está vacío.")]
    EmptyCart,

    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The order backend answered with `success: false`.
    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Confirmation shown after a successful order.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutReceipt {
    pub message: String,
    pub order_id: Option<String>,
    pub whatsapp_url: Option<String>,
    pub total: Price,
    /// New orders are pending until the store confirms them.
    pub estado_pedido: OrderStatus,
    pub estado_pago: PaymentStatus,
    /// Cart as it was when the order was placed.
    pub summary: CartSummary,
}

impl CatalogClient {
    /// POST an order to `procesar_pedido.php`.
    ///
    /// Signed-in customers send their access token so the order is linked
    /// to their account.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the reply is unreadable.
    /// A `success: false` reply is returned as-is.
    #[instrument(skip_all, fields(items = order.items.len(), authenticated = token.is_some()))]
    pub async fn submit_order(
        &self,
        order: &OrderRequest,
        token: Option<&SecretString>,
    ) -> Result<OrderResponse, CatalogError> {
        let mut request = self
            .http()
            .post(self.endpoint("procesar_pedido.php")?)
            .json(order);
        if let Some(token) = token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<OrderResponse>(&body) {
            Ok(reply) => Ok(reply),
            Err(_) if !status.is_success() => {
                error!(
                    status = %status,
                    body = %body.chars().take(500).collect::<String>(),
                    "Order API returned non-success status"
                );
                Err(CatalogError::Status {
                    status: status.as_u16(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Validate the form and normalize email and phone in place.
///
/// # Errors
///
/// Returns the first failing check: required fields (all but
/// `referencias`), email, phone, then postal code.
pub fn validate_checkout_form(form: &mut CheckoutForm) -> Result<(), ValidationError> {
    validation::require_all(&[
        form.nombre.as_str(),
        form.apellidos.as_str(),
        form.email.as_str(),
        form.telefono.as_str(),
        form.calle.as_str(),
        form.colonia.as_str(),
        form.codigo_postal.as_str(),
        form.ciudad.as_str(),
        form.estado.as_str(),
    ])?;

    form.email = validation::email(&form.email)?.into_inner();
    form.telefono = validation::phone(&form.telefono)?.national().to_string();
    form.codigo_postal = validation::postal_code(&form.codigo_postal)?;
    Ok(())
}

/// Place an order for the current cart.
///
/// Blank name, surname, email and phone fields are filled from the
/// signed-in user. The cart is cleared only once the backend accepts the
/// order.
///
/// # Errors
///
/// Returns `EmptyCart`, a validation error, the backend's rejection
/// message, or a transport error.
#[instrument(skip_all)]
pub async fn checkout(
    catalog: &CatalogClient,
    auth: &AuthBridge,
    cart: &mut CartManager,
    mut form: CheckoutForm,
) -> Result<CheckoutReceipt, CheckoutError> {
    // Token first: a failed refresh signs out, which rebinds the cart.
    let token = auth.access_token().await;
    cart.sync_with_auth().await;

    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    if let Some(user) = auth.current_user() {
        form.prefill(&user);
    }
    validate_checkout_form(&mut form)?;

    let summary = cart.summary();
    let order = OrderRequest::new(summary.clone(), form);
    let reply = catalog.submit_order(&order, token.as_ref()).await?;

    if !reply.success {
        warn!(message = %reply.message, "Order rejected");
        let message = if reply.message.trim().is_empty() {
            DEFAULT_REJECTION.to_string()
        } else {
            reply.message
        };
        return Err(CheckoutError::Rejected(message));
    }

    cart.clear().await;
    let total = summary.total_price();
    let estado_pedido = reply.estado_pedido.unwrap_or_default();
    let estado_pago = reply.estado_pago.unwrap_or_default();
    info!(
        order_id = ?reply.id_pedido,
        total = %total,
        estado_pedido = %estado_pedido,
        estado_pago = %estado_pago,
        "Order placed"
    );

    Ok(CheckoutReceipt {
        message: reply.message,
        order_id: reply.id_pedido,
        whatsapp_url: reply.whatsapp_url,
        total,
        estado_pedido,
        estado_pago,
        summary,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> CheckoutForm {
        CheckoutForm {
            nombre: "Ana".to_string(),
            apellidos: "López Pérez".to_string(),
            email: " ana@correo.mx ".to_string(),
            telefono: "55 1234 5678".to_string(),
            calle: "Av. Juárez 10".to_string(),
            colonia: "Centro".to_string(),
            codigo_postal: "06000".to_string(),
            ciudad: "CDMX".to_string(),
            estado: "CDMX".to_string(),
            referencias: String::new(),
        }
    }

    #[test]
    fn test_valid_form_is_normalized() {
        let mut form = form();
        validate_checkout_form(&mut form).unwrap();
        assert_eq!(form.email, "ana@correo.mx");
        assert_eq!(form.telefono, "5512345678");
    }

    #[test]
    fn test_references_are_optional_but_address_is_not() {
        let mut missing_street = CheckoutForm {
            calle: " ".to_string(),
            ..form()
        };
        assert_eq!(
            validate_checkout_form(&mut missing_street),
            Err(ValidationError::MissingFields)
        );
    }

    #[test]
    fn test_checks_run_in_order() {
        let mut bad_email = CheckoutForm {
            email: "ana".to_string(),
            telefono: "123".to_string(),
            ..form()
        };
        assert_eq!(
            validate_checkout_form(&mut bad_email),
            Err(ValidationError::InvalidEmail)
        );

        let mut bad_phone = CheckoutForm {
            telefono: "123".to_string(),
            ..form()
        };
        assert_eq!(
            validate_checkout_form(&mut bad_phone),
            Err(ValidationError::InvalidPhone)
        );

        let mut bad_postal_code = CheckoutForm {
            codigo_postal: "6000".to_string(),
            ..form()
        };
        assert_eq!(
            validate_checkout_form(&mut bad_postal_code),
            Err(ValidationError::InvalidPostalCode)
        );
    }

    #[test]
    fn test_empty_cart_message() {
        assert_eq!(CheckoutError::EmptyCart.to_string(), "Tu carrito está vacío.");
    }
}
