//! Checkout route handler.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::{ClientContext, JsonBody};
use crate::models::CheckoutForm;
use crate::orders::{CheckoutReceipt, checkout};
use crate::state::AppState;

/// `POST /api/checkout`
///
/// Submits the cart with the shipping form. On success the cart is empty.
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    mut ctx: ClientContext,
    JsonBody(form): JsonBody<CheckoutForm>,
) -> Result<Json<CheckoutReceipt>> {
    let result = checkout(state.catalog(), &ctx.auth, &mut ctx.cart, form).await;
    ctx.save().await?;
    let receipt = result?;

    add_breadcrumb(
        "checkout",
        "Order placed",
        &[("order_id", receipt.order_id.clone().unwrap_or_default())],
    );
    Ok(Json(receipt))
}
