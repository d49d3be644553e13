//! Cart route handlers.
//!
//! Every handler answers with the cart summary so the client can redraw
//! the cart and the navbar badge from one response.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use tienda_core::ProductId;

use crate::cart::AddOutcome;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{ClientContext, JsonBody};
use crate::models::CartSummary;
use crate::state::AppState;

const OUT_OF_STOCK: &str = "Producto agotado.";

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: i32,
    #[serde(default = "one")]
    pub quantity: u32,
}

const fn one() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct AddItemResponse {
    /// Units of the product now in the cart.
    pub quantity: u32,
    pub cart: CartSummary,
}

/// `GET /api/cart`
#[instrument(skip_all)]
pub async fn show(mut ctx: ClientContext) -> Result<Json<CartSummary>> {
    ctx.save().await?;
    Ok(Json(ctx.cart.summary()))
}

/// `POST /api/cart/items`
///
/// Price, name, image and stock come from the catalog, not the request.
#[instrument(skip(state, ctx))]
pub async fn add_item(
    State(state): State<AppState>,
    mut ctx: ClientContext,
    JsonBody(request): JsonBody<AddItemRequest>,
) -> Result<Json<AddItemResponse>> {
    let product = state
        .catalog()
        .product(ProductId::new(request.product_id))
        .await?;

    let outcome = ctx.cart.add_item(product.to_cart_item(request.quantity)).await;
    ctx.save().await?;

    match outcome {
        AddOutcome::Added { quantity } => {
            info!(product_id = request.product_id, quantity, "Added to cart");
            add_breadcrumb(
                "cart",
                "Added to cart",
                &[("product_id", request.product_id.to_string())],
            );
            Ok(Json(AddItemResponse {
                quantity,
                cart: ctx.cart.summary(),
            }))
        }
        AddOutcome::OutOfStock => Err(AppError::Conflict(OUT_OF_STOCK.to_string())),
    }
}

/// `PATCH /api/cart/items/{product_id}`
///
/// Zero or a negative quantity removes the line.
#[instrument(skip(ctx))]
pub async fn update_item(
    mut ctx: ClientContext,
    Path(product_id): Path<i32>,
    JsonBody(request): JsonBody<UpdateQuantityRequest>,
) -> Result<Json<CartSummary>> {
    ctx.cart
        .update_quantity(ProductId::new(product_id), request.quantity)
        .await;
    ctx.save().await?;
    Ok(Json(ctx.cart.summary()))
}

/// `DELETE /api/cart/items/{product_id}`
#[instrument(skip(ctx))]
pub async fn remove_item(
    mut ctx: ClientContext,
    Path(product_id): Path<i32>,
) -> Result<Json<CartSummary>> {
    ctx.cart.remove_item(ProductId::new(product_id)).await;
    ctx.save().await?;
    Ok(Json(ctx.cart.summary()))
}

/// `DELETE /api/cart`
#[instrument(skip_all)]
pub async fn clear(mut ctx: ClientContext) -> Result<Json<CartSummary>> {
    ctx.cart.clear().await;
    ctx.save().await?;
    Ok(Json(ctx.cart.summary()))
}
