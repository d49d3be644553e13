//! Authentication route handlers.
//!
//! Provider tokens never reach the browser: they stay in the server-side
//! session and the client only sees the [`SessionView`].

use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::auth::{AuthEvent, AuthState, RegisterOutcome};
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{ClientContext, JsonBody};
use crate::models::{LoginForm, RegisterForm, ResetConfirmForm, ResetRequestForm, UserProjection};

const PASSWORD_UPDATED: &str = "Tu contraseña se actualizó. Inicia sesión con tu nueva contraseña.";
const CONFIRMATION_PENDING: &str = "Revisa tu correo para confirmar tu cuenta.";

/// Auth snapshot exposed to the browser.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub logged_in: bool,
    pub event: AuthEvent,
    pub user: Option<UserProjection>,
    /// Units in the cart, for the navbar badge.
    pub cart_count: u32,
}

impl SessionView {
    fn new(state: &AuthState, cart_count: u32) -> Self {
        Self {
            logged_in: state.is_logged_in(),
            event: state.event,
            user: state.user(),
            cart_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl From<&str> for MessageResponse {
    fn from(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegisterResponse {
    SignedIn { session: SessionView },
    ConfirmationRequired { email: String, message: String },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResetLinkRequest {
    pub correo: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PhoneRequest {
    pub telefono: String,
}

async fn session_view(ctx: &mut ClientContext) -> Result<Json<SessionView>> {
    ctx.save().await?;
    Ok(Json(SessionView::new(
        &ctx.auth.snapshot(),
        ctx.cart.item_count(),
    )))
}

/// `GET /api/auth/session`
#[instrument(skip_all)]
pub async fn session(mut ctx: ClientContext) -> Result<Json<SessionView>> {
    session_view(&mut ctx).await
}

/// `POST /api/auth/login`
///
/// A guest cart is merged into the user's cart before responding.
#[instrument(skip_all)]
pub async fn login(
    mut ctx: ClientContext,
    JsonBody(form): JsonBody<LoginForm>,
) -> Result<Json<SessionView>> {
    let user = ctx.auth.login(&form).await?;
    set_sentry_user(&user.id, user.email.as_deref());
    session_view(&mut ctx).await
}

/// `POST /api/auth/register`
#[instrument(skip_all)]
pub async fn register(
    mut ctx: ClientContext,
    JsonBody(form): JsonBody<RegisterForm>,
) -> Result<Json<RegisterResponse>> {
    match ctx.auth.register(&form).await? {
        RegisterOutcome::SignedIn(user) => {
            set_sentry_user(&user.id, user.email.as_deref());
            let Json(session) = session_view(&mut ctx).await?;
            Ok(Json(RegisterResponse::SignedIn { session }))
        }
        RegisterOutcome::ConfirmationRequired { email } => {
            ctx.save().await?;
            Ok(Json(RegisterResponse::ConfirmationRequired {
                email,
                message: CONFIRMATION_PENDING.to_string(),
            }))
        }
    }
}

/// `POST /api/auth/logout`
///
/// The cart falls back to the guest cart.
#[instrument(skip_all)]
pub async fn logout(mut ctx: ClientContext) -> Result<Json<SessionView>> {
    ctx.auth.logout().await;
    clear_sentry_user();
    session_view(&mut ctx).await
}

/// `POST /api/auth/password/reset-request`
#[instrument(skip_all)]
pub async fn request_password_reset(
    ctx: ClientContext,
    JsonBody(form): JsonBody<ResetRequestForm>,
) -> Result<Json<MessageResponse>> {
    let message = ctx.auth.request_password_reset(&form).await?;
    Ok(Json(message.into()))
}

/// `POST /api/auth/password/reset-link`
#[instrument(skip_all)]
pub async fn send_password_reset_link(
    ctx: ClientContext,
    JsonBody(request): JsonBody<ResetLinkRequest>,
) -> Result<Json<MessageResponse>> {
    let message = ctx.auth.send_password_reset_link(&request.correo).await?;
    Ok(Json(message.into()))
}

/// `POST /api/auth/password/reset-confirm`
///
/// Always ends signed out; the customer logs in with the new password.
#[instrument(skip_all)]
pub async fn confirm_password_reset(
    mut ctx: ClientContext,
    JsonBody(form): JsonBody<ResetConfirmForm>,
) -> Result<Json<MessageResponse>> {
    let result = ctx.auth.confirm_password_reset(&form).await;
    ctx.save().await?;
    result?;
    clear_sentry_user();
    Ok(Json(PASSWORD_UPDATED.into()))
}

/// `POST /api/auth/phone`
#[instrument(skip_all)]
pub async fn update_phone(
    mut ctx: ClientContext,
    JsonBody(request): JsonBody<PhoneRequest>,
) -> Result<Json<SessionView>> {
    if let Err(err) = ctx.auth.update_phone(&request.telefono).await {
        // A token refresh may have happened before the failure.
        ctx.save().await?;
        return Err(err.into());
    }
    session_view(&mut ctx).await
}
