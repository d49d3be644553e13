//! Per-request client context.
//!
//! Rebuilds one browser's auth bridge and cart from the tower session at the
//! start of a request. Handlers that change either call
//! [`ClientContext::save`] before responding, on errors too. A session
//! refreshed during extraction is written back immediately.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use tracing::Span;

use tienda_core::GuestId;

use crate::auth::{AuthBridge, ProviderSession, StoredSession};
use crate::cart::{CartIdentity, CartKeys, CartManager};
use crate::error::AppError;
use crate::models::session_keys;
use crate::state::AppState;

/// Auth bridge and cart for the client making the request.
///
/// The cart follows the bridge, so a sign-in during the request merges the
/// guest cart on the next cart operation (or an explicit
/// [`CartManager::sync_with_auth`]).
pub struct ClientContext {
    session: Session,
    pub auth: AuthBridge,
    pub cart: CartManager,
}

impl FromRequestParts<AppState> for ClientContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer not installed".to_string()))?;

        let guest = if let Some(guest) = session.get::<GuestId>(session_keys::GUEST_ID).await? {
            guest
        } else {
            let guest = GuestId::generate();
            session.insert(session_keys::GUEST_ID, guest).await?;
            guest
        };

        let stored: Option<StoredSession> = session.get(session_keys::AUTH_SESSION).await?;
        let identity: CartIdentity = session
            .get(session_keys::CART_IDENTITY)
            .await?
            .unwrap_or_default();

        let stored = stored.map(ProviderSession::from);
        let rotated = stored.as_ref().is_some_and(ProviderSession::is_expired);

        let auth = AuthBridge::new(state.identity(), state.config().password_recovery_url());
        auth.restore(stored).await;
        if rotated {
            // Refresh rotated the tokens; the stored pair is already revoked.
            write_auth_session(&session, &auth).await?;
        }

        if let Some(user_id) = auth.snapshot().user_id() {
            Span::current().record("user_id", tracing::field::display(user_id));
        }

        let cart_config = &state.config().cart;
        let keys = CartKeys::new(cart_config.key_prefix.clone(), guest);
        let mut cart =
            CartManager::load(state.cart_storage(), cart_config.policy, keys, identity).await;
        cart.follow(auth.subscribe()).await;

        Ok(Self {
            session,
            auth,
            cart,
        })
    }
}

impl ClientContext {
    /// Write the auth session and cart binding back to the browser session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn save(&mut self) -> Result<(), AppError> {
        self.cart.sync_with_auth().await;
        write_auth_session(&self.session, &self.auth).await?;

        self.session
            .insert(session_keys::CART_IDENTITY, self.cart.identity())
            .await?;
        Ok(())
    }
}

async fn write_auth_session(session: &Session, auth: &AuthBridge) -> Result<(), AppError> {
    match auth.session() {
        Some(provider_session) => {
            session
                .insert(
                    session_keys::AUTH_SESSION,
                    StoredSession::from(&provider_session),
                )
                .await?;
        }
        None => {
            session
                .remove::<StoredSession>(session_keys::AUTH_SESSION)
                .await?;
        }
    }
    Ok(())
}
