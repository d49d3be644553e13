//! Auth/session bridge.
//!
//! [`AuthBridge`] mirrors the identity provider's session for one client.
//! It publishes an [`AuthState`] snapshot over a `tokio::sync::watch`
//! channel every time the session changes (initial load, sign-in, refresh,
//! sign-out, ...), so dependents such as the cart react without polling.
//!
//! # Example
//!
//! ```rust,ignore
//! let bridge = AuthBridge::new(provider, "https://tienda.mx/restablecer-contrasena");
//! bridge.restore(stored_session).await;
//!
//! let mut rx = bridge.subscribe();
//! bridge.login(&form).await?;
//! assert!(rx.has_changed()?);
//! ```

pub mod error;
pub mod memory;
pub mod messages;
pub mod provider;
pub mod supabase;

use std::sync::Arc;

use secrecy::SecretString;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use tienda_core::{Role, UserId};

use crate::models::{LoginForm, RegisterForm, ResetConfirmForm, ResetRequestForm, UserProjection};
use crate::validation;

pub use error::AuthFailure;
pub use memory::InMemoryIdentityProvider;
pub use messages::{AuthOperation, translate, translate_for};
pub use provider::{
    IdentityProvider, OtpTarget, Profile, ProviderError, ProviderSession, ProviderUser,
    SignUpRequest, SignUpResult, StoredSession, UserMetadata, UserUpdate,
};
pub use supabase::SupabaseAuth;

/// Why the session snapshot last changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
    PasswordRecovery,
}

/// Snapshot published to subscribers.
#[derive(Debug, Clone)]
pub struct AuthState {
    pub event: AuthEvent,
    pub session: Option<ProviderSession>,
    /// An auth operation is in flight.
    pub loading: bool,
}

impl AuthState {
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn user(&self) -> Option<UserProjection> {
        self.session.as_ref().map(|session| session.user.projection())
    }

    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.session.as_ref().map(|session| session.user.id)
    }
}

/// Result of a registration.
#[derive(Debug, Clone)]
pub enum RegisterOutcome {
    /// The account is active and the client is signed in.
    SignedIn(UserProjection),
    /// The provider emailed a confirmation link; the client stays signed out.
    ConfirmationRequired { email: String },
}

/// Clears the loading flag when an operation finishes, however it ends.
struct LoadingGuard<'a>(&'a watch::Sender<AuthState>);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.send_modify(|state| state.loading = false);
    }
}

/// Per-client bridge to the identity provider.
pub struct AuthBridge {
    provider: Arc<dyn IdentityProvider>,
    state: watch::Sender<AuthState>,
    recovery_redirect: String,
}

impl AuthBridge {
    /// Create a signed-out bridge.
    ///
    /// `recovery_redirect` is where password recovery links land.
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>, recovery_redirect: impl Into<String>) -> Self {
        let (state, _) = watch::channel(AuthState {
            event: AuthEvent::InitialSession,
            session: None,
            loading: false,
        });

        Self {
            provider,
            state,
            recovery_redirect: recovery_redirect.into(),
        }
    }

    /// Load a previously stored session and publish the initial snapshot.
    ///
    /// Expired sessions are refreshed first; if that fails the client
    /// starts signed out.
    pub async fn restore(&self, stored: Option<ProviderSession>) {
        let session = match stored {
            Some(session) if session.is_expired() => {
                match self.provider.refresh_session(&session.refresh_token).await {
                    Ok(fresh) => Some(fresh),
                    Err(err) => {
                        warn!(error = %err, user_id = %session.user.id, "Session refresh failed, signing out");
                        None
                    }
                }
            }
            other => other,
        };
        self.emit(AuthEvent::InitialSession, session);
    }

    /// Subscribe to snapshot changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> AuthState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.state.borrow().is_logged_in()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<UserProjection> {
        self.state.borrow().user()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Session to persist at the end of the request.
    #[must_use]
    pub fn session(&self) -> Option<ProviderSession> {
        self.state.borrow().session.clone()
    }

    /// Access token for calls made on the user's behalf.
    ///
    /// Refreshes an expired session; a failed refresh signs the client out.
    pub async fn access_token(&self) -> Option<SecretString> {
        let session = self.session()?;
        if !session.is_expired() {
            return Some(session.access_token);
        }

        match self.provider.refresh_session(&session.refresh_token).await {
            Ok(fresh) => {
                let token = fresh.access_token.clone();
                self.emit(AuthEvent::TokenRefreshed, Some(fresh));
                Some(token)
            }
            Err(err) => {
                warn!(error = %err, "Token refresh failed, signing out");
                self.emit(AuthEvent::SignedOut, None);
                None
            }
        }
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns a validation failure for blank or malformed input, or the
    /// translated provider message.
    #[instrument(skip(self, form), fields(email = %form.correo.trim()))]
    pub async fn login(&self, form: &LoginForm) -> Result<UserProjection, AuthFailure> {
        validation::require_all(&[form.correo.as_str(), form.contrasena.as_str()])?;
        let email = validation::email(&form.correo)?;
        let password = SecretString::from(form.contrasena.clone());

        let _loading = self.begin();
        let session = self
            .provider
            .sign_in_with_password(&email, &password)
            .await
            .map_err(|err| AuthFailure::provider(AuthOperation::Login, err))?;

        let user = session.user.projection();
        self.emit(AuthEvent::SignedIn, Some(session));
        info!(user_id = %user.id, "Customer signed in");
        Ok(user)
    }

    /// Create an account.
    ///
    /// When the provider returns a session the profile row is upserted and
    /// the client is signed in. A failed profile upsert is logged and does
    /// not fail the registration.
    ///
    /// # Errors
    ///
    /// Returns a validation failure or the translated provider message.
    #[instrument(skip(self, form), fields(email = %form.correo.trim()))]
    pub async fn register(&self, form: &RegisterForm) -> Result<RegisterOutcome, AuthFailure> {
        validation::require_all(&[
            form.nombre.as_str(),
            form.apellido_paterno.as_str(),
            form.correo.as_str(),
            form.contrasena.as_str(),
            form.confirmar_contrasena.as_str(),
        ])?;
        let email = validation::email(&form.correo)?;
        let password = validation::new_password(&form.contrasena, &form.confirmar_contrasena)?;

        let metadata = UserMetadata {
            nombre: Some(form.nombre.trim().to_string()),
            apellido_paterno: Some(form.apellido_paterno.trim().to_string()),
            apellido_materno: Some(form.apellido_materno.trim().to_string()),
            rol: None,
        };
        let request = SignUpRequest {
            email: email.clone(),
            password,
            metadata,
        };

        let _loading = self.begin();
        let result = self
            .provider
            .sign_up(&request)
            .await
            .map_err(|err| AuthFailure::provider(AuthOperation::Register, err))?;

        match result {
            SignUpResult::Session(session) => {
                let profile = Profile {
                    id: session.user.id,
                    nombre: form.nombre.trim().to_string(),
                    apellido_paterno: form.apellido_paterno.trim().to_string(),
                    apellido_materno: form.apellido_materno.trim().to_string(),
                    correo: email.to_string(),
                    rol: Role::Cliente,
                };
                if let Err(err) = self
                    .provider
                    .upsert_profile(&session.access_token, &profile)
                    .await
                {
                    warn!(error = %err, user_id = %profile.id, "Profile upsert failed");
                }

                let user = session.user.projection();
                self.emit(AuthEvent::SignedIn, Some(session));
                info!(user_id = %user.id, "Customer registered");
                Ok(RegisterOutcome::SignedIn(user))
            }
            SignUpResult::ConfirmationRequired(_) => {
                info!("Customer registered, confirmation pending");
                Ok(RegisterOutcome::ConfirmationRequired {
                    email: email.into_inner(),
                })
            }
        }
    }

    /// Sign out.
    ///
    /// The local session is always cleared. A provider failure is logged;
    /// the tokens expire on their own.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        let Some(session) = self.session() else {
            return;
        };

        let _loading = self.begin();
        if let Err(err) = self.provider.sign_out(&session.access_token).await {
            warn!(error = %err, "Provider sign-out failed");
        }
        self.emit(AuthEvent::SignedOut, None);
        info!(user_id = %session.user.id, "Customer signed out");
    }

    /// Send a one-time reset code by email or SMS.
    ///
    /// Returns the confirmation message to show.
    ///
    /// # Errors
    ///
    /// Returns a validation failure or the translated provider message.
    #[instrument(skip(self, form))]
    pub async fn request_password_reset(
        &self,
        form: &ResetRequestForm,
    ) -> Result<&'static str, AuthFailure> {
        let target = validation::otp_target(form.correo.as_deref(), form.telefono.as_deref())?;

        let _loading = self.begin();
        self.provider
            .send_otp(&target)
            .await
            .map_err(|err| AuthFailure::provider(AuthOperation::ResetRequest, err))?;

        Ok(match target {
            OtpTarget::Email(_) => "Te enviamos un código de verificación a tu correo.",
            OtpTarget::Phone(_) => "Te enviamos un código de verificación por SMS.",
        })
    }

    /// Email a recovery link that lands on the reset page.
    ///
    /// # Errors
    ///
    /// Returns a validation failure or the translated provider message.
    #[instrument(skip(self))]
    pub async fn send_password_reset_link(&self, correo: &str) -> Result<&'static str, AuthFailure> {
        validation::require_all(&[correo])?;
        let email = validation::email(correo)?;

        let _loading = self.begin();
        self.provider
            .send_recovery_email(&email, &self.recovery_redirect)
            .await
            .map_err(|err| AuthFailure::provider(AuthOperation::ResetRequest, err))?;

        Ok("Te enviamos un enlace para restablecer tu contraseña.")
    }

    /// Set a new password and sign out.
    ///
    /// With an email or phone in the form the code is verified first, which
    /// opens a recovery session. Without one, the current session (for
    /// example one opened from a recovery link) is used.
    ///
    /// # Errors
    ///
    /// Returns a validation failure, [`AuthFailure::NotSignedIn`] when there
    /// is neither a code nor a session, or the translated provider message.
    #[instrument(skip(self, form))]
    pub async fn confirm_password_reset(&self, form: &ResetConfirmForm) -> Result<(), AuthFailure> {
        let has_target = [&form.correo, &form.telefono]
            .iter()
            .any(|value| value.as_deref().is_some_and(|v| !v.trim().is_empty()));

        let target = if has_target {
            let target = validation::otp_target(form.correo.as_deref(), form.telefono.as_deref())?;
            Some((target, validation::otp_code(&form.codigo)?))
        } else {
            None
        };
        let password = validation::new_password(&form.nueva_contrasena, &form.confirmar_contrasena)?;

        let _loading = self.begin();
        if let Some((target, code)) = target {
            let session = self
                .provider
                .verify_otp(&target, &code)
                .await
                .map_err(|err| AuthFailure::provider(AuthOperation::ResetConfirm, err))?;
            self.emit(AuthEvent::PasswordRecovery, Some(session));
        }

        let Some(access_token) = self.access_token().await else {
            return Err(AuthFailure::NotSignedIn);
        };

        let update = UserUpdate {
            password: Some(password),
            phone: None,
        };
        let result = self
            .provider
            .update_user(&access_token, &update)
            .await
            .map_err(|err| AuthFailure::provider(AuthOperation::ResetConfirm, err));

        if let Err(err) = self.provider.sign_out(&access_token).await {
            warn!(error = %err, "Provider sign-out after password reset failed");
        }
        self.emit(AuthEvent::SignedOut, None);

        result?;
        info!("Password reset completed");
        Ok(())
    }

    /// Change the signed-in user's phone number.
    ///
    /// # Errors
    ///
    /// Returns [`AuthFailure::NotSignedIn`], a validation failure, or the
    /// translated provider message.
    #[instrument(skip(self))]
    pub async fn update_phone(&self, telefono: &str) -> Result<UserProjection, AuthFailure> {
        let phone = validation::phone(telefono)?;
        let Some(access_token) = self.access_token().await else {
            return Err(AuthFailure::NotSignedIn);
        };

        let _loading = self.begin();
        let user = self
            .provider
            .update_user(
                &access_token,
                &UserUpdate {
                    password: None,
                    phone: Some(phone),
                },
            )
            .await
            .map_err(|err| AuthFailure::provider(AuthOperation::UpdatePhone, err))?;

        let projection = user.projection();
        self.state.send_modify(|state| {
            state.event = AuthEvent::UserUpdated;
            if let Some(session) = state.session.as_mut() {
                session.user = user;
            }
        });
        Ok(projection)
    }

    fn begin(&self) -> LoadingGuard<'_> {
        self.state.send_modify(|state| state.loading = true);
        LoadingGuard(&self.state)
    }

    fn emit(&self, event: AuthEvent, session: Option<ProviderSession>) {
        self.state.send_modify(|state| {
            state.event = event;
            state.session = session;
        });
    }
}
