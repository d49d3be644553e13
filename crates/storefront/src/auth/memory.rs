//! In-memory identity provider for local development and tests.
//!
//! Mirrors the provider behaviors the storefront depends on, including the
//! English error messages the translation table matches. One-time codes are
//! not delivered anywhere; they are logged and can be read back with
//! [`InMemoryIdentityProvider::last_otp`].

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use tienda_core::{Email, UserId};

use super::provider::{
    IdentityProvider, OtpTarget, Profile, ProviderError, ProviderSession, ProviderUser,
    SignUpRequest, SignUpResult, UserMetadata, UserUpdate,
};
use crate::validation::MIN_PASSWORD_LENGTH;

struct Account {
    user: ProviderUser,
    password: String,
}

#[derive(Default)]
struct State {
    accounts: HashMap<Email, Account>,
    /// Access token -> user.
    sessions: HashMap<String, UserId>,
    /// Refresh token -> user.
    refresh_tokens: HashMap<String, UserId>,
    otps: HashMap<OtpTarget, String>,
    profiles: HashMap<UserId, Profile>,
}

impl State {
    fn account_by_id(&mut self, id: UserId) -> Option<&mut Account> {
        self.accounts.values_mut().find(|account| account.user.id == id)
    }

    fn account_by_target(&self, target: &OtpTarget) -> Option<&Account> {
        self.accounts.values().find(|account| match target {
            OtpTarget::Email(email) => account.user.email.as_deref() == Some(email.as_str()),
            OtpTarget::Phone(phone) => account.user.phone.as_deref() == Some(phone.as_str()),
        })
    }

    fn issue_session(&mut self, user: ProviderUser, ttl: Duration) -> ProviderSession {
        let access = format!("access-{}", Uuid::new_v4());
        let refresh = format!("refresh-{}", Uuid::new_v4());
        self.sessions.insert(access.clone(), user.id);
        self.refresh_tokens.insert(refresh.clone(), user.id);

        ProviderSession {
            access_token: SecretString::from(access),
            refresh_token: SecretString::from(refresh),
            expires_at: Utc::now() + ttl,
            user,
        }
    }

    fn user_for_token(&self, access_token: &SecretString) -> Result<UserId, ProviderError> {
        self.sessions
            .get(access_token.expose_secret())
            .copied()
            .ok_or_else(|| ProviderError::api(401, "Invalid JWT: session not found"))
    }
}

/// Identity provider that keeps accounts in process memory.
pub struct InMemoryIdentityProvider {
    state: Mutex<State>,
    require_confirmation: bool,
    session_ttl: Duration,
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryIdentityProvider {
    /// New provider where sign-ups are confirmed immediately.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            require_confirmation: false,
            session_ttl: Duration::hours(1),
        }
    }

    /// Require email confirmation before new accounts can sign in.
    #[must_use]
    pub const fn with_email_confirmation(mut self) -> Self {
        self.require_confirmation = true;
        self
    }

    /// Lifetime of issued access tokens.
    #[must_use]
    pub const fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Seed a confirmed account and return its id.
    pub async fn add_user(&self, email: &Email, password: &str, metadata: UserMetadata) -> UserId {
        let id = UserId::new(Uuid::new_v4());
        let user = ProviderUser {
            id,
            email: Some(email.to_string()),
            phone: None,
            email_confirmed_at: Some(Utc::now()),
            user_metadata: metadata,
        };
        self.state.lock().await.accounts.insert(
            email.clone(),
            Account {
                user,
                password: password.to_string(),
            },
        );
        id
    }

    /// Last code sent to `target`, if it has not been used yet.
    pub async fn last_otp(&self, target: &OtpTarget) -> Option<String> {
        self.state.lock().await.otps.get(target).cloned()
    }

    /// Profile row upserted for `user_id`.
    pub async fn profile(&self, user_id: UserId) -> Option<Profile> {
        self.state.lock().await.profiles.get(&user_id).cloned()
    }

    /// Mark an account's email as confirmed.
    pub async fn confirm_email(&self, email: &Email) {
        if let Some(account) = self.state.lock().await.accounts.get_mut(email) {
            account.user.email_confirmed_at = Some(Utc::now());
        }
    }

    /// Revoke every access token, as if the provider restarted.
    pub async fn revoke_all_sessions(&self) {
        self.state.lock().await.sessions.clear();
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<ProviderSession, ProviderError> {
        let mut state = self.state.lock().await;
        let user = match state.accounts.get(email) {
            Some(account) if account.password == password.expose_secret() => account.user.clone(),
            _ => return Err(ProviderError::api(400, "Invalid login credentials")),
        };
        if self.require_confirmation && user.email_confirmed_at.is_none() {
            return Err(ProviderError::api(400, "Email not confirmed"));
        }
        Ok(state.issue_session(user, self.session_ttl))
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpResult, ProviderError> {
        if request.password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ProviderError::api(
                422,
                "Password should be at least 6 characters.",
            ));
        }

        let mut state = self.state.lock().await;
        if state.accounts.contains_key(&request.email) {
            return Err(ProviderError::api(422, "User already registered"));
        }

        let user = ProviderUser {
            id: UserId::new(Uuid::new_v4()),
            email: Some(request.email.to_string()),
            phone: None,
            email_confirmed_at: (!self.require_confirmation).then(Utc::now),
            user_metadata: request.metadata.clone(),
        };
        state.accounts.insert(
            request.email.clone(),
            Account {
                user: user.clone(),
                password: request.password.expose_secret().to_string(),
            },
        );

        if self.require_confirmation {
            info!(email = %request.email, "Confirmation email queued");
            Ok(SignUpResult::ConfirmationRequired(user))
        } else {
            Ok(SignUpResult::Session(
                state.issue_session(user, self.session_ttl),
            ))
        }
    }

    async fn sign_out(&self, access_token: &SecretString) -> Result<(), ProviderError> {
        let mut state = self.state.lock().await;
        let user_id = state.user_for_token(access_token)?;
        state.sessions.retain(|_, id| *id != user_id);
        state.refresh_tokens.retain(|_, id| *id != user_id);
        Ok(())
    }

    async fn refresh_session(
        &self,
        refresh_token: &SecretString,
    ) -> Result<ProviderSession, ProviderError> {
        let mut state = self.state.lock().await;
        let user_id = state
            .refresh_tokens
            .remove(refresh_token.expose_secret())
            .ok_or_else(|| {
                ProviderError::api(400, "Invalid Refresh Token: Refresh Token Not Found")
            })?;
        let user = state
            .account_by_id(user_id)
            .map(|account| account.user.clone())
            .ok_or_else(|| ProviderError::api(404, "User not found"))?;
        Ok(state.issue_session(user, self.session_ttl))
    }

    async fn send_otp(&self, target: &OtpTarget) -> Result<(), ProviderError> {
        let mut state = self.state.lock().await;
        if state.account_by_target(target).is_none() {
            return Err(ProviderError::api(422, "Signups not allowed for otp"));
        }

        let code = format!("{:06}", Uuid::new_v4().as_u128() % 1_000_000);
        info!(target = %target, code = %code, "One-time code issued");
        state.otps.insert(target.clone(), code);
        Ok(())
    }

    async fn verify_otp(
        &self,
        target: &OtpTarget,
        token: &str,
    ) -> Result<ProviderSession, ProviderError> {
        let mut state = self.state.lock().await;
        if state.otps.get(target).map(String::as_str) != Some(token) {
            return Err(ProviderError::api(403, "Token has expired or is invalid"));
        }
        state.otps.remove(target);

        let user_id = state
            .account_by_target(target)
            .map(|account| account.user.id)
            .ok_or_else(|| ProviderError::api(404, "User not found"))?;
        let account = state
            .account_by_id(user_id)
            .ok_or_else(|| ProviderError::api(404, "User not found"))?;
        if matches!(target, OtpTarget::Email(_)) {
            account.user.email_confirmed_at.get_or_insert_with(Utc::now);
        }
        let user = account.user.clone();
        Ok(state.issue_session(user, self.session_ttl))
    }

    async fn send_recovery_email(
        &self,
        email: &Email,
        redirect_to: &str,
    ) -> Result<(), ProviderError> {
        // GoTrue answers success for unknown addresses too.
        info!(email = %email, redirect_to, "Recovery email queued");
        Ok(())
    }

    async fn update_user(
        &self,
        access_token: &SecretString,
        update: &UserUpdate,
    ) -> Result<ProviderUser, ProviderError> {
        let mut state = self.state.lock().await;
        let user_id = state.user_for_token(access_token)?;
        let account = state
            .account_by_id(user_id)
            .ok_or_else(|| ProviderError::api(404, "User not found"))?;

        if let Some(password) = &update.password {
            let password = password.expose_secret();
            if password == account.password {
                return Err(ProviderError::api(
                    422,
                    "New password should be different from the old password.",
                ));
            }
            if password.chars().count() < MIN_PASSWORD_LENGTH {
                return Err(ProviderError::api(
                    422,
                    "Password should be at least 6 characters.",
                ));
            }
            account.password = password.to_string();
        }
        if let Some(phone) = &update.phone {
            account.user.phone = Some(phone.to_string());
        }
        Ok(account.user.clone())
    }

    async fn upsert_profile(
        &self,
        access_token: &SecretString,
        profile: &Profile,
    ) -> Result<(), ProviderError> {
        let mut state = self.state.lock().await;
        let user_id = state.user_for_token(access_token)?;
        if user_id != profile.id {
            return Err(ProviderError::api(
                403,
                "new row violates row-level security policy",
            ));
        }
        state.profiles.insert(profile.id, profile.clone());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tienda_core::Phone;

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_sign_in_checks_password() {
        let provider = InMemoryIdentityProvider::new();
        provider
            .add_user(&email("ana@correo.mx"), "secreto1", UserMetadata::default())
            .await;

        let err = provider
            .sign_in_with_password(&email("ana@correo.mx"), &SecretString::from("otra"))
            .await
            .unwrap_err();
        assert_eq!(err.provider_message(), "Invalid login credentials");

        let session = provider
            .sign_in_with_password(&email("ana@correo.mx"), &SecretString::from("secreto1"))
            .await
            .unwrap();
        assert_eq!(session.user.email.as_deref(), Some("ana@correo.mx"));
    }

    #[tokio::test]
    async fn test_sign_up_with_confirmation_blocks_login() {
        let provider = InMemoryIdentityProvider::new().with_email_confirmation();
        let request = SignUpRequest {
            email: email("nuevo@correo.mx"),
            password: SecretString::from("secreto1"),
            metadata: UserMetadata::default(),
        };
        let result = provider.sign_up(&request).await.unwrap();
        assert!(matches!(result, SignUpResult::ConfirmationRequired(_)));

        let err = provider
            .sign_in_with_password(&request.email, &request.password)
            .await
            .unwrap_err();
        assert_eq!(err.provider_message(), "Email not confirmed");

        provider.confirm_email(&request.email).await;
        assert!(
            provider
                .sign_in_with_password(&request.email, &request.password)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_duplicate_sign_up_is_rejected() {
        let provider = InMemoryIdentityProvider::new();
        provider
            .add_user(&email("ana@correo.mx"), "secreto1", UserMetadata::default())
            .await;
        let err = provider
            .sign_up(&SignUpRequest {
                email: email("ana@correo.mx"),
                password: SecretString::from("secreto2"),
                metadata: UserMetadata::default(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.provider_message(), "User already registered");
    }

    #[tokio::test]
    async fn test_otp_is_single_use() {
        let provider = InMemoryIdentityProvider::new();
        provider
            .add_user(&email("ana@correo.mx"), "secreto1", UserMetadata::default())
            .await;
        let target = OtpTarget::Email(email("ana@correo.mx"));

        provider.send_otp(&target).await.unwrap();
        let code = provider.last_otp(&target).await.unwrap();
        assert_eq!(code.len(), 6);

        provider.verify_otp(&target, &code).await.unwrap();
        let err = provider.verify_otp(&target, &code).await.unwrap_err();
        assert_eq!(err.provider_message(), "Token has expired or is invalid");
    }

    #[tokio::test]
    async fn test_otp_for_unknown_target_is_rejected() {
        let provider = InMemoryIdentityProvider::new();
        let target = OtpTarget::Phone(Phone::parse("5512345678").unwrap());
        let err = provider.send_otp(&target).await.unwrap_err();
        assert_eq!(err.provider_message(), "Signups not allowed for otp");
    }

    #[tokio::test]
    async fn test_refresh_rotates_tokens() {
        let provider = InMemoryIdentityProvider::new();
        provider
            .add_user(&email("ana@correo.mx"), "secreto1", UserMetadata::default())
            .await;
        let session = provider
            .sign_in_with_password(&email("ana@correo.mx"), &SecretString::from("secreto1"))
            .await
            .unwrap();

        let refreshed = provider
            .refresh_session(&session.refresh_token)
            .await
            .unwrap();
        assert_ne!(
            refreshed.access_token.expose_secret(),
            session.access_token.expose_secret()
        );
        assert!(provider.refresh_session(&session.refresh_token).await.is_err());
    }

    #[tokio::test]
    async fn test_update_password_must_differ() {
        let provider = InMemoryIdentityProvider::new();
        provider
            .add_user(&email("ana@correo.mx"), "secreto1", UserMetadata::default())
            .await;
        let session = provider
            .sign_in_with_password(&email("ana@correo.mx"), &SecretString::from("secreto1"))
            .await
            .unwrap();

        let err = provider
            .update_user(
                &session.access_token,
                &UserUpdate {
                    password: Some(SecretString::from("secreto1")),
                    phone: None,
                },
            )
            .await
            .unwrap_err();
        assert!(
            err.provider_message()
                .starts_with("New password should be different")
        );
    }
}
