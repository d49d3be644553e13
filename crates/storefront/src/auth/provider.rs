//! Identity provider abstraction.
//!
//! The storefront never stores credentials. Everything about a customer's
//! identity lives in the provider; this module defines the calls the auth
//! bridge makes and the session shape it gets back.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tienda_core::{Email, Phone, Role, UserId};

use crate::models::UserProjection;

/// Sessions this close to expiry are treated as expired.
const EXPIRY_LEEWAY_SECONDS: i64 = 30;

/// Errors returned by an identity provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The request never got a response.
    #[error("Failed to fetch: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with an error.
    #[error("{message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The provider answered with something we could not read.
    #[error("unexpected provider response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid provider URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ProviderError {
    /// Build an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            code: None,
            message: message.into(),
        }
    }

    /// Message as the provider worded it, used for translation.
    ///
    /// Transport failures read "Failed to fetch" so they hit the
    /// connectivity entry of the message table.
    #[must_use]
    pub fn provider_message(&self) -> String {
        match self {
            Self::Http(_) => "Failed to fetch".to_string(),
            Self::Api { message, .. } => message.clone(),
            Self::Parse(_) | Self::Url(_) => String::new(),
        }
    }

    /// HTTP status the provider answered with, if it answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Custom user fields kept in the provider's user metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apellido_paterno: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apellido_materno: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rol: Option<String>,
}

/// A user record as the provider reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

impl ProviderUser {
    /// Project the provider record into the view the storefront exposes.
    ///
    /// Unknown role strings fall back to the customer role.
    #[must_use]
    pub fn projection(&self) -> UserProjection {
        let meta = &self.user_metadata;
        UserProjection {
            id: self.id,
            email: non_empty(self.email.as_deref()),
            phone: non_empty(self.phone.as_deref()),
            nombre: meta.nombre.clone().unwrap_or_default(),
            apellido_paterno: meta.apellido_paterno.clone().unwrap_or_default(),
            apellido_materno: meta.apellido_materno.clone().unwrap_or_default(),
            role: meta
                .rol
                .as_deref()
                .and_then(|rol| rol.parse::<Role>().ok())
                .unwrap_or_default(),
            email_verified: self.email_confirmed_at.is_some(),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// An authenticated provider session.
#[derive(Clone)]
pub struct ProviderSession {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
    pub expires_at: DateTime<Utc>,
    pub user: ProviderUser,
}

impl std::fmt::Debug for ProviderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user.id)
            .finish()
    }
}

impl ProviderSession {
    /// Whether the access token is expired (or about to be) at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now + Duration::seconds(EXPIRY_LEEWAY_SECONDS)
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Session as kept in the browser session store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    access_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
    user: ProviderUser,
}

impl From<&ProviderSession> for StoredSession {
    fn from(session: &ProviderSession) -> Self {
        Self {
            access_token: session.access_token.expose_secret().to_string(),
            refresh_token: session.refresh_token.expose_secret().to_string(),
            expires_at: session.expires_at,
            user: session.user.clone(),
        }
    }
}

impl From<StoredSession> for ProviderSession {
    fn from(stored: StoredSession) -> Self {
        Self {
            access_token: SecretString::from(stored.access_token),
            refresh_token: SecretString::from(stored.refresh_token),
            expires_at: stored.expires_at,
            user: stored.user,
        }
    }
}

/// Where a one-time code is delivered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OtpTarget {
    Email(Email),
    Phone(Phone),
}

impl std::fmt::Display for OtpTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Email(email) => write!(f, "{email}"),
            Self::Phone(phone) => write!(f, "{phone}"),
        }
    }
}

/// New account request.
#[derive(Debug, Clone)]
pub struct SignUpRequest {
    pub email: Email,
    pub password: SecretString,
    pub metadata: UserMetadata,
}

/// Result of a sign-up.
#[derive(Debug, Clone)]
pub enum SignUpResult {
    /// The account is active and signed in.
    Session(ProviderSession),
    /// The provider sent a confirmation email; no session yet.
    ConfirmationRequired(ProviderUser),
}

/// Changes to the signed-in user.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub password: Option<SecretString>,
    pub phone: Option<Phone>,
}

/// Row upserted into the remote profiles table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub id: UserId,
    pub nombre: String,
    pub apellido_paterno: String,
    pub apellido_materno: String,
    pub correo: String,
    pub rol: Role,
}

/// Operations the storefront needs from an identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<ProviderSession, ProviderError>;

    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpResult, ProviderError>;

    /// Revoke the session behind `access_token`.
    async fn sign_out(&self, access_token: &SecretString) -> Result<(), ProviderError>;

    async fn refresh_session(
        &self,
        refresh_token: &SecretString,
    ) -> Result<ProviderSession, ProviderError>;

    /// Send a one-time code to an existing account. Never creates users.
    async fn send_otp(&self, target: &OtpTarget) -> Result<(), ProviderError>;

    async fn verify_otp(
        &self,
        target: &OtpTarget,
        token: &str,
    ) -> Result<ProviderSession, ProviderError>;

    /// Email a recovery link that lands on `redirect_to`.
    async fn send_recovery_email(
        &self,
        email: &Email,
        redirect_to: &str,
    ) -> Result<(), ProviderError>;

    async fn update_user(
        &self,
        access_token: &SecretString,
        update: &UserUpdate,
    ) -> Result<ProviderUser, ProviderError>;

    async fn upsert_profile(
        &self,
        access_token: &SecretString,
        profile: &Profile,
    ) -> Result<(), ProviderError>;
}
