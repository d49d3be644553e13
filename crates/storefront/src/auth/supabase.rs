//! Supabase identity provider.
//!
//! Talks to GoTrue (`/auth/v1/*`) for sessions and to PostgREST
//! (`/rest/v1/*`) for the profiles table. Every request carries the project
//! `apikey`; user-scoped calls add the access token as a bearer token,
//! anonymous calls send the key itself.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, instrument};
use url::Url;

use tienda_core::Email;

use super::provider::{
    IdentityProvider, OtpTarget, Profile, ProviderError, ProviderSession, ProviderUser,
    SignUpRequest, SignUpResult, UserUpdate,
};
use crate::config::IdentityConfig;

/// Supabase Auth + PostgREST client.
#[derive(Clone)]
pub struct SupabaseAuth {
    inner: Arc<SupabaseAuthInner>,
}

struct SupabaseAuthInner {
    client: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
    profile_table: String,
}

/// GoTrue token grant response.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: ProviderUser,
}

impl TokenResponse {
    fn into_session(self) -> ProviderSession {
        let expires_at = self
            .expires_at
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
            .unwrap_or_else(|| Utc::now() + Duration::seconds(self.expires_in.unwrap_or(3600)));

        ProviderSession {
            access_token: SecretString::from(self.access_token),
            refresh_token: SecretString::from(self.refresh_token),
            expires_at,
            user: self.user,
        }
    }
}

/// Error body shapes used by GoTrue (old and new) and PostgREST.
#[derive(Deserialize, Default)]
struct ErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
    error_code: Option<String>,
}

/// Convert a non-success response body into a provider error.
fn api_error(status: StatusCode, body: &str) -> ProviderError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .msg
        .or(parsed.message)
        .or(parsed.error_description)
        .or_else(|| parsed.error.clone())
        .unwrap_or_default();

    ProviderError::Api {
        status: status.as_u16(),
        code: parsed.error_code.or(parsed.error),
        message,
    }
}

impl SupabaseAuth {
    /// Create a new Supabase client.
    #[must_use]
    pub fn new(config: &IdentityConfig) -> Self {
        Self {
            inner: Arc::new(SupabaseAuthInner {
                client: reqwest::Client::new(),
                base_url: crate::config::directory_url(config.url.clone()),
                api_key: config.api_key.clone(),
                profile_table: config.profile_table.clone(),
            }),
        }
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        bearer: Option<&SecretString>,
    ) -> Result<RequestBuilder, ProviderError> {
        let url = self.inner.base_url.join(path)?;
        let token = bearer.unwrap_or(&self.inner.api_key);

        Ok(self
            .inner
            .client
            .request(method, url)
            .header("apikey", self.inner.api_key.expose_secret())
            .bearer_auth(token.expose_secret()))
    }

    /// Send a request and parse the JSON body.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ProviderError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            debug!(status = %status, "Identity provider returned an error");
            return Err(api_error(status, &body));
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Send a request whose success body is irrelevant.
    async fn send_empty(&self, request: RequestBuilder) -> Result<(), ProviderError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(status = %status, "Identity provider returned an error");
            return Err(api_error(status, &body));
        }

        Ok(())
    }

    async fn grant(&self, grant_type: &str, body: Value) -> Result<ProviderSession, ProviderError> {
        let request = self
            .request(Method::POST, "auth/v1/token", None)?
            .query(&[("grant_type", grant_type)])
            .json(&body);

        let token: TokenResponse = self.send_json(request).await?;
        Ok(token.into_session())
    }
}

fn otp_body(target: &OtpTarget) -> Value {
    match target {
        OtpTarget::Email(email) => json!({ "email": email.as_str(), "create_user": false }),
        OtpTarget::Phone(phone) => json!({ "phone": phone.as_str(), "create_user": false }),
    }
}

#[async_trait]
impl IdentityProvider for SupabaseAuth {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<ProviderSession, ProviderError> {
        self.grant(
            "password",
            json!({ "email": email.as_str(), "password": password.expose_secret() }),
        )
        .await
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpResult, ProviderError> {
        let body = json!({
            "email": request.email.as_str(),
            "password": request.password.expose_secret(),
            "data": request.metadata,
        });
        let http = self.request(Method::POST, "auth/v1/signup", None)?.json(&body);

        // With email confirmations on, GoTrue answers with the bare user.
        let value: Value = self.send_json(http).await?;
        if value.get("access_token").is_some() {
            let token: TokenResponse = serde_json::from_value(value)?;
            Ok(SignUpResult::Session(token.into_session()))
        } else {
            let user = match value.get("user") {
                Some(user) => serde_json::from_value(user.clone())?,
                None => serde_json::from_value(value)?,
            };
            Ok(SignUpResult::ConfirmationRequired(user))
        }
    }

    #[instrument(skip_all)]
    async fn sign_out(&self, access_token: &SecretString) -> Result<(), ProviderError> {
        let request = self.request(Method::POST, "auth/v1/logout", Some(access_token))?;
        self.send_empty(request).await
    }

    #[instrument(skip_all)]
    async fn refresh_session(
        &self,
        refresh_token: &SecretString,
    ) -> Result<ProviderSession, ProviderError> {
        self.grant(
            "refresh_token",
            json!({ "refresh_token": refresh_token.expose_secret() }),
        )
        .await
    }

    #[instrument(skip(self), fields(target = %target))]
    async fn send_otp(&self, target: &OtpTarget) -> Result<(), ProviderError> {
        let request = self
            .request(Method::POST, "auth/v1/otp", None)?
            .json(&otp_body(target));
        self.send_empty(request).await
    }

    #[instrument(skip(self, token), fields(target = %target))]
    async fn verify_otp(
        &self,
        target: &OtpTarget,
        token: &str,
    ) -> Result<ProviderSession, ProviderError> {
        let body = match target {
            OtpTarget::Email(email) => {
                json!({ "type": "email", "email": email.as_str(), "token": token })
            }
            OtpTarget::Phone(phone) => {
                json!({ "type": "sms", "phone": phone.as_str(), "token": token })
            }
        };
        let request = self.request(Method::POST, "auth/v1/verify", None)?.json(&body);

        let token: TokenResponse = self.send_json(request).await?;
        Ok(token.into_session())
    }

    #[instrument(skip(self), fields(email = %email))]
    async fn send_recovery_email(
        &self,
        email: &Email,
        redirect_to: &str,
    ) -> Result<(), ProviderError> {
        let request = self
            .request(Method::POST, "auth/v1/recover", None)?
            .query(&[("redirect_to", redirect_to)])
            .json(&json!({ "email": email.as_str() }));
        self.send_empty(request).await
    }

    #[instrument(skip_all)]
    async fn update_user(
        &self,
        access_token: &SecretString,
        update: &UserUpdate,
    ) -> Result<ProviderUser, ProviderError> {
        let mut body = serde_json::Map::new();
        if let Some(password) = &update.password {
            body.insert(
                "password".to_string(),
                Value::String(password.expose_secret().to_string()),
            );
        }
        if let Some(phone) = &update.phone {
            body.insert("phone".to_string(), Value::String(phone.to_string()));
        }

        let request = self
            .request(Method::PUT, "auth/v1/user", Some(access_token))?
            .json(&body);
        self.send_json(request).await
    }

    #[instrument(skip(self, access_token, profile), fields(user_id = %profile.id))]
    async fn upsert_profile(
        &self,
        access_token: &SecretString,
        profile: &Profile,
    ) -> Result<(), ProviderError> {
        let path = format!("rest/v1/{}", self.inner.profile_table);
        let request = self
            .request(Method::POST, &path, Some(access_token))?
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(profile);
        self.send_empty(request).await
    }
}
