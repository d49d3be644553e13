//! Cart ownership and storage keys.

use core::fmt;

use serde::{Deserialize, Serialize};

use tienda_core::{GuestId, UserId};

use crate::auth::AuthState;

/// Default prefix of cart storage keys.
pub const DEFAULT_KEY_PREFIX: &str = "telcel_cart";

/// Who the cart currently belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum CartIdentity {
    #[default]
    Guest,
    User(UserId),
}

impl From<&AuthState> for CartIdentity {
    fn from(state: &AuthState) -> Self {
        state.user_id().map_or(Self::Guest, Self::User)
    }
}

/// Key a cart is stored under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives storage keys for one browser's guest cart and any user cart.
#[derive(Debug, Clone)]
pub struct CartKeys {
    prefix: String,
    guest: GuestId,
}

impl CartKeys {
    #[must_use]
    pub fn new(prefix: impl Into<String>, guest: GuestId) -> Self {
        Self {
            prefix: prefix.into(),
            guest,
        }
    }

    /// `<prefix>:guest:<guest-id>` or `<prefix>:user:<user-id>`.
    #[must_use]
    pub fn key_for(&self, identity: &CartIdentity) -> StorageKey {
        match identity {
            CartIdentity::Guest => StorageKey(format!("{}:guest:{}", self.prefix, self.guest)),
            CartIdentity::User(user) => StorageKey(format!("{}:user:{user}", self.prefix)),
        }
    }
}
