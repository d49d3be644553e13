//! Session-related types.
//!
//! The browser session carries everything a request needs to rebuild the
//! client context: the guest id, the provider tokens and the cart identity
//! the cart was last bound to.

/// Session keys for client state.
pub mod keys {
    /// Key for the anonymous visitor id that owns the guest cart.
    pub const GUEST_ID: &str = "guest_id";

    /// Key for the stored identity-provider session.
    pub const AUTH_SESSION: &str = "auth_session";

    /// Key for the identity the cart was bound to at the end of the last request.
    pub const CART_IDENTITY: &str = "cart_identity";
}
