//! Cart state manager.
//!
//! A [`CartManager`] owns one client's cart lines and keeps them in cart
//! storage under a key derived from who the client is. It follows the auth
//! snapshot: when the client signs in, the guest cart is merged into the
//! user's cart once and the guest entry is dropped; when the client signs
//! out, the guest cart is loaded again as-is.
//!
//! Invariant: every line's quantity is in `[1, stock]`.
//!
//! Persistence is best-effort. A failed or unparsable read yields an empty
//! cart and a failed write is logged, never surfaced.

pub mod identity;
pub mod merge;
pub mod policy;
pub mod storage;

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use tienda_core::ProductId;

use crate::auth::AuthState;
use crate::models::{CartItem, CartSummary};

pub use identity::{CartIdentity, CartKeys, DEFAULT_KEY_PREFIX, StorageKey};
pub use merge::merge_carts;
pub use policy::CartPolicy;
pub use storage::{CartStorage, MemoryCartStorage, PgCartStorage, StorageError};

/// Result of adding a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The line now holds `quantity` units.
    Added { quantity: u32 },
    /// The product has no stock; nothing changed.
    OutOfStock,
}

/// What happened when the bound identity changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityTransition {
    Unchanged,
    /// Guest cart merged into the user cart.
    Merged,
    /// Cart for the new identity loaded without merging.
    Switched,
}

/// One client's cart.
pub struct CartManager {
    storage: Arc<dyn CartStorage>,
    policy: CartPolicy,
    keys: CartKeys,
    identity: CartIdentity,
    items: Vec<CartItem>,
    auth: Option<watch::Receiver<AuthState>>,
}

impl CartManager {
    /// Load the cart stored for `identity`.
    pub async fn load(
        storage: Arc<dyn CartStorage>,
        policy: CartPolicy,
        keys: CartKeys,
        identity: CartIdentity,
    ) -> Self {
        let items = read_items(storage.as_ref(), &keys.key_for(&identity)).await;
        Self {
            storage,
            policy,
            keys,
            identity,
            items,
            auth: None,
        }
    }

    /// Follow an auth snapshot stream.
    ///
    /// Reconciles with the current snapshot immediately, then again before
    /// every operation whenever the snapshot has changed.
    pub async fn follow(&mut self, mut auth: watch::Receiver<AuthState>) -> IdentityTransition {
        let next = CartIdentity::from(&*auth.borrow_and_update());
        self.auth = Some(auth);
        self.switch_identity(next).await
    }

    /// Reconcile with the followed snapshot if it changed.
    pub async fn sync_with_auth(&mut self) -> IdentityTransition {
        let next = match self.auth.as_mut() {
            Some(rx) if rx.has_changed().unwrap_or(false) => {
                CartIdentity::from(&*rx.borrow_and_update())
            }
            _ => return IdentityTransition::Unchanged,
        };
        self.switch_identity(next).await
    }

    /// Rebind the cart to `next`.
    ///
    /// Guest to user merges the guest cart into the user cart and removes
    /// the guest entry, so a second merge finds nothing. Any other change
    /// loads the stored cart of the new identity.
    pub async fn switch_identity(&mut self, next: CartIdentity) -> IdentityTransition {
        if next == self.identity {
            return IdentityTransition::Unchanged;
        }
        let previous = std::mem::replace(&mut self.identity, next);
        let key = self.keys.key_for(&self.identity);

        if previous == CartIdentity::Guest {
            let guest_items = std::mem::take(&mut self.items);
            let user_items = read_items(self.storage.as_ref(), &key).await;
            let merged_lines = guest_items.len();
            self.items = merge_carts(user_items, guest_items);

            if merged_lines > 0 {
                self.persist().await;
            }
            let guest_key = self.keys.key_for(&CartIdentity::Guest);
            if let Err(err) = self.storage.remove(&guest_key).await {
                warn!(error = %err, key = %guest_key, "Failed to clear guest cart");
            }
            info!(key = %key, merged_lines, "Guest cart merged into user cart");
            IdentityTransition::Merged
        } else {
            self.items = read_items(self.storage.as_ref(), &key).await;
            debug!(key = %key, "Cart identity switched");
            IdentityTransition::Switched
        }
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub const fn identity(&self) -> CartIdentity {
        self.identity
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    #[must_use]
    pub fn summary(&self) -> CartSummary {
        self.policy.summarize(&self.items)
    }

    /// Add a product.
    ///
    /// An existing line grows by `item.quantity` and takes the incoming
    /// stock; a new line is inserted. Quantities are clamped to the stock,
    /// and a requested quantity of zero counts as one.
    pub async fn add_item(&mut self, item: CartItem) -> AddOutcome {
        self.sync_with_auth().await;

        if item.stock == 0 {
            return AddOutcome::OutOfStock;
        }
        let requested = item.quantity.max(1);

        let quantity = if let Some(existing) = self
            .items
            .iter_mut()
            .find(|line| line.product_id == item.product_id)
        {
            existing.stock = item.stock;
            existing.quantity = existing
                .quantity
                .saturating_add(requested)
                .clamp(1, item.stock);
            existing.quantity
        } else {
            let quantity = requested.min(item.stock);
            self.items.push(CartItem { quantity, ..item });
            quantity
        };

        self.persist().await;
        AddOutcome::Added { quantity }
    }

    /// Set a line's quantity, clamped to its stored stock.
    ///
    /// Zero or less removes the line. Unknown products are ignored. Returns
    /// the resulting quantity, or `None` if no line remains.
    pub async fn update_quantity(&mut self, product_id: ProductId, quantity: i64) -> Option<u32> {
        self.sync_with_auth().await;

        if quantity <= 0 {
            self.remove_line(product_id).await;
            return None;
        }

        let line = self
            .items
            .iter_mut()
            .find(|line| line.product_id == product_id)?;
        let requested = u32::try_from(quantity).unwrap_or(u32::MAX);
        line.quantity = requested.clamp(1, line.stock.max(1));
        let updated = line.quantity;

        self.persist().await;
        Some(updated)
    }

    /// Remove a line. No-op if the product is not in the cart.
    pub async fn remove_item(&mut self, product_id: ProductId) {
        self.sync_with_auth().await;
        self.remove_line(product_id).await;
    }

    /// Empty the cart.
    pub async fn clear(&mut self) {
        self.sync_with_auth().await;
        self.items.clear();
        self.persist().await;
    }

    async fn remove_line(&mut self, product_id: ProductId) {
        let before = self.items.len();
        self.items.retain(|line| line.product_id != product_id);
        if self.items.len() != before {
            self.persist().await;
        }
    }

    async fn persist(&self) {
        let key = self.keys.key_for(&self.identity);
        let payload = match serde_json::to_string(&self.items) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, key = %key, "Failed to serialize cart");
                return;
            }
        };
        if let Err(err) = self.storage.write(&key, &payload).await {
            warn!(error = %err, key = %key, "Failed to persist cart");
        }
    }
}

/// Read and sanitize the cart under `key`.
///
/// Lines without stock are dropped and quantities are clamped back into
/// `[1, stock]`, so carts written by older clients keep the invariant.
async fn read_items(storage: &dyn CartStorage, key: &StorageKey) -> Vec<CartItem> {
    let payload = match storage.read(key).await {
        Ok(Some(payload)) => payload,
        Ok(None) => return Vec::new(),
        Err(err) => {
            warn!(error = %err, key = %key, "Failed to read cart, starting empty");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<CartItem>>(&payload) {
        Ok(items) => items
            .into_iter()
            .filter(|item| item.stock > 0)
            .map(|item| CartItem {
                quantity: item.quantity.clamp(1, item.stock),
                ..item
            })
            .collect(),
        Err(err) => {
            warn!(error = %err, key = %key, "Unreadable cart payload, starting empty");
            Vec::new()
        }
    }
}

/// Keep a shared cart bound to the auth snapshot until the bridge goes away.
///
/// For long-lived clients; request handlers rely on the per-operation
/// reconciliation instead.
pub async fn follow_identity(cart: Arc<Mutex<CartManager>>, mut auth: watch::Receiver<AuthState>) {
    while auth.changed().await.is_ok() {
        let next = CartIdentity::from(&*auth.borrow_and_update());
        cart.lock().await.switch_identity(next).await;
    }
}
