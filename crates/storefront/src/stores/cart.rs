//! Cart store: ordered line items with merge-by-identity semantics.
//!
//! Line identity is the `(id, name)` pair. Adding an item that matches an
//! existing line accumulates its quantity; removal is positional, matching
//! how the cart page renders rows. The full cart is persisted after every
//! mutation and subscribers are notified so the badge and the cart page
//! stay consistent without manual refresh calls.

use std::sync::{Arc, RwLock};

use mercadito_core::{Price, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::notify::Subscribers;
use crate::storage::{TieredStore, keys};

/// Image shown for lines persisted without one.
pub const PLACEHOLDER_IMAGE: &str = "../img/placeholder.png";

const fn default_qty() -> u32 {
    1
}

/// A cart line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    /// Product image URI; rendering falls back to a placeholder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Quantity, always at least 1.
    #[serde(default = "default_qty")]
    pub qty: u32,
}

impl CartItem {
    /// Create a line item with quantity 1 and no image.
    #[must_use]
    pub fn new(id: ProductId, name: impl Into<String>, price: Price) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            image: None,
            qty: 1,
        }
    }

    /// Set the quantity (clamped to at least 1).
    #[must_use]
    pub fn with_qty(mut self, qty: u32) -> Self {
        self.qty = qty.max(1);
        self
    }

    /// Set the image URI.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    fn same_identity(&self, other: &Self) -> bool {
        self.id == other.id && self.name == other.name
    }
}

/// Event published after every successful cart mutation.
#[derive(Debug, Clone)]
pub struct CartChanged {
    /// Snapshot of the full cart after the mutation.
    pub items: Vec<CartItem>,
    /// Σ(qty), the badge count.
    pub count: u32,
    /// Σ(price × qty), rounded to two decimals.
    pub total: Decimal,
}

/// Ordered collection of cart line items, persisted after every mutation.
///
/// Cheaply cloneable; clones share state. Mutations serialize through a
/// write lock, so rapid calls resolve in call order.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartInner>,
}

struct CartInner {
    storage: TieredStore,
    items: RwLock<Vec<CartItem>>,
    subscribers: Subscribers<CartChanged>,
}

impl CartStore {
    /// Open the store, hydrating from persisted state.
    ///
    /// Malformed persisted content is treated as an empty cart, never as an
    /// error.
    #[must_use]
    pub fn open(storage: TieredStore) -> Self {
        let items = hydrate(&storage);
        Self {
            inner: Arc::new(CartInner {
                storage,
                items: RwLock::new(items),
                subscribers: Subscribers::new(),
            }),
        }
    }

    /// Register a callback invoked after every successful mutation.
    pub fn subscribe(&self, callback: impl Fn(&CartChanged) + Send + Sync + 'static) {
        self.inner.subscribers.subscribe(callback);
    }

    /// Add an item, merging with an existing `(id, name)` line if present.
    pub fn add(&self, item: CartItem) {
        let qty = item.qty.max(1);
        let snapshot = {
            let Ok(mut items) = self.inner.items.write() else {
                warn!("cart lock poisoned, dropping add");
                return;
            };
            match items.iter_mut().find(|line| line.same_identity(&item)) {
                Some(line) => line.qty = line.qty.saturating_add(qty),
                None => items.push(CartItem { qty, ..item }),
            }
            items.clone()
        };
        self.persist_and_notify(snapshot);
    }

    /// Remove the line at `index`. Out of bounds is a logged no-op.
    pub fn remove_at(&self, index: usize) {
        let snapshot = {
            let Ok(mut items) = self.inner.items.write() else {
                warn!("cart lock poisoned, dropping removal");
                return;
            };
            if index >= items.len() {
                warn!(index, len = items.len(), "ignoring out-of-bounds cart removal");
                return;
            }
            items.remove(index);
            items.clone()
        };
        self.persist_and_notify(snapshot);
    }

    /// Empty the cart.
    pub fn clear(&self) {
        let snapshot = {
            let Ok(mut items) = self.inner.items.write() else {
                warn!("cart lock poisoned, dropping clear");
                return;
            };
            items.clear();
            items.clone()
        };
        self.persist_and_notify(snapshot);
    }

    /// Snapshot of the current line items, in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        match self.inner.items.read() {
            Ok(items) => items.clone(),
            Err(_) => {
                warn!("cart lock poisoned, returning empty snapshot");
                Vec::new()
            }
        }
    }

    /// Σ(price × qty) over all items, rounded to two decimals for display.
    ///
    /// Stored prices stay unrounded; only the sum is rounded.
    #[must_use]
    pub fn total(&self) -> Decimal {
        total_of(&self.items())
    }

    /// Σ(qty) over all items, for the badge indicator.
    #[must_use]
    pub fn count(&self) -> u32 {
        count_of(&self.items())
    }

    /// Display data for the cart page and badge.
    #[must_use]
    pub fn view(&self) -> CartView {
        CartView::from_items(&self.items())
    }

    fn persist_and_notify(&self, items: Vec<CartItem>) {
        persist(&self.inner.storage, &items);
        let event = CartChanged {
            count: count_of(&items),
            total: total_of(&items),
            items,
        };
        self.inner.subscribers.notify(&event);
    }
}

fn total_of(items: &[CartItem]) -> Decimal {
    items
        .iter()
        .map(|item| item.price.amount() * Decimal::from(item.qty))
        .sum::<Decimal>()
        .round_dp(2)
}

fn count_of(items: &[CartItem]) -> u32 {
    items.iter().fold(0u32, |acc, item| acc.saturating_add(item.qty))
}

fn hydrate(storage: &TieredStore) -> Vec<CartItem> {
    let Some(raw) = storage.get(keys::CART) else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<CartItem>>(&raw) {
        Ok(items) => items
            .into_iter()
            .map(|mut item| {
                item.qty = item.qty.max(1);
                item
            })
            .collect(),
        Err(e) => {
            warn!(error = %e, "malformed persisted cart, starting empty");
            Vec::new()
        }
    }
}

fn persist(storage: &TieredStore, items: &[CartItem]) -> bool {
    match serde_json::to_string(items) {
        Ok(json) => storage.set(keys::CART, &json),
        Err(e) => {
            warn!(error = %e, "failed to encode cart");
            false
        }
    }
}

// =============================================================================
// Display Data
// =============================================================================

/// Cart line display data for the cart page.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub name: String,
    pub image: String,
    pub qty: u32,
    /// Unit price, formatted to two decimals.
    pub price: String,
    /// qty × unit price, formatted to two decimals.
    pub line_total: String,
}

impl From<&CartItem> for CartLineView {
    fn from(item: &CartItem) -> Self {
        let line_total = (item.price.amount() * Decimal::from(item.qty)).round_dp(2);
        Self {
            name: item.name.clone(),
            image: item
                .image
                .as_deref()
                .filter(|src| !src.is_empty())
                .unwrap_or(PLACEHOLDER_IMAGE)
                .to_string(),
            qty: item.qty,
            price: item.price.to_string(),
            line_total: format!("{line_total:.2}"),
        }
    }
}

/// Cart display data for the cart page and badge.
#[derive(Debug, Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    /// Cart total, formatted to two decimals.
    pub total: String,
    pub item_count: u32,
}

impl CartView {
    /// Create an empty cart view.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            lines: Vec::new(),
            total: "0.00".to_string(),
            item_count: 0,
        }
    }

    fn from_items(items: &[CartItem]) -> Self {
        Self {
            lines: items.iter().map(CartLineView::from).collect(),
            total: format!("{:.2}", total_of(items)),
            item_count: count_of(items),
        }
    }
}
