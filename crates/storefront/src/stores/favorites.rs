//! Favorites store: product id to display name, with cross-view change
//! notification.
//!
//! There is exactly one authoritative favorites module. The listing page,
//! the card badges, and anything else interested subscribe to the store
//! instead of each keeping a divergent copy of the map.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use mercadito_core::ProductId;
use tracing::{debug, warn};

use crate::notify::Subscribers;
use crate::storage::{TieredStore, keys};

/// Display name used when a product card has no readable name.
pub const FALLBACK_NAME: &str = "Producto";

/// Event published after every successful favorites mutation.
///
/// Carries the affected id and the full resulting map, so a consumer can
/// re-render without reading the store back.
#[derive(Debug, Clone)]
pub struct FavoritesChanged {
    pub id: ProductId,
    pub favorites: HashMap<ProductId, String>,
}

/// Set-like mapping of product id to display name.
///
/// The map hydrates once at open and stays authoritative in memory. A
/// failed persist reduces external visibility but never the in-memory
/// state; the memory storage tier always reports success.
#[derive(Clone)]
pub struct FavoritesStore {
    inner: Arc<FavoritesInner>,
}

struct FavoritesInner {
    storage: TieredStore,
    favorites: RwLock<HashMap<ProductId, String>>,
    subscribers: Subscribers<FavoritesChanged>,
}

impl FavoritesStore {
    /// Open the store, hydrating from persisted state.
    ///
    /// Malformed persisted content is treated as an empty map, never as an
    /// error.
    #[must_use]
    pub fn open(storage: TieredStore) -> Self {
        let favorites = hydrate(&storage);
        Self {
            inner: Arc::new(FavoritesInner {
                storage,
                favorites: RwLock::new(favorites),
                subscribers: Subscribers::new(),
            }),
        }
    }

    /// Register a callback invoked after every successful mutation.
    pub fn subscribe(&self, callback: impl Fn(&FavoritesChanged) + Send + Sync + 'static) {
        self.inner.subscribers.subscribe(callback);
    }

    /// O(1) membership check against the in-memory cache.
    #[must_use]
    pub fn is_favorited(&self, id: &ProductId) -> bool {
        match self.inner.favorites.read() {
            Ok(favorites) => favorites.contains_key(id),
            Err(_) => {
                warn!("favorites lock poisoned, reporting not favorited");
                false
            }
        }
    }

    /// Toggle membership for `id`.
    ///
    /// Inserts with the trimmed display name (falling back to
    /// [`FALLBACK_NAME`] when empty), or removes an existing entry. Returns
    /// whether the updated map was persisted. Blank ids are rejected
    /// without mutating state. Toggles resolve atomically in call order.
    pub fn toggle(&self, id: &ProductId, name: &str) -> bool {
        if id.is_blank() {
            debug!("ignoring favorite toggle with blank id");
            return false;
        }
        let snapshot = {
            let Ok(mut favorites) = self.inner.favorites.write() else {
                warn!("favorites lock poisoned, dropping toggle");
                return false;
            };
            if favorites.remove(id).is_none() {
                let name = name.trim();
                let name = if name.is_empty() { FALLBACK_NAME } else { name };
                favorites.insert(id.clone(), name.to_string());
            }
            favorites.clone()
        };
        self.persist_and_notify(id.clone(), snapshot)
    }

    /// Remove `id` outright (the favorites listing removal path).
    ///
    /// Removing an id that is not a member is a successful no-op.
    pub fn remove(&self, id: &ProductId) -> bool {
        if id.is_blank() {
            debug!("ignoring favorite removal with blank id");
            return false;
        }
        let snapshot = {
            let Ok(mut favorites) = self.inner.favorites.write() else {
                warn!("favorites lock poisoned, dropping removal");
                return false;
            };
            if favorites.remove(id).is_none() {
                return true;
            }
            favorites.clone()
        };
        self.persist_and_notify(id.clone(), snapshot)
    }

    /// Snapshot of all favorites, ordered by id for stable listing renders.
    #[must_use]
    pub fn entries(&self) -> Vec<(ProductId, String)> {
        let Ok(favorites) = self.inner.favorites.read() else {
            warn!("favorites lock poisoned, returning empty snapshot");
            return Vec::new();
        };
        let mut entries: Vec<_> = favorites
            .iter()
            .map(|(id, name)| (id.clone(), name.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Number of favorited products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.favorites.read().map_or(0, |favorites| favorites.len())
    }

    /// Whether no products are favorited (the listing's empty state).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn persist_and_notify(&self, id: ProductId, favorites: HashMap<ProductId, String>) -> bool {
        let persisted = match serde_json::to_string(&favorites) {
            Ok(json) => self.inner.storage.set(keys::FAVORITES, &json),
            Err(e) => {
                warn!(error = %e, "failed to encode favorites");
                false
            }
        };
        self.inner.subscribers.notify(&FavoritesChanged { id, favorites });
        persisted
    }
}

fn hydrate(storage: &TieredStore) -> HashMap<ProductId, String> {
    let Some(raw) = storage.get(keys::FAVORITES) else {
        return HashMap::new();
    };
    match serde_json::from_str(&raw) {
        Ok(favorites) => favorites,
        Err(e) => {
            warn!(error = %e, "malformed persisted favorites, starting empty");
            HashMap::new()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn open_empty() -> FavoritesStore {
        FavoritesStore::open(TieredStore::in_memory())
    }

    #[test]
    fn test_toggle_adds_then_removes() {
        let favorites = open_empty();
        let id = ProductId::new("p1");

        assert!(favorites.toggle(&id, "Camiseta"));
        assert!(favorites.is_favorited(&id));

        assert!(favorites.toggle(&id, "Camiseta"));
        assert!(!favorites.is_favorited(&id));
        assert!(favorites.is_empty());
    }

    #[test]
    fn test_toggle_pair_restores_prior_state() {
        let favorites = open_empty();
        favorites.toggle(&ProductId::new("p1"), "Camiseta");
        let before = favorites.entries();

        let id = ProductId::new("p2");
        favorites.toggle(&id, "Gorra");
        favorites.toggle(&id, "Gorra");

        assert_eq!(favorites.entries(), before);
    }

    #[test]
    fn test_name_is_trimmed_and_defaulted() {
        let favorites = open_empty();
        favorites.toggle(&ProductId::new("p1"), "  Camiseta  ");
        favorites.toggle(&ProductId::new("p2"), "   ");

        let entries = favorites.entries();
        assert_eq!(
            entries,
            vec![
                (ProductId::new("p1"), "Camiseta".to_string()),
                (ProductId::new("p2"), FALLBACK_NAME.to_string()),
            ]
        );
    }

    #[test]
    fn test_blank_id_rejected_without_mutation() {
        let favorites = open_empty();
        assert!(!favorites.toggle(&ProductId::new(""), "Camiseta"));
        assert!(!favorites.toggle(&ProductId::new("   "), "Camiseta"));
        assert!(favorites.is_empty());
    }

    #[test]
    fn test_remove_without_toggle() {
        let favorites = open_empty();
        let id = ProductId::new("p1");
        favorites.toggle(&id, "Camiseta");

        assert!(favorites.remove(&id));
        assert!(!favorites.is_favorited(&id));

        // Absent id is a successful no-op
        assert!(favorites.remove(&id));
    }

    #[test]
    fn test_persists_full_map() {
        let storage = TieredStore::in_memory();
        let favorites = FavoritesStore::open(storage.clone());
        favorites.toggle(&ProductId::new("p1"), "Camiseta");

        let raw = storage.get(keys::FAVORITES).unwrap();
        let parsed: HashMap<String, String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.get("p1").map(String::as_str), Some("Camiseta"));
    }

    #[test]
    fn test_hydrates_from_persisted_state() {
        let storage = TieredStore::in_memory();
        storage.set(keys::FAVORITES, "{\"p1\":\"Camiseta\"}");

        let favorites = FavoritesStore::open(storage);
        assert!(favorites.is_favorited(&ProductId::new("p1")));
        assert_eq!(favorites.len(), 1);
    }

    #[test]
    fn test_malformed_persisted_favorites_starts_empty() {
        let storage = TieredStore::in_memory();
        storage.set(keys::FAVORITES, "[1, 2, 3]");

        let favorites = FavoritesStore::open(storage);
        assert!(favorites.is_empty());
    }

    #[test]
    fn test_notification_carries_id_and_full_map() {
        let favorites = open_empty();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        favorites.subscribe(move |event: &FavoritesChanged| {
            log.lock()
                .unwrap()
                .push((event.id.clone(), event.favorites.len()));
        });

        let id = ProductId::new("p1");
        favorites.toggle(&id, "Camiseta");
        favorites.toggle(&ProductId::new("p2"), "Gorra");
        favorites.remove(&id);

        let events = seen.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                (ProductId::new("p1"), 1),
                (ProductId::new("p2"), 2),
                (ProductId::new("p1"), 1),
            ]
        );
    }
}
