//! Application state shared across page bindings.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::search::{HttpFetcher, PageFetcher, PageView, SearchEngine};
use crate::storage::TieredStore;
use crate::stores::{CartStore, FavoritesStore};

/// Application state shared across all page bindings.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// shared storage and the stores. The stores hydrate once, here, and stay
/// authoritative: bindings read snapshots and subscribe for changes.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    storage: TieredStore,
    cart: CartStore,
    favorites: FavoritesStore,
    fetcher: Arc<dyn PageFetcher>,
}

impl AppState {
    /// Create the application state, opening storage and hydrating stores.
    ///
    /// Storage degrades through tiers rather than failing, so construction
    /// cannot fail once configuration is valid.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let storage = TieredStore::open(&config.data_dir);
        Self::with_storage(config, storage)
    }

    /// Create the application state over an already-open store.
    #[must_use]
    pub fn with_storage(config: StorefrontConfig, storage: TieredStore) -> Self {
        let cart = CartStore::open(storage.clone());
        let favorites = FavoritesStore::open(storage.clone());
        let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new(
            config.base_url.clone(),
            config.search.probe_timeout,
        ));

        Self {
            inner: Arc::new(AppStateInner {
                config,
                storage,
                cart,
                favorites,
                fetcher,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get the shared tiered store.
    #[must_use]
    pub fn storage(&self) -> &TieredStore {
        &self.inner.storage
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    /// Get a reference to the favorites store.
    #[must_use]
    pub fn favorites(&self) -> &FavoritesStore {
        &self.inner.favorites
    }

    /// Build a search engine for the given page view.
    ///
    /// Engines are per-page: construct one on load, drop it on navigation.
    #[must_use]
    pub fn search_engine(&self, view: Arc<dyn PageView>) -> SearchEngine {
        SearchEngine::new(
            view,
            Arc::clone(&self.inner.fetcher),
            self.inner.config.search.debounce_delay,
            self.inner.config.search.rescan_delay,
        )
    }

    /// Build a search engine with a custom fetcher (tests, offline pages).
    #[must_use]
    pub fn search_engine_with_fetcher(
        &self,
        view: Arc<dyn PageView>,
        fetcher: Arc<dyn PageFetcher>,
    ) -> SearchEngine {
        SearchEngine::new(
            view,
            fetcher,
            self.inner.config.search.debounce_delay,
            self.inner.config.search.rescan_delay,
        )
    }
}
