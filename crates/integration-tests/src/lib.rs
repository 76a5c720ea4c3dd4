//! Integration tests for Mercadito.
//!
//! # Test Categories
//!
//! - `cart_persistence` - cart state across store instances and tiers
//! - `favorites_sync` - favorites mutations and cross-view notifications
//! - `search_flow` - debounce, local match, and the remote probe
//!
//! [`TestContext`] builds an [`AppState`] over a fresh durable tier in a
//! temp directory; [`FakePage`] and [`FakeFetcher`] stand in for the DOM
//! and the network, recording every side effect the engine requests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use tempfile::TempDir;
use url::Url;

use mercadito_storefront::config::{SearchConfig, StorefrontConfig};
use mercadito_storefront::search::{FetchError, PageFetcher, PageView, ProductCard};
use mercadito_storefront::state::AppState;

static TRACING: Once = Once::new();

/// Install a test tracing subscriber once per process.
fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Shared context for integration tests.
pub struct TestContext {
    pub state: AppState,
    // Keeps the durable tier directory alive for the test's duration
    data_dir: TempDir,
}

impl TestContext {
    /// Create a context with a fresh durable tier in a temp directory.
    #[must_use]
    pub fn new() -> Self {
        init_tracing();
        let data_dir = tempfile::tempdir().expect("create temp data dir");
        let state = AppState::new(test_config(data_dir.path()));
        Self { state, data_dir }
    }

    /// Re-open the state over the same durable directory, as a fresh page
    /// session would.
    #[must_use]
    pub fn reopen(&self) -> AppState {
        AppState::new(test_config(self.data_dir.path()))
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration pointing at the test's temp directory.
fn test_config(data_dir: &Path) -> StorefrontConfig {
    StorefrontConfig {
        data_dir: data_dir.to_path_buf(),
        base_url: Url::parse("http://localhost:8080/").expect("static test URL"),
        search: SearchConfig::default(),
    }
}

/// Side effects a [`FakePage`] records, in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEffect {
    ClearHighlights,
    Highlight(usize),
    ScrollIntoView(usize),
    Navigate(String),
    Notice(String),
}

/// Scripted page view recording the engine's side effects.
pub struct FakePage {
    cards: Vec<ProductCard>,
    links: Vec<String>,
    effects: Mutex<Vec<PageEffect>>,
}

impl FakePage {
    /// Create a page with the given cards and menu links.
    #[must_use]
    pub fn new(cards: Vec<ProductCard>, links: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            cards,
            links: links.iter().map(ToString::to_string).collect(),
            effects: Mutex::new(Vec::new()),
        })
    }

    /// Everything the engine asked the page to do, in order.
    #[must_use]
    pub fn effects(&self) -> Vec<PageEffect> {
        self.effects.lock().expect("effects lock").clone()
    }

    fn push(&self, effect: PageEffect) {
        self.effects.lock().expect("effects lock").push(effect);
    }
}

impl PageView for FakePage {
    fn product_cards(&self) -> Vec<ProductCard> {
        self.cards.clone()
    }

    fn menu_links(&self) -> Vec<String> {
        self.links.clone()
    }

    fn clear_highlights(&self) {
        self.push(PageEffect::ClearHighlights);
    }

    fn highlight(&self, index: usize) {
        self.push(PageEffect::Highlight(index));
    }

    fn scroll_into_view(&self, index: usize) {
        self.push(PageEffect::ScrollIntoView(index));
    }

    fn navigate(&self, url: &str) {
        self.push(PageEffect::Navigate(url.to_string()));
    }

    fn show_notice(&self, message: &str) {
        self.push(PageEffect::Notice(message.to_string()));
    }
}

/// Scripted fetcher mapping hrefs to canned bodies or failure statuses,
/// logging fetch order.
#[derive(Default)]
pub struct FakeFetcher {
    pages: HashMap<String, Result<String, u16>>,
    fetched: Mutex<Vec<String>>,
}

impl FakeFetcher {
    /// Create an empty fetcher; every fetch fails with 404.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `href`.
    #[must_use]
    pub fn page(mut self, href: &str, body: &str) -> Self {
        self.pages.insert(href.to_string(), Ok(body.to_string()));
        self
    }

    /// Fail `href` with the given HTTP status.
    #[must_use]
    pub fn failing(mut self, href: &str, status: u16) -> Self {
        self.pages.insert(href.to_string(), Err(status));
        self
    }

    /// Hrefs fetched so far, in order.
    #[must_use]
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().expect("fetched lock").clone()
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch(&self, href: &str) -> Result<String, FetchError> {
        self.fetched.lock().expect("fetched lock").push(href.to_string());
        match self.pages.get(href) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(status)) => Err(FetchError::Status(*status)),
            None => Err(FetchError::Status(404)),
        }
    }
}
