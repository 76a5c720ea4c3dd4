//! Incremental product search: debounced local matching plus a sequential
//! cross-page probe.
//!
//! The engine is a small state machine with one active session per query
//! submission:
//!
//! - keystrokes restart a fixed-delay debounce; only the last timer in a
//!   burst fires, then a local match runs as a convenience
//! - explicit submission (Enter or the search button) runs the local match
//!   synchronously and falls back to the remote probe, which fetches each
//!   menu candidate in declared order, one at a time, and navigates to the
//!   first page containing the query
//! - a `#search=` fragment on the next page load re-runs the local match
//!   once the page has had a moment to render
//!
//! Sequential probing keeps "first match in declared order" deterministic
//! and bounds concurrent network use to a single in-flight fetch; the
//! debounce keeps longer card lists from being rescanned on every
//! keystroke.

mod fetcher;
mod view;

pub use fetcher::{FetchError, HttpFetcher, PageFetcher};
pub use view::{PageView, ProductCard};

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Phase of the search state machine.
///
/// Observable for diagnostics and tests; `Found`/`NotFound` are terminal
/// per submission, and the next input returns the engine to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchPhase {
    #[default]
    Idle,
    Debouncing,
    LocalMatch,
    RemoteProbe,
    Found,
    NotFound,
}

/// Outcome of an explicit search submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Empty or whitespace-only query; nothing ran.
    EmptyQuery,
    /// A card on the current page matched and was highlighted.
    Highlighted { index: usize },
    /// A candidate page matched; the view was told to navigate.
    Navigated { url: String },
    /// No match on this page or on any candidate.
    NotFound,
}

/// Debounced local matcher plus sequential cross-page prober.
///
/// One engine exists per page; dropping it (navigation) aborts any pending
/// debounce. Cheaply cloneable for handing to input callbacks. An in-flight
/// candidate fetch is never cancelled, merely ignored if superseded.
#[derive(Clone)]
pub struct SearchEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    view: Arc<dyn PageView>,
    fetcher: Arc<dyn PageFetcher>,
    debounce_delay: Duration,
    rescan_delay: Duration,
    phase: Mutex<SearchPhase>,
    pending: Mutex<Option<JoinHandle<()>>>,
    /// Index of the last highlighted card; a relation, never ownership.
    last_highlighted: Mutex<Option<usize>>,
}

impl Drop for EngineInner {
    fn drop(&mut self) {
        if let Ok(mut pending) = self.pending.lock() {
            if let Some(handle) = pending.take() {
                handle.abort();
            }
        }
    }
}

impl SearchEngine {
    /// Create an engine for the given page.
    #[must_use]
    pub fn new(
        view: Arc<dyn PageView>,
        fetcher: Arc<dyn PageFetcher>,
        debounce_delay: Duration,
        rescan_delay: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                view,
                fetcher,
                debounce_delay,
                rescan_delay,
                phase: Mutex::new(SearchPhase::Idle),
                pending: Mutex::new(None),
                last_highlighted: Mutex::new(None),
            }),
        }
    }

    /// Current phase of the state machine.
    #[must_use]
    pub fn phase(&self) -> SearchPhase {
        self.inner.phase.lock().map_or(SearchPhase::Idle, |phase| *phase)
    }

    /// Index of the most recently highlighted card, if any.
    #[must_use]
    pub fn last_highlighted(&self) -> Option<usize> {
        self.inner
            .last_highlighted
            .lock()
            .map_or(None, |index| *index)
    }

    /// Handle a keystroke: restart the debounce timer for `query`.
    ///
    /// Each call cancels the prior pending timer, so only the final
    /// keystroke in a burst evaluates. Empty input cancels pending work and
    /// schedules nothing. Must be called from within a tokio runtime.
    pub fn on_keystroke(&self, query: &str) {
        self.cancel_pending();
        let query = query.trim().to_string();
        if query.is_empty() {
            self.set_phase(SearchPhase::Idle);
            return;
        }
        self.set_phase(SearchPhase::Debouncing);

        let engine = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(engine.inner.debounce_delay).await;
            // A miss here is a convenience, not a commitment: stay silent
            engine.local_match(&query);
            engine.set_phase(SearchPhase::Idle);
        });
        if let Ok(mut pending) = self.inner.pending.lock() {
            *pending = Some(handle);
        }
    }

    /// Explicit submission (Enter key or button): local match first, then
    /// the remote probe.
    pub async fn submit(&self, query: &str) -> SearchOutcome {
        let query = query.trim();
        if query.is_empty() {
            debug!("ignoring empty search submission");
            self.set_phase(SearchPhase::Idle);
            return SearchOutcome::EmptyQuery;
        }
        self.cancel_pending();

        if let Some(index) = self.local_match(query) {
            self.set_phase(SearchPhase::Idle);
            return SearchOutcome::Highlighted { index };
        }
        self.remote_probe(query).await
    }

    /// Scan the current page for `query`, highlighting the first match.
    ///
    /// Case-insensitive substring match over card name and description, in
    /// DOM order. Returns the matched card index.
    pub fn local_match(&self, query: &str) -> Option<usize> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.set_phase(SearchPhase::LocalMatch);

        let view = &self.inner.view;
        view.clear_highlights();
        let hit = view
            .product_cards()
            .iter()
            .position(|card| card.matches(&needle));
        if let Some(index) = hit {
            view.highlight(index);
            view.scroll_into_view(index);
        }
        if let Ok(mut last) = self.inner.last_highlighted.lock() {
            *last = hit;
        }
        hit
    }

    /// Re-run the local match when a page loads with a `#search=` marker.
    ///
    /// Waits the configured render delay so the cards are in the DOM before
    /// scanning.
    pub async fn on_page_load(&self, fragment: &str) {
        let Some(query) = fragment::parse(fragment) else {
            return;
        };
        debug!(query = %query, "fragment marker present, rescanning after render");
        tokio::time::sleep(self.inner.rescan_delay).await;
        self.local_match(&query);
        self.set_phase(SearchPhase::Idle);
    }

    /// Probe candidate pages sequentially; first match in declared order
    /// wins.
    async fn remote_probe(&self, query: &str) -> SearchOutcome {
        self.set_phase(SearchPhase::RemoteProbe);
        let needle = query.to_lowercase();

        for href in self.inner.view.menu_links() {
            match self.inner.fetcher.fetch(&href).await {
                Ok(text) => {
                    if text.to_lowercase().contains(&needle) {
                        let url = fragment::attach(&href, query);
                        self.inner.view.navigate(&url);
                        self.set_phase(SearchPhase::Found);
                        return SearchOutcome::Navigated { url };
                    }
                }
                Err(e) => {
                    warn!(href = %href, error = %e, "candidate fetch failed, skipping");
                }
            }
        }

        self.inner
            .view
            .show_notice(&format!("No se encontró: \"{query}\""));
        self.set_phase(SearchPhase::NotFound);
        SearchOutcome::NotFound
    }

    fn set_phase(&self, phase: SearchPhase) {
        if let Ok(mut current) = self.inner.phase.lock() {
            *current = phase;
        }
    }

    fn cancel_pending(&self) {
        if let Ok(mut pending) = self.inner.pending.lock() {
            if let Some(handle) = pending.take() {
                handle.abort();
            }
        }
    }
}

/// Fragment marker protocol: `#search=<url-encoded query>`.
///
/// The marker carries search intent across a full page navigation so the
/// destination page can highlight the sought item on load.
pub mod fragment {
    const PREFIX: &str = "search=";

    /// Replace any fragment on `href` with the search marker for `query`.
    #[must_use]
    pub fn attach(href: &str, query: &str) -> String {
        let base = href.split('#').next().unwrap_or(href);
        format!("{base}#{PREFIX}{}", urlencoding::encode(query))
    }

    /// Extract the query from a page fragment, with or without the leading
    /// `#`.
    ///
    /// Returns `None` for absent or undecodable markers and for empty
    /// queries.
    #[must_use]
    pub fn parse(fragment: &str) -> Option<String> {
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
        let encoded = fragment.strip_prefix(PREFIX)?;
        let decoded = urlencoding::decode(encoded).ok()?;
        let query = decoded.trim();
        if query.is_empty() {
            None
        } else {
            Some(query.to_string())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Effect {
        Clear,
        Highlight(usize),
        Scroll(usize),
        Navigate(String),
        Notice(String),
    }

    struct FakePage {
        cards: Vec<ProductCard>,
        links: Vec<String>,
        effects: StdMutex<Vec<Effect>>,
    }

    impl FakePage {
        fn new(cards: Vec<ProductCard>, links: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                cards,
                links: links.iter().map(ToString::to_string).collect(),
                effects: StdMutex::new(Vec::new()),
            })
        }

        fn effects(&self) -> Vec<Effect> {
            self.effects.lock().unwrap().clone()
        }

        fn push(&self, effect: Effect) {
            self.effects.lock().unwrap().push(effect);
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
            self.push(Effect::Clear);
        }

        fn highlight(&self, index: usize) {
            self.push(Effect::Highlight(index));
        }

        fn scroll_into_view(&self, index: usize) {
            self.push(Effect::Scroll(index));
        }

        fn navigate(&self, url: &str) {
            self.push(Effect::Navigate(url.to_string()));
        }

        fn show_notice(&self, message: &str) {
            self.push(Effect::Notice(message.to_string()));
        }
    }

    /// Scripted fetcher mapping hrefs to canned bodies or failure statuses.
    struct FakeFetcher {
        pages: Vec<(String, Result<String, u16>)>,
        fetched: StdMutex<Vec<String>>,
    }

    impl FakeFetcher {
        fn new(pages: &[(&str, Result<&str, u16>)]) -> Arc<Self> {
            Arc::new(Self {
                pages: pages
                    .iter()
                    .map(|(href, result)| {
                        ((*href).to_string(), result.map(ToString::to_string))
                    })
                    .collect(),
                fetched: StdMutex::new(Vec::new()),
            })
        }

        fn fetched(&self) -> Vec<String> {
            self.fetched.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch(&self, href: &str) -> Result<String, FetchError> {
            self.fetched.lock().unwrap().push(href.to_string());
            match self.pages.iter().find(|(known, _)| known == href) {
                Some((_, Ok(body))) => Ok(body.clone()),
                Some((_, Err(status))) => Err(FetchError::Status(*status)),
                None => Err(FetchError::Status(404)),
            }
        }
    }

    fn sample_cards() -> Vec<ProductCard> {
        vec![
            ProductCard::new("Camiseta Azul", "Algodón suave"),
            ProductCard::new("Gorra Roja", "Ajustable"),
            ProductCard::new("Zapatos", "Cuero, talla 42"),
        ]
    }

    fn engine(view: Arc<FakePage>, fetcher: Arc<FakeFetcher>) -> SearchEngine {
        SearchEngine::new(
            view,
            fetcher,
            Duration::from_millis(450),
            Duration::from_millis(300),
        )
    }

    #[tokio::test]
    async fn test_local_match_highlights_first_hit_in_dom_order() {
        let page = FakePage::new(sample_cards(), &[]);
        let engine = engine(Arc::clone(&page), FakeFetcher::new(&[]));

        assert_eq!(engine.local_match("GORRA"), Some(1));
        assert_eq!(
            page.effects(),
            vec![Effect::Clear, Effect::Highlight(1), Effect::Scroll(1)]
        );
        assert_eq!(engine.last_highlighted(), Some(1));
    }

    #[tokio::test]
    async fn test_local_match_scans_descriptions() {
        let page = FakePage::new(sample_cards(), &[]);
        let engine = engine(Arc::clone(&page), FakeFetcher::new(&[]));

        assert_eq!(engine.local_match("cuero"), Some(2));
    }

    #[tokio::test]
    async fn test_local_miss_clears_previous_highlight() {
        let page = FakePage::new(sample_cards(), &[]);
        let engine = engine(Arc::clone(&page), FakeFetcher::new(&[]));

        engine.local_match("gorra");
        assert_eq!(engine.local_match("inexistente"), None);
        assert_eq!(engine.last_highlighted(), None);
        assert_eq!(page.effects().last(), Some(&Effect::Clear));
    }

    #[tokio::test]
    async fn test_submit_empty_query_is_a_noop() {
        let page = FakePage::new(sample_cards(), &["a.html"]);
        let fetcher = FakeFetcher::new(&[("a.html", Ok("camiseta"))]);
        let engine = engine(Arc::clone(&page), Arc::clone(&fetcher));

        assert_eq!(engine.submit("   ").await, SearchOutcome::EmptyQuery);
        assert!(page.effects().is_empty());
        assert!(fetcher.fetched().is_empty());
        assert_eq!(engine.phase(), SearchPhase::Idle);
    }

    #[tokio::test]
    async fn test_submit_prefers_local_match_over_probe() {
        let page = FakePage::new(sample_cards(), &["a.html"]);
        let fetcher = FakeFetcher::new(&[("a.html", Ok("camiseta"))]);
        let engine = engine(Arc::clone(&page), Arc::clone(&fetcher));

        assert_eq!(
            engine.submit("camiseta").await,
            SearchOutcome::Highlighted { index: 0 }
        );
        assert!(fetcher.fetched().is_empty());
    }

    #[tokio::test]
    async fn test_probe_navigates_to_first_match_in_menu_order() {
        let page = FakePage::new(Vec::new(), &["a.html", "b.html", "c.html"]);
        let fetcher = FakeFetcher::new(&[
            ("a.html", Ok("nothing here")),
            ("b.html", Ok("la bufanda perfecta")),
            ("c.html", Ok("bufanda tambien")),
        ]);
        let engine = engine(Arc::clone(&page), Arc::clone(&fetcher));

        let outcome = engine.submit("Bufanda").await;
        assert_eq!(
            outcome,
            SearchOutcome::Navigated {
                url: "b.html#search=Bufanda".to_string()
            }
        );
        // c.html is never fetched: the probe short-circuits on b.html
        assert_eq!(fetcher.fetched(), vec!["a.html", "b.html"]);
        assert_eq!(engine.phase(), SearchPhase::Found);
    }

    #[tokio::test]
    async fn test_probe_skips_failing_candidates() {
        let page = FakePage::new(Vec::new(), &["a.html", "b.html"]);
        let fetcher = FakeFetcher::new(&[
            ("a.html", Err(500)),
            ("b.html", Ok("bufanda")),
        ]);
        let engine = engine(Arc::clone(&page), Arc::clone(&fetcher));

        let outcome = engine.submit("bufanda").await;
        assert_eq!(
            outcome,
            SearchOutcome::Navigated {
                url: "b.html#search=bufanda".to_string()
            }
        );
        assert_eq!(fetcher.fetched(), vec!["a.html", "b.html"]);
    }

    #[tokio::test]
    async fn test_probe_not_found_shows_notice_without_navigating() {
        let page = FakePage::new(Vec::new(), &["a.html"]);
        let fetcher = FakeFetcher::new(&[("a.html", Ok("nothing"))]);
        let engine = engine(Arc::clone(&page), Arc::clone(&fetcher));

        assert_eq!(engine.submit("bufanda").await, SearchOutcome::NotFound);
        assert_eq!(
            page.effects(),
            vec![
                Effect::Clear,
                Effect::Notice("No se encontró: \"bufanda\"".to_string()),
            ]
        );
        assert_eq!(engine.phase(), SearchPhase::NotFound);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_only_final_keystroke_fires() {
        let page = FakePage::new(sample_cards(), &[]);
        let engine = engine(Arc::clone(&page), FakeFetcher::new(&[]));

        engine.on_keystroke("cami");
        engine.on_keystroke("gorra");
        assert_eq!(engine.phase(), SearchPhase::Debouncing);

        // Paused time auto-advances past the debounce timer
        tokio::time::sleep(Duration::from_millis(1_000)).await;

        assert_eq!(
            page.effects(),
            vec![Effect::Clear, Effect::Highlight(1), Effect::Scroll(1)]
        );
        assert_eq!(engine.phase(), SearchPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_keystroke_cancels_pending_work() {
        let page = FakePage::new(sample_cards(), &[]);
        let engine = engine(Arc::clone(&page), FakeFetcher::new(&[]));

        engine.on_keystroke("gorra");
        engine.on_keystroke("   ");

        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert!(page.effects().is_empty());
        assert_eq!(engine.phase(), SearchPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_load_with_marker_rescans_after_delay() {
        let page = FakePage::new(sample_cards(), &[]);
        let engine = engine(Arc::clone(&page), FakeFetcher::new(&[]));

        engine.on_page_load("#search=gorra%20roja").await;
        assert_eq!(
            page.effects(),
            vec![Effect::Clear, Effect::Highlight(1), Effect::Scroll(1)]
        );
    }

    #[tokio::test]
    async fn test_page_load_without_marker_does_nothing() {
        let page = FakePage::new(sample_cards(), &[]);
        let engine = engine(Arc::clone(&page), FakeFetcher::new(&[]));

        engine.on_page_load("#top").await;
        engine.on_page_load("").await;
        assert!(page.effects().is_empty());
    }

    #[test]
    fn test_fragment_round_trip() {
        let url = fragment::attach("ropa.html", "gorra roja");
        assert_eq!(url, "ropa.html#search=gorra%20roja");
        assert_eq!(
            fragment::parse("#search=gorra%20roja").as_deref(),
            Some("gorra roja")
        );
    }

    #[test]
    fn test_fragment_attach_replaces_existing_fragment() {
        let url = fragment::attach("ropa.html#seccion", "gorra");
        assert_eq!(url, "ropa.html#search=gorra");
    }

    #[test]
    fn test_fragment_parse_rejects_blank_and_foreign_markers() {
        assert_eq!(fragment::parse("#search="), None);
        assert_eq!(fragment::parse("#search=%20%20"), None);
        assert_eq!(fragment::parse("#seccion"), None);
        assert_eq!(fragment::parse(""), None);
    }
}
