//! Search box behaviour: debounced lookups, merged suggestions, keyboard selection
//! and recent-search history.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OnceCell};

use crate::catalog::search::{build_suggestions, idle_suggestions, MAX_PRODUCT_SUGGESTIONS};
use crate::catalog::{RecentSearches, RequestSequencer, Suggestion, SuggestionNavigator};
use crate::client::{CatalogSource, PreferenceStore};
use crate::domain::aggregates::Category;

pub const DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Default)]
struct SearchBox {
    query: String,
    suggestions: Vec<Suggestion>,
    navigator: SuggestionNavigator,
    recent: RecentSearches,
}

impl SearchBox {
    fn show(&mut self, suggestions: Vec<Suggestion>) -> Vec<Suggestion> {
        self.navigator.reset(suggestions.len());
        self.suggestions = suggestions;
        self.suggestions.clone()
    }

    fn selected(&self) -> Option<Suggestion> {
        self.navigator.selected().and_then(|i| self.suggestions.get(i)).cloned()
    }
}

pub struct AutocompleteSession<S> {
    source: Arc<S>,
    sequencer: RequestSequencer,
    debounce: Duration,
    categories: OnceCell<Vec<Category>>,
    store: Option<Arc<PreferenceStore>>,
    state: Mutex<SearchBox>,
}

impl<S: CatalogSource> AutocompleteSession<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            sequencer: RequestSequencer::new(),
            debounce: DEBOUNCE,
            categories: OnceCell::new(),
            store: None,
            state: Mutex::new(SearchBox::default()),
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Restores recent searches from `store` and persists future submissions to it.
    pub async fn with_store(mut self, store: Arc<PreferenceStore>) -> Self {
        let recent = store.get().await.recent_searches;
        self.state.get_mut().recent = recent;
        self.store = Some(store);
        self
    }

    /// Handles a keystroke. Returns the new suggestion list, or `None` when newer
    /// input arrived before this lookup finished.
    pub async fn input(&self, text: &str) -> Option<Vec<Suggestion>> {
        let seq = self.sequencer.next();
        {
            let mut state = self.state.lock().await;
            state.query = text.to_string();
            if text.trim().is_empty() {
                let idle = idle_suggestions(&state.recent);
                return Some(state.show(idle));
            }
        }

        tokio::time::sleep(self.debounce).await;
        if !self.sequencer.is_current(seq) {
            return None;
        }

        let term = text.trim();
        let products = match self.source.search(term, MAX_PRODUCT_SUGGESTIONS).await {
            Ok(products) => products,
            Err(e) => {
                tracing::warn!(term, error = %e, "product suggestions unavailable");
                Vec::new()
            }
        };
        let categories = self.categories().await;

        let mut state = self.state.lock().await;
        if !self.sequencer.is_current(seq) {
            tracing::debug!(seq, term, "discarding stale suggestions");
            return None;
        }
        let merged = build_suggestions(term, &products, categories);
        Some(state.show(merged))
    }

    // Loaded once per session; a failed load is retried on the next lookup.
    async fn categories(&self) -> &[Category] {
        match self.categories.get_or_try_init(|| self.source.categories()).await {
            Ok(categories) => categories,
            Err(e) => {
                tracing::warn!(error = %e, "category suggestions unavailable");
                &[]
            }
        }
    }

    pub async fn suggestions(&self) -> Vec<Suggestion> {
        self.state.lock().await.suggestions.clone()
    }

    pub async fn move_down(&self) -> Option<Suggestion> {
        let mut state = self.state.lock().await;
        state.navigator.down();
        state.selected()
    }

    pub async fn move_up(&self) -> Option<Suggestion> {
        let mut state = self.state.lock().await;
        state.navigator.up();
        state.selected()
    }

    pub async fn recent_searches(&self) -> RecentSearches {
        self.state.lock().await.recent.clone()
    }

    /// Submits the highlighted suggestion, or the typed text when nothing is
    /// highlighted, and records it as a recent search. Returns the submitted term.
    pub async fn submit(&self) -> Option<String> {
        let (term, recent) = {
            let mut state = self.state.lock().await;
            let term = state.selected().map_or_else(|| state.query.trim().to_string(), |s| s.text);
            if term.is_empty() {
                return None;
            }
            state.recent.record(&term);
            state.query.clear();
            let idle = idle_suggestions(&state.recent);
            state.show(idle);
            (term, state.recent.clone())
        };
        self.sequencer.next();

        if let Some(store) = &self.store {
            if let Err(e) = store.set_recent_searches(recent).await {
                tracing::warn!(error = %e, "failed to save recent searches");
            }
        }
        Some(term)
    }

    pub async fn clear_recent(&self) {
        let mut state = self.state.lock().await;
        state.recent.clear();
        if state.query.trim().is_empty() {
            let idle = idle_suggestions(&state.recent);
            state.show(idle);
        }
        drop(state);
        if let Some(store) = &self.store {
            if let Err(e) = store.clear_recent_searches().await {
                tracing::warn!(error = %e, "failed to clear recent searches");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::catalog::search::POPULAR_SEARCHES;
    use crate::catalog::{ListingQuery, Page, SuggestionKind};
    use crate::client::ClientError;
    use crate::domain::aggregates::Product;

    #[derive(Default)]
    struct FakeCatalog {
        searches: AtomicUsize,
        category_loads: AtomicUsize,
    }

    #[async_trait]
    impl CatalogSource for FakeCatalog {
        async fn fetch_page(&self, _query: &ListingQuery) -> Result<Page<Product>, ClientError> {
            Ok(Page::empty(1, 12))
        }

        async fn search(&self, term: &str, _limit: usize) -> Result<Vec<Product>, ClientError> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            if term == "offline" {
                return Err(ClientError::Api {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    code: "unavailable".into(),
                    message: "down".into(),
                });
            }
            let delay = if term.starts_with("slow") { 80 } else { 1 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(vec![Product::new(format!("{term} product"), Decimal::ONE, "misc")])
        }

        async fn categories(&self) -> Result<Vec<Category>, ClientError> {
            self.category_loads.fetch_add(1, Ordering::SeqCst);
            Ok(vec![Category {
                id: uuid::Uuid::now_v7(),
                name: "Denim".into(),
                slug: "denim".into(),
                image: None,
                description: None,
                created_at: chrono::Utc::now(),
            }])
        }
    }

    fn session(source: Arc<FakeCatalog>) -> AutocompleteSession<FakeCatalog> {
        AutocompleteSession::new(source).with_debounce(Duration::from_millis(20))
    }

    #[tokio::test]
    async fn empty_input_shows_idle_suggestions_without_fetching() {
        let source = Arc::new(FakeCatalog::default());
        let session = session(Arc::clone(&source));
        let shown = session.input("   ").await.unwrap();
        assert_eq!(shown.len(), 6);
        assert_eq!(shown[0].text, POPULAR_SEARCHES[0]);
        assert_eq!(source.searches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rapid_typing_only_fetches_the_last_input() {
        let source = Arc::new(FakeCatalog::default());
        let session = Arc::new(session(Arc::clone(&source)));
        let first = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.input("den").await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = session.input("denim").await.unwrap();

        assert_eq!(first.await.unwrap(), None);
        assert_eq!(source.searches.load(Ordering::SeqCst), 1);
        assert_eq!(second[0].text, "denim product");
        assert!(second.iter().any(|s| s.kind == SuggestionKind::Category { slug: "denim".into() }));
    }

    #[tokio::test]
    async fn stale_response_never_overwrites_newer_suggestions() {
        let source = Arc::new(FakeCatalog::default());
        let session = Arc::new(session(Arc::clone(&source)));
        let slow = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.input("slow").await })
        };
        // Let the slow lookup get past its debounce before typing again.
        tokio::time::sleep(Duration::from_millis(40)).await;
        session.input("jeans").await.unwrap();

        assert_eq!(slow.await.unwrap(), None);
        assert_eq!(session.suggestions().await[0].text, "jeans product");
        assert_eq!(source.category_loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_search_empties_product_suggestions() {
        let session = session(Arc::new(FakeCatalog::default()));
        let shown = session.input("offline").await.unwrap();
        assert!(shown.iter().all(|s| !matches!(s.kind, SuggestionKind::Product { .. })));
    }

    #[tokio::test]
    async fn submit_records_selection_and_persists_it() {
        let path = std::env::temp_dir().join(format!("storefront-autocomplete-{}.json", uuid::Uuid::new_v4()));
        let store = Arc::new(PreferenceStore::load(&path).await);
        let session = session(Arc::new(FakeCatalog::default())).with_store(Arc::clone(&store)).await;

        session.input("jeans").await.unwrap();
        assert_eq!(session.move_up().await, None);
        assert_eq!(session.move_down().await.map(|s| s.text), Some("jeans product".to_string()));
        assert_eq!(session.submit().await.as_deref(), Some("jeans product"));

        assert_eq!(session.recent_searches().await.iter().collect::<Vec<_>>(), ["jeans product"]);
        assert_eq!(session.suggestions().await[0].kind, SuggestionKind::Recent);
        let saved = store.get().await.recent_searches;
        assert_eq!(saved.iter().collect::<Vec<_>>(), ["jeans product"]);

        session.clear_recent().await;
        assert!(store.get().await.recent_searches.is_empty());
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn submit_with_nothing_typed_is_ignored() {
        let session = session(Arc::new(FakeCatalog::default()));
        assert_eq!(session.submit().await, None);
    }
}
