use std::sync::Arc;

use tokio::sync::Mutex;

use crate::catalog::{ListingQuery, ListingState, RequestSequencer};
use crate::client::CatalogSource;

/// Drives one listing page. Each `load` supersedes the previous one; a response that
/// arrives after a newer load started is dropped.
pub struct ListingController<S> {
    source: Arc<S>,
    sequencer: RequestSequencer,
    state: Mutex<ListingState>,
}

impl<S: CatalogSource> ListingController<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self { source, sequencer: RequestSequencer::new(), state: Mutex::new(ListingState::Idle) }
    }

    pub async fn state(&self) -> ListingState {
        self.state.lock().await.clone()
    }

    /// Fetches `query` and returns the state after it settles. When the load was
    /// superseded the returned state belongs to the newer request.
    pub async fn load(&self, query: &ListingQuery) -> ListingState {
        let seq = self.sequencer.next();
        *self.state.lock().await = ListingState::Loading;

        let result = self.source.fetch_page(query).await;

        let mut state = self.state.lock().await;
        if !self.sequencer.is_current(seq) {
            tracing::debug!(seq, "discarding superseded listing response");
            return state.clone();
        }
        *state = match result {
            Ok(page) => ListingState::Loaded(page),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load listing page");
                ListingState::Failed(e.to_string())
            }
        };
        state.clone()
    }
}
