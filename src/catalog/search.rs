//! Search suggestions: merging sources, keyboard navigation, recent searches and
//! request sequencing for out-of-order responses.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

use crate::domain::aggregates::{Category, Product};

pub const POPULAR_SEARCHES: [&str; 8] = [
    "t-shirt", "jeans", "sneakers", "summer dress", "hoodie", "denim jacket", "watch", "backpack",
];

pub const MAX_PRODUCT_SUGGESTIONS: usize = 5;
pub const MAX_CATEGORY_SUGGESTIONS: usize = 3;
pub const MAX_POPULAR_SUGGESTIONS: usize = 3;
/// Popular terms shown when the input is empty.
pub const IDLE_POPULAR_SUGGESTIONS: usize = 6;
pub const MAX_RECENT_SEARCHES: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SuggestionKind {
    Product { id: Uuid },
    Category { slug: String },
    Popular,
    Recent,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    #[serde(flatten)]
    pub kind: SuggestionKind,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Suggestion {
    fn popular(term: &str) -> Self { Self { kind: SuggestionKind::Popular, text: term.to_string(), image: None } }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Live suggestions for a non-empty query: product hits from the search endpoint,
/// then matching categories, then matching popular terms.
pub fn build_suggestions(query: &str, products: &[Product], categories: &[Category]) -> Vec<Suggestion> {
    let query = query.trim();
    let product_hits = products.iter().take(MAX_PRODUCT_SUGGESTIONS).map(|p| Suggestion {
        kind: SuggestionKind::Product { id: p.id },
        text: p.title.clone(),
        image: p.primary_image().map(str::to_string),
    });
    let category_hits = categories
        .iter()
        .filter(|c| contains_ci(&c.name, query))
        .take(MAX_CATEGORY_SUGGESTIONS)
        .map(|c| Suggestion { kind: SuggestionKind::Category { slug: c.slug.clone() }, text: c.name.clone(), image: c.image.clone() });
    let popular_hits = POPULAR_SEARCHES
        .iter()
        .filter(|term| contains_ci(term, query))
        .take(MAX_POPULAR_SUGGESTIONS)
        .map(|term| Suggestion::popular(term));
    product_hits.chain(category_hits).chain(popular_hits).collect()
}

/// What the dropdown shows before anything is typed: recent searches, then popular terms.
pub fn idle_suggestions(recent: &RecentSearches) -> Vec<Suggestion> {
    recent
        .iter()
        .map(|term| Suggestion { kind: SuggestionKind::Recent, text: term.to_string(), image: None })
        .chain(POPULAR_SEARCHES.iter().take(IDLE_POPULAR_SUGGESTIONS).map(|term| Suggestion::popular(term)))
        .collect()
}

/// Recently submitted searches, most recent first, deduplicated case-insensitively.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecentSearches(Vec<String>);

impl RecentSearches {
    pub fn new() -> Self { Self::default() }

    pub fn from_terms(terms: impl IntoIterator<Item = String>) -> Self {
        let mut recent = Self::new();
        let mut terms: Vec<String> = terms.into_iter().collect();
        terms.reverse();
        for term in terms { recent.record(&term); }
        recent
    }

    pub fn record(&mut self, term: &str) {
        let term = term.trim();
        if term.is_empty() { return; }
        self.0.retain(|t| !t.eq_ignore_ascii_case(term));
        self.0.insert(0, term.to_string());
        self.0.truncate(MAX_RECENT_SEARCHES);
    }

    pub fn clear(&mut self) { self.0.clear(); }
    pub fn iter(&self) -> impl Iterator<Item = &str> { self.0.iter().map(String::as_str) }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

/// Arrow-key selection over the current suggestion list. `None` means the input itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SuggestionNavigator {
    len: usize,
    selected: Option<usize>,
}

impl SuggestionNavigator {
    pub fn new(len: usize) -> Self { Self { len, selected: None } }

    pub fn selected(&self) -> Option<usize> { self.selected }

    /// Called whenever the suggestion list is replaced.
    pub fn reset(&mut self, len: usize) { *self = Self::new(len); }

    pub fn down(&mut self) -> Option<usize> {
        if self.len == 0 { return None; }
        self.selected = Some(self.selected.map_or(0, |i| (i + 1).min(self.len - 1)));
        self.selected
    }

    pub fn up(&mut self) -> Option<usize> {
        self.selected = match self.selected {
            Some(0) | None => None,
            Some(i) => Some(i - 1),
        };
        self.selected
    }
}

/// Hands out increasing sequence numbers so responses to superseded requests can be dropped.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    pub fn new() -> Self { Self::default() }

    pub fn next(&self) -> u64 { self.latest.fetch_add(1, Ordering::SeqCst) + 1 }

    pub fn is_current(&self, seq: u64) -> bool { self.latest.load(Ordering::SeqCst) == seq }
}
