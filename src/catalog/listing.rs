//! Listing pages: search, category, facet filters, sort and pagination in one pass.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::filter::{apply_filters, FilterState};
use crate::catalog::sorting::{sort_products, SortKey};
use crate::domain::aggregates::Product;

pub const DEFAULT_PAGE_SIZE: u32 = 12;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Query string of `GET /products`.
///
/// Kept flat (no nested filter struct) so it round-trips through urlencoded query strings.
/// `sizes` and `colors` are comma-separated.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

fn split_list(raw: Option<&str>) -> Option<Vec<String>> {
    let values: Vec<String> = raw?
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect();
    (!values.is_empty()).then_some(values)
}

fn join_list(values: Option<&Vec<String>>) -> Option<String> {
    values.filter(|v| !v.is_empty()).map(|v| v.join(","))
}

impl ListingQuery {
    pub fn filters(&self) -> FilterState {
        FilterState {
            min_price: self.min_price,
            max_price: self.max_price,
            min_rating: self.min_rating,
            sizes: split_list(self.sizes.as_deref()),
            colors: split_list(self.colors.as_deref()),
            in_stock: self.in_stock,
        }
    }

    pub fn with_filters(mut self, filters: &FilterState) -> Self {
        self.min_price = filters.min_price;
        self.max_price = filters.max_price;
        self.min_rating = filters.min_rating;
        self.sizes = join_list(filters.sizes.as_ref());
        self.colors = join_list(filters.colors.as_ref());
        self.in_stock = filters.in_stock;
        self
    }

    pub fn sort_key(&self) -> SortKey { self.sort.unwrap_or_default() }

    pub fn page(&self) -> u32 { self.page.unwrap_or(1).max(1) }

    pub fn limit(&self) -> u32 { self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE) }

    /// Category slug to restrict to; `all` and blank mean no restriction.
    pub fn category_slug(&self) -> Option<&str> {
        self.category.as_deref().map(str::trim).filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"))
    }

    pub fn search_term(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: usize,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn empty(page: u32, limit: u32) -> Self {
        Self { items: Vec::new(), page, limit, total: 0, total_pages: 0 }
    }

    pub fn has_next(&self) -> bool { self.page < self.total_pages }
}

/// Slices one page out of `items`. Pages past the end come back empty with correct totals.
pub fn paginate<T>(items: Vec<T>, page: u32, limit: u32) -> Page<T> {
    let total = items.len();
    let limit = limit.max(1);
    let total_pages = u32::try_from(total.div_ceil(limit as usize)).unwrap_or(u32::MAX);
    let start = (page.max(1) as usize - 1).saturating_mul(limit as usize);
    let items = items.into_iter().skip(start).take(limit as usize).collect();
    Page { items, page: page.max(1), limit, total, total_pages }
}

pub fn matches_search(product: &Product, term: &str) -> bool {
    let term = term.to_lowercase();
    product.title.to_lowercase().contains(&term)
        || product.category.to_lowercase().contains(&term)
        || product.description.as_deref().is_some_and(|d| d.to_lowercase().contains(&term))
}

/// Runs the whole listing pipeline: search term, category, facet filters, sort, page.
pub fn run_listing(products: &[Product], query: &ListingQuery) -> Page<Product> {
    let scoped: Vec<Product> = products
        .iter()
        .filter(|p| p.is_active)
        .filter(|p| query.search_term().map_or(true, |q| matches_search(p, q)))
        .filter(|p| query.category_slug().map_or(true, |c| p.category.eq_ignore_ascii_case(c)))
        .cloned()
        .collect();
    let filtered = apply_filters(&scoped, &query.filters());
    let sorted = sort_products(&filtered, query.sort_key());
    paginate(sorted, query.page(), query.limit())
}

/// Lifecycle of a listing page: `Idle -> Loading -> Loaded | Failed`.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ListingState {
    #[default]
    Idle,
    Loading,
    Loaded(Page<Product>),
    Failed(String),
}

impl ListingState {
    /// Items to render; a failed load renders as an empty list.
    pub fn items(&self) -> &[Product] {
        match self {
            Self::Loaded(page) => &page.items,
            _ => &[],
        }
    }

    pub fn page(&self) -> Option<&Page<Product>> {
        match self {
            Self::Loaded(page) => Some(page),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool { matches!(self, Self::Loading) }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn product(title: &str, category: &str, price: i64, age_days: i64) -> Product {
        let mut p = Product::new(title, Decimal::new(price, 0), category);
        p.stock = 10;
        p.created_at = Utc::now() - Duration::days(age_days);
        p
    }

    fn catalog() -> Vec<Product> {
        vec![
            product("Oxford Shirt", "shirts", 40, 10),
            product("Flannel Shirt", "shirts", 35, 2),
            product("Chino", "pants", 50, 5),
            product("Linen Shirt", "shirts", 30, 1),
            product("Cargo", "pants", 45, 20),
        ]
    }

    #[test]
    fn paginate_reports_totals_beyond_the_end() {
        let page = paginate((1..=25).collect::<Vec<_>>(), 3, 10);
        assert_eq!(page.items, (21..=25).collect::<Vec<_>>());
        assert_eq!(page.total_pages, 3);
        assert!(!page.has_next());
        let past = paginate((1..=25).collect::<Vec<_>>(), 9, 10);
        assert!(past.items.is_empty());
        assert_eq!(past.total, 25);
        assert_eq!(paginate(Vec::<u8>::new(), 1, 10).total_pages, 0);
    }

    #[test]
    fn listing_scopes_filters_sorts_and_pages() {
        let query = ListingQuery {
            category: Some("shirts".into()),
            max_price: Some(Decimal::new(39, 0)),
            sort: Some(SortKey::PriceLow),
            limit: Some(1),
            page: Some(2),
            ..ListingQuery::default()
        };
        let page = run_listing(&catalog(), &query);
        assert_eq!(page.total, 2);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items[0].title, "Flannel Shirt");
    }

    #[test]
    fn newest_sort_matches_created_at_order_across_categories() {
        let query = ListingQuery { sort: Some(SortKey::Newest), category: Some("all".into()), ..ListingQuery::default() };
        let page = run_listing(&catalog(), &query);
        let mut expected = catalog();
        expected.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let got: Vec<&str> = page.items.iter().map(|p| p.title.as_str()).collect();
        let want: Vec<&str> = expected.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(got, want);
    }

    #[test]
    fn search_term_matches_title_and_category() {
        let query = ListingQuery { q: Some("  PANTS ".into()), ..ListingQuery::default() };
        assert_eq!(run_listing(&catalog(), &query).total, 2);
        let query = ListingQuery { q: Some("linen".into()), ..ListingQuery::default() };
        assert_eq!(run_listing(&catalog(), &query).items[0].title, "Linen Shirt");
    }

    #[test]
    fn inactive_products_are_never_listed() {
        let mut all = catalog();
        all[0].is_active = false;
        assert_eq!(run_listing(&all, &ListingQuery::default()).total, 4);
    }

    #[test]
    fn query_list_params_round_trip_to_filters() {
        let filters = FilterState { sizes: Some(vec!["S".into(), "M".into()]), in_stock: Some(true), ..FilterState::default() };
        let query = ListingQuery::default().with_filters(&filters);
        assert_eq!(query.sizes.as_deref(), Some("S,M"));
        assert_eq!(query.filters(), filters);
        assert_eq!(ListingQuery { sizes: Some(" , ".into()), ..ListingQuery::default() }.filters().sizes, None);
    }

    #[test]
    fn limits_are_clamped() {
        let q = ListingQuery { limit: Some(1000), page: Some(0), ..ListingQuery::default() };
        assert_eq!(q.limit(), MAX_PAGE_SIZE);
        assert_eq!(q.page(), 1);
    }

    #[test]
    fn failed_state_renders_empty() {
        let state = ListingState::Failed("timeout".into());
        assert!(state.items().is_empty());
        assert_eq!(state.error(), Some("timeout"));
    }
}
