//! Catalog pipeline: price display, sorting, filtering, badges, search suggestions,
//! listing pages and admin analytics.
//!
//! Everything here is pure and synchronous; the API and client layers call into it.

pub mod analytics;
pub mod badges;
pub mod currency;
pub mod filter;
pub mod listing;
pub mod search;
pub mod sorting;

pub use analytics::{inventory, DashboardMetrics, InventoryItem, StockStatus, StockSummary};
pub use badges::{derive_badges, display_badges, Badge, BadgeKind, BadgeRules, StarBreakdown};
pub use currency::{convert_price, format_price, Currency};
pub use filter::{apply_filters, FilterOptions, FilterState};
pub use listing::{paginate, run_listing, ListingQuery, ListingState, Page};
pub use search::{RecentSearches, RequestSequencer, Suggestion, SuggestionKind, SuggestionNavigator};
pub use sorting::{sort_products, SortKey, SortedView};
