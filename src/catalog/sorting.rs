//! Product ordering for listing pages.

use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, convert::Infallible, fmt, str::FromStr};

use crate::domain::aggregates::Product;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    PriceLow,
    PriceHigh,
    NameAsc,
    NameDesc,
    Newest,
    Oldest,
    RatingHigh,
    RatingLow,
    Popularity,
    StockHigh,
    StockLow,
    Discount,
    #[default]
    #[serde(other)]
    Default,
}

impl SortKey {
    pub const ALL: [SortKey; 13] = [
        Self::PriceLow, Self::PriceHigh, Self::NameAsc, Self::NameDesc, Self::Newest, Self::Oldest,
        Self::RatingHigh, Self::RatingLow, Self::Popularity, Self::StockHigh, Self::StockLow,
        Self::Discount, Self::Default,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PriceLow => "price-low",
            Self::PriceHigh => "price-high",
            Self::NameAsc => "name-asc",
            Self::NameDesc => "name-desc",
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::RatingHigh => "rating-high",
            Self::RatingLow => "rating-low",
            Self::Popularity => "popularity",
            Self::StockHigh => "stock-high",
            Self::StockLow => "stock-low",
            Self::Discount => "discount",
            Self::Default => "default",
        }
    }

    fn compare(&self, a: &Product, b: &Product) -> Ordering {
        match self {
            Self::PriceLow => a.price.cmp(&b.price),
            Self::PriceHigh => b.price.cmp(&a.price),
            Self::NameAsc => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            Self::NameDesc => b.title.to_lowercase().cmp(&a.title.to_lowercase()),
            Self::Newest => b.created_at.cmp(&a.created_at),
            Self::Oldest => a.created_at.cmp(&b.created_at),
            Self::RatingHigh => rating(b).total_cmp(&rating(a)),
            Self::RatingLow => rating(a).total_cmp(&rating(b)),
            Self::Popularity => b.views.unwrap_or(0).cmp(&a.views.unwrap_or(0)),
            Self::StockHigh => b.stock.cmp(&a.stock),
            Self::StockLow => a.stock.cmp(&b.stock),
            Self::Discount => b.discount_percent().unwrap_or_default().cmp(&a.discount_percent().unwrap_or_default()),
            Self::Default => Ordering::Equal,
        }
    }
}

fn rating(p: &Product) -> f64 { p.average_rating.unwrap_or(0.0) }

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Unknown keys fall back to [`SortKey::Default`].
impl FromStr for SortKey {
    type Err = Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::ALL.into_iter().find(|k| k.as_str() == s).unwrap_or_default())
    }
}

/// Returns a freshly ordered copy of `items`. The sort is stable, so ties and the
/// `default` key keep input order.
pub fn sort_products(items: &[Product], key: SortKey) -> Vec<Product> {
    let mut sorted = items.to_vec();
    if key != SortKey::Default {
        sorted.sort_by(|a, b| key.compare(a, b));
    }
    sorted
}

/// Sorted view over a product list that only re-sorts when the items or the key change.
#[derive(Debug, Clone, Default)]
pub struct SortedView {
    items: Vec<Product>,
    sort_by: SortKey,
    cache: Option<Vec<Product>>,
    recomputations: usize,
}

impl SortedView {
    pub fn new(items: Vec<Product>, default_key: SortKey) -> Self {
        Self { items, sort_by: default_key, cache: None, recomputations: 0 }
    }

    pub fn sort_by(&self) -> SortKey { self.sort_by }

    pub fn set_sort_by(&mut self, key: SortKey) {
        if key != self.sort_by {
            self.sort_by = key;
            self.cache = None;
        }
    }

    pub fn set_items(&mut self, items: Vec<Product>) {
        self.items = items;
        self.cache = None;
    }

    pub fn sorted_items(&mut self) -> &[Product] {
        let recomputations = &mut self.recomputations;
        self.cache.get_or_insert_with(|| {
            *recomputations += 1;
            sort_products(&self.items, self.sort_by)
        }).as_slice()
    }

    /// Number of times the list has actually been re-sorted.
    pub fn recomputations(&self) -> usize { self.recomputations }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    fn product(title: &str, price: i64, stock: i32) -> Product {
        let mut p = Product::new(title, Decimal::new(price, 0), "misc");
        p.stock = stock;
        p
    }

    fn titles(items: &[Product]) -> Vec<&str> { items.iter().map(|p| p.title.as_str()).collect() }

    #[test]
    fn price_low_is_non_decreasing() {
        let items = vec![product("a", 30, 1), product("b", 10, 1), product("c", 20, 1), product("d", 10, 1)];
        let sorted = sort_products(&items, SortKey::PriceLow);
        assert!(sorted.windows(2).all(|w| w[0].price <= w[1].price));
        // stable on ties
        assert_eq!(titles(&sorted), ["b", "d", "c", "a"]);
    }

    #[test]
    fn default_key_is_idempotent_and_preserves_input() {
        let items = vec![product("z", 1, 1), product("a", 2, 1), product("m", 3, 1)];
        let once = sort_products(&items, SortKey::Default);
        let twice = sort_products(&once, SortKey::Default);
        assert_eq!(titles(&twice), titles(&items));
    }

    #[test]
    fn newest_and_oldest_follow_created_at() {
        let now = Utc::now();
        let mut items: Vec<Product> = (0..4).map(|i| product(&format!("p{i}"), 5, 1)).collect();
        for (i, p) in items.iter_mut().enumerate() {
            p.created_at = now - Duration::days([3, 1, 4, 2][i]);
        }
        let newest = sort_products(&items, SortKey::Newest);
        assert!(newest.windows(2).all(|w| w[0].created_at >= w[1].created_at));
        assert_eq!(titles(&newest), ["p1", "p3", "p0", "p2"]);
        let oldest = sort_products(&items, SortKey::Oldest);
        assert_eq!(titles(&oldest), ["p2", "p0", "p3", "p1"]);
    }

    #[test]
    fn missing_fields_compare_as_zero() {
        let mut rated = product("rated", 5, 1);
        rated.average_rating = Some(3.5);
        rated.views = Some(10);
        let unrated = product("unrated", 5, 1);
        let items = vec![unrated, rated];
        assert_eq!(titles(&sort_products(&items, SortKey::RatingHigh)), ["rated", "unrated"]);
        assert_eq!(titles(&sort_products(&items, SortKey::RatingLow)), ["unrated", "rated"]);
        assert_eq!(titles(&sort_products(&items, SortKey::Popularity)), ["rated", "unrated"]);
    }

    #[test]
    fn discount_orders_by_percentage() {
        let mut half = product("half", 50, 1);
        half.original_price = Some(Decimal::new(100, 0));
        let mut tenth = product("tenth", 90, 1);
        tenth.original_price = Some(Decimal::new(100, 0));
        let none = product("none", 10, 1);
        let sorted = sort_products(&[none, tenth, half], SortKey::Discount);
        assert_eq!(titles(&sorted), ["half", "tenth", "none"]);
    }

    #[test]
    fn name_and_stock_keys() {
        let items = vec![product("banana", 1, 5), product("Apple", 1, 0), product("cherry", 1, 9)];
        assert_eq!(titles(&sort_products(&items, SortKey::NameAsc)), ["Apple", "banana", "cherry"]);
        assert_eq!(titles(&sort_products(&items, SortKey::NameDesc)), ["cherry", "banana", "Apple"]);
        assert_eq!(titles(&sort_products(&items, SortKey::StockHigh)), ["cherry", "banana", "Apple"]);
        assert_eq!(titles(&sort_products(&items, SortKey::StockLow)), ["Apple", "banana", "cherry"]);
        assert_eq!(titles(&sort_products(&items, SortKey::PriceHigh)), ["banana", "Apple", "cherry"]);
    }

    #[test]
    fn unknown_keys_fall_back_to_default() {
        assert_eq!("price-low".parse::<SortKey>().unwrap(), SortKey::PriceLow);
        assert_eq!("bestsellers".parse::<SortKey>().unwrap(), SortKey::Default);
        assert_eq!(serde_json::from_str::<SortKey>("\"bogus\"").unwrap(), SortKey::Default);
        assert!(sort_products(&[], SortKey::PriceHigh).is_empty());
    }

    #[test]
    fn sorted_view_memoizes_until_inputs_change() {
        let mut view = SortedView::new(vec![product("b", 2, 1), product("a", 1, 1)], SortKey::PriceLow);
        assert_eq!(titles(view.sorted_items()), ["a", "b"]);
        let _ = view.sorted_items();
        assert_eq!(view.recomputations(), 1);
        view.set_sort_by(SortKey::PriceLow);
        let _ = view.sorted_items();
        assert_eq!(view.recomputations(), 1);
        view.set_sort_by(SortKey::PriceHigh);
        assert_eq!(titles(view.sorted_items()), ["b", "a"]);
        assert_eq!(view.recomputations(), 2);
        view.set_items(vec![product("c", 3, 1)]);
        assert_eq!(titles(view.sorted_items()), ["c"]);
        assert_eq!(view.recomputations(), 3);
    }
}
