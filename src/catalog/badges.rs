//! Product card badges and star ratings, derived from product fields at render time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::Product;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BadgeKind { New, LowStock, OutOfStock, Discount, Hot }

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub kind: BadgeKind,
    pub label: String,
    pub weight: u8,
}

/// Thresholds and display priority for badge derivation.
///
/// `priority` is the ordered list of `(kind, weight)` pairs. Displayed badges are the
/// highest weights; equal weights keep list order.
#[derive(Clone, Debug, PartialEq)]
pub struct BadgeRules {
    pub new_within: Duration,
    pub low_stock_max: i32,
    pub hot_min_rating: f64,
    pub hot_min_reviews: i32,
    pub display_limit: usize,
    pub priority: Vec<(BadgeKind, u8)>,
}

impl Default for BadgeRules {
    fn default() -> Self {
        Self {
            new_within: Duration::days(7),
            low_stock_max: 5,
            hot_min_rating: 4.5,
            hot_min_reviews: 10,
            display_limit: 2,
            priority: vec![
                (BadgeKind::New, 50),
                (BadgeKind::LowStock, 40),
                (BadgeKind::OutOfStock, 30),
                (BadgeKind::Discount, 20),
                (BadgeKind::Hot, 10),
            ],
        }
    }
}

impl BadgeRules {
    pub fn is_low_stock(&self, product: &Product) -> bool {
        product.stock > 0 && product.stock <= self.low_stock_max
    }

    fn label(&self, kind: BadgeKind, product: &Product, now: DateTime<Utc>) -> Option<String> {
        match kind {
            BadgeKind::New => (now - product.created_at <= self.new_within).then(|| "New".to_string()),
            BadgeKind::LowStock => self.is_low_stock(product).then(|| format!("Only {} left", product.stock)),
            BadgeKind::OutOfStock => (product.stock <= 0).then(|| "Out of Stock".to_string()),
            BadgeKind::Discount => product.discount_percent().map(|pct| format!("-{pct}%")),
            BadgeKind::Hot => {
                let hot = product.average_rating.unwrap_or(0.0) >= self.hot_min_rating
                    && product.total_reviews.unwrap_or(0) >= self.hot_min_reviews;
                hot.then(|| "Hot".to_string())
            }
        }
    }
}

/// Every badge that applies to `product`, in priority-list order.
pub fn derive_badges(product: &Product, rules: &BadgeRules, now: DateTime<Utc>) -> Vec<Badge> {
    rules
        .priority
        .iter()
        .filter_map(|&(kind, weight)| rules.label(kind, product, now).map(|label| Badge { kind, label, weight }))
        .collect()
}

/// The badges a product card shows: highest weight first, capped at `display_limit`.
pub fn display_badges(product: &Product, rules: &BadgeRules, now: DateTime<Utc>) -> Vec<Badge> {
    let mut badges = derive_badges(product, rules, now);
    badges.sort_by(|a, b| b.weight.cmp(&a.weight));
    badges.truncate(rules.display_limit);
    badges
}

/// Five-star display split into full, half and empty stars.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StarBreakdown {
    pub full: u8,
    pub half: u8,
    pub empty: u8,
}

impl StarBreakdown {
    pub fn from_rating(rating: Option<f64>) -> Self {
        let rating = rating.unwrap_or(0.0).clamp(0.0, 5.0);
        let full = rating.floor() as u8;
        let half = u8::from(rating - rating.floor() >= 0.5 && full < 5);
        Self { full, half, empty: 5 - full - half }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn product(stock: i32, age_days: i64) -> Product {
        let mut p = Product::new("Sneaker", Decimal::new(80, 0), "shoes");
        p.stock = stock;
        p.created_at = Utc::now() - Duration::days(age_days);
        p
    }

    fn kinds(badges: &[Badge]) -> Vec<BadgeKind> { badges.iter().map(|b| b.kind).collect() }

    #[test]
    fn out_of_stock_excludes_low_stock() {
        let rules = BadgeRules::default();
        for age in [0, 30] {
            let badges = derive_badges(&product(0, age), &rules, Utc::now());
            assert!(kinds(&badges).contains(&BadgeKind::OutOfStock));
            assert!(!kinds(&badges).contains(&BadgeKind::LowStock));
        }
        let low = derive_badges(&product(5, 30), &rules, Utc::now());
        assert_eq!(kinds(&low), [BadgeKind::LowStock]);
        assert_eq!(low[0].label, "Only 5 left");
    }

    #[test]
    fn new_badge_only_within_seven_days() {
        let rules = BadgeRules::default();
        assert!(kinds(&derive_badges(&product(20, 3), &rules, Utc::now())).contains(&BadgeKind::New));
        let mut old = product(20, 8);
        old.original_price = Some(Decimal::new(100, 0));
        old.average_rating = Some(5.0);
        old.total_reviews = Some(50);
        assert!(!kinds(&derive_badges(&old, &rules, Utc::now())).contains(&BadgeKind::New));
    }

    #[test]
    fn display_is_capped_at_two_in_priority_order() {
        let rules = BadgeRules::default();
        let mut p = product(3, 1);
        p.original_price = Some(Decimal::new(100, 0));
        p.average_rating = Some(4.8);
        p.total_reviews = Some(12);
        let all = derive_badges(&p, &rules, Utc::now());
        assert_eq!(kinds(&all), [BadgeKind::New, BadgeKind::LowStock, BadgeKind::Discount, BadgeKind::Hot]);
        assert_eq!(all[2].label, "-20%");
        assert_eq!(kinds(&display_badges(&p, &rules, Utc::now())), [BadgeKind::New, BadgeKind::LowStock]);
    }

    #[test]
    fn weights_override_list_order() {
        let mut rules = BadgeRules::default();
        rules.priority = vec![(BadgeKind::New, 1), (BadgeKind::Discount, 1), (BadgeKind::Hot, 9)];
        let mut p = product(20, 1);
        p.original_price = Some(Decimal::new(100, 0));
        p.average_rating = Some(4.5);
        p.total_reviews = Some(10);
        assert_eq!(kinds(&display_badges(&p, &rules, Utc::now())), [BadgeKind::Hot, BadgeKind::New]);
    }

    #[test]
    fn hot_needs_rating_and_review_count() {
        let rules = BadgeRules::default();
        let mut p = product(20, 30);
        p.average_rating = Some(4.9);
        p.total_reviews = Some(9);
        assert!(derive_badges(&p, &rules, Utc::now()).is_empty());
    }

    #[test]
    fn star_breakdown() {
        assert_eq!(StarBreakdown::from_rating(Some(3.5)), StarBreakdown { full: 3, half: 1, empty: 1 });
        assert_eq!(StarBreakdown::from_rating(Some(4.2)), StarBreakdown { full: 4, half: 0, empty: 1 });
        assert_eq!(StarBreakdown::from_rating(None), StarBreakdown { full: 0, half: 0, empty: 5 });
        assert_eq!(StarBreakdown::from_rating(Some(7.0)), StarBreakdown { full: 5, half: 0, empty: 0 });
    }
}
