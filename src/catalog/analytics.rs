//! Admin dashboard figures computed from order and product collections.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use crate::catalog::badges::BadgeRules;
use crate::domain::aggregates::{Order, OrderStatus, Product};

pub const TOP_SELLER_LIMIT: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    InStock,
}

impl StockStatus {
    pub fn of(product: &Product, rules: &BadgeRules) -> Self {
        if product.stock <= 0 {
            Self::OutOfStock
        } else if rules.is_low_stock(product) {
            Self::LowStock
        } else {
            Self::InStock
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSummary {
    pub in_stock: usize,
    pub low_stock: usize,
    pub out_of_stock: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopSeller {
    pub product_id: Uuid,
    pub title: String,
    pub quantity: i64,
    pub revenue: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub revenue: Decimal,
    pub orders: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_revenue: Decimal,
    pub total_orders: usize,
    pub average_order_value: Decimal,
    pub orders_by_status: BTreeMap<&'static str, usize>,
    pub total_products: usize,
    pub stock: StockSummary,
    pub top_sellers: Vec<TopSeller>,
    pub revenue_by_day: Vec<DailyRevenue>,
}

impl DashboardMetrics {
    /// Cancelled orders count towards `total_orders` and the status breakdown but not revenue.
    pub fn compute(orders: &[Order], products: &[Product], rules: &BadgeRules) -> Self {
        let revenue_orders: Vec<&Order> = orders.iter().filter(|o| o.counts_as_revenue()).collect();
        let total_revenue: Decimal = revenue_orders.iter().map(|o| o.total).sum();
        let average_order_value = if revenue_orders.is_empty() {
            Decimal::ZERO
        } else {
            (total_revenue / Decimal::from(revenue_orders.len()))
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        };

        let mut orders_by_status: BTreeMap<&'static str, usize> =
            OrderStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
        for order in orders {
            *orders_by_status.entry(order.status.as_str()).or_default() += 1;
        }

        let mut stock = StockSummary::default();
        for product in products {
            match StockStatus::of(product, rules) {
                StockStatus::InStock => stock.in_stock += 1,
                StockStatus::LowStock => stock.low_stock += 1,
                StockStatus::OutOfStock => stock.out_of_stock += 1,
            }
        }

        Self {
            total_revenue,
            total_orders: orders.len(),
            average_order_value,
            orders_by_status,
            total_products: products.len(),
            stock,
            top_sellers: top_sellers(&revenue_orders, TOP_SELLER_LIMIT),
            revenue_by_day: revenue_by_day(&revenue_orders),
        }
    }
}

fn top_sellers(orders: &[&Order], limit: usize) -> Vec<TopSeller> {
    let mut by_product: HashMap<Uuid, TopSeller> = HashMap::new();
    for line in orders.iter().flat_map(|o| o.products.iter()) {
        let entry = by_product.entry(line.product_id).or_insert_with(|| TopSeller {
            product_id: line.product_id,
            title: line.title.clone(),
            quantity: 0,
            revenue: Decimal::ZERO,
        });
        entry.quantity += i64::from(line.quantity);
        entry.revenue += line.line_total();
    }
    let mut sellers: Vec<TopSeller> = by_product.into_values().collect();
    sellers.sort_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| b.revenue.cmp(&a.revenue)).then_with(|| a.title.cmp(&b.title)));
    sellers.truncate(limit);
    sellers
}

fn revenue_by_day(orders: &[&Order]) -> Vec<DailyRevenue> {
    let mut days: BTreeMap<NaiveDate, (Decimal, usize)> = BTreeMap::new();
    for order in orders {
        let day = days.entry(order.created_at.date_naive()).or_default();
        day.0 += order.total;
        day.1 += 1;
    }
    days.into_iter().map(|(date, (revenue, orders))| DailyRevenue { date, revenue, orders }).collect()
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub product_id: Uuid,
    pub title: String,
    pub category: String,
    pub stock: i32,
    pub status: StockStatus,
    pub is_active: bool,
}

/// Every product with its stock status: out of stock first, then low, then the rest,
/// each group ordered by stock ascending.
pub fn inventory(products: &[Product], rules: &BadgeRules) -> Vec<InventoryItem> {
    let mut items: Vec<InventoryItem> = products
        .iter()
        .map(|p| InventoryItem {
            product_id: p.id,
            title: p.title.clone(),
            category: p.category.clone(),
            stock: p.stock,
            status: StockStatus::of(p, rules),
            is_active: p.is_active,
        })
        .collect();
    items.sort_by(|a, b| a.status.cmp(&b.status).then_with(|| a.stock.cmp(&b.stock)));
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{OrderLine, ShippingInfo};
    use chrono::{Duration, TimeZone, Utc};

    fn order(total: i64, status: OrderStatus, lines: Vec<(Uuid, &str, i32, i64)>, day: u32) -> Order {
        let created = Utc.with_ymd_and_hms(2024, 5, day, 10, 0, 0).unwrap();
        Order {
            id: Uuid::now_v7(),
            order_number: "ORD-00000001".into(),
            products: lines
                .into_iter()
                .map(|(product_id, title, quantity, price)| OrderLine {
                    product_id, title: title.into(), quantity, price: Decimal::new(price, 0),
                    size: None, color: None, image: None,
                })
                .collect(),
            subtotal: Decimal::new(total, 0),
            discount: Decimal::ZERO,
            total: Decimal::new(total, 0),
            coupon_code: None,
            status,
            shipping_info: ShippingInfo::default(),
            user_id: None,
            created_at: created,
            updated_at: created,
        }
    }

    fn product(title: &str, stock: i32) -> Product {
        let mut p = Product::new(title, Decimal::ONE, "misc");
        p.stock = stock;
        p.created_at = Utc::now() - Duration::days(30);
        p
    }

    #[test]
    fn revenue_excludes_cancelled_orders() {
        let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
        let orders = vec![
            order(30, OrderStatus::Delivered, vec![(a, "Tee", 3, 10)], 1),
            order(50, OrderStatus::Pending, vec![(b, "Cap", 1, 50)], 1),
            order(90, OrderStatus::Cancelled, vec![(b, "Cap", 9, 10)], 2),
        ];
        let metrics = DashboardMetrics::compute(&orders, &[], &BadgeRules::default());
        assert_eq!(metrics.total_revenue, Decimal::new(80, 0));
        assert_eq!(metrics.total_orders, 3);
        assert_eq!(metrics.average_order_value, Decimal::new(40, 0));
        assert_eq!(metrics.orders_by_status["cancelled"], 1);
        assert_eq!(metrics.orders_by_status["shipped"], 0);
        assert_eq!(metrics.top_sellers[0].title, "Tee");
        assert_eq!(metrics.top_sellers[0].quantity, 3);
        assert_eq!(metrics.revenue_by_day.len(), 1);
        assert_eq!(metrics.revenue_by_day[0].orders, 2);
    }

    #[test]
    fn top_sellers_are_capped() {
        let orders: Vec<Order> = (0..7)
            .map(|i| order(10, OrderStatus::Pending, vec![(Uuid::now_v7(), "Item", i + 1, 1)], 3))
            .collect();
        let metrics = DashboardMetrics::compute(&orders, &[], &BadgeRules::default());
        assert_eq!(metrics.top_sellers.len(), TOP_SELLER_LIMIT);
        assert_eq!(metrics.top_sellers[0].quantity, 7);
    }

    #[test]
    fn empty_dashboard_has_zero_average() {
        let metrics = DashboardMetrics::compute(&[], &[], &BadgeRules::default());
        assert_eq!(metrics.average_order_value, Decimal::ZERO);
        assert_eq!(metrics.orders_by_status.len(), OrderStatus::ALL.len());
    }

    #[test]
    fn stock_summary_and_inventory_order() {
        let products = vec![product("plenty", 40), product("gone", 0), product("few", 2), product("some", 4)];
        let rules = BadgeRules::default();
        let metrics = DashboardMetrics::compute(&[], &products, &rules);
        assert_eq!(metrics.stock, StockSummary { in_stock: 1, low_stock: 2, out_of_stock: 1 });
        let titles: Vec<String> = inventory(&products, &rules).into_iter().map(|i| i.title).collect();
        assert_eq!(titles, ["gone", "few", "some", "plenty"]);
    }
}
