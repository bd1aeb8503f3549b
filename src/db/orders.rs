//! `orders` table.

use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::db::{coupons, products};
use crate::domain::aggregates::{CouponError, Order, OrderLine};
use crate::Result;

/// Newest first; `user_id` narrows to one shopper's history.
pub async fn list(pool: &PgPool, user_id: Option<&str>) -> Result<Vec<Order>> {
    let orders = match user_id {
        Some(user_id) => {
            sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC")
                .bind(user_id)
                .fetch_all(pool)
                .await?
        }
        None => {
            sqlx::query_as::<_, Order>("SELECT * FROM orders ORDER BY created_at DESC")
                .fetch_all(pool)
                .await?
        }
    };
    Ok(orders)
}

pub async fn find(pool: &PgPool, id: Uuid) -> Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(order)
}

/// Stock left on a product after an order was placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLevel {
    pub product_id: Uuid,
    pub remaining: i32,
}

/// Sums line quantities per product, in first-seen order. Size and colour variants of
/// one product share a stock count.
fn quantities_by_product(lines: &[OrderLine]) -> Vec<(Uuid, i32)> {
    let mut totals: Vec<(Uuid, i32)> = Vec::new();
    for line in lines {
        match totals.iter_mut().find(|(id, _)| *id == line.product_id) {
            Some((_, quantity)) => *quantity += line.quantity,
            None => totals.push((line.product_id, line.quantity)),
        }
    }
    totals
}

/// Stores a priced order, takes its stock and counts the coupon redemption in one
/// transaction. Nothing is written if any line runs out of stock.
pub async fn place(pool: &PgPool, order: &Order) -> Result<(Order, Vec<StockLevel>)> {
    let mut tx = pool.begin().await?;

    let quantities = quantities_by_product(&order.products);
    let mut levels = Vec::with_capacity(quantities.len());
    for (product_id, quantity) in quantities {
        let remaining = products::take_stock(&mut tx, product_id, quantity).await?;
        levels.push(StockLevel { product_id, remaining });
    }

    if let Some(code) = order.coupon_code.as_deref() {
        if !coupons::redeem(&mut tx, code).await? {
            return Err(CouponError::UsageLimitReached.into());
        }
    }

    let stored = sqlx::query_as::<_, Order>(
        "INSERT INTO orders (id, order_number, products, subtotal, discount, total, coupon_code, \
         status, shipping_info, user_id, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING *",
    )
    .bind(order.id)
    .bind(&order.order_number)
    .bind(Json(&order.products))
    .bind(order.subtotal)
    .bind(order.discount)
    .bind(order.total)
    .bind(&order.coupon_code)
    .bind(order.status.as_str())
    .bind(Json(&order.shipping_info))
    .bind(&order.user_id)
    .bind(order.created_at)
    .bind(order.updated_at)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok((stored, levels))
}

/// Persists a status already validated by `Order::transition_to`. The `from` guard
/// rejects the write if another request moved the order first.
pub async fn update_status(pool: &PgPool, order: &Order, from: &str) -> Result<Option<Order>> {
    let updated = sqlx::query_as::<_, Order>(
        "UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1 AND status = $4 RETURNING *",
    )
    .bind(order.id)
    .bind(order.status.as_str())
    .bind(order.updated_at)
    .bind(from)
    .fetch_optional(pool)
    .await?;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn line(product_id: Uuid, quantity: i32, size: &str) -> OrderLine {
        OrderLine {
            product_id,
            title: "Slim Jeans".into(),
            quantity,
            price: Decimal::new(25, 0),
            size: Some(size.into()),
            color: None,
            image: None,
        }
    }

    #[test]
    fn variants_of_one_product_take_stock_once() {
        let jeans = Uuid::now_v7();
        let shirt = Uuid::now_v7();
        let lines = [line(jeans, 1, "M"), line(shirt, 3, "L"), line(jeans, 2, "L")];
        assert_eq!(quantities_by_product(&lines), vec![(jeans, 3), (shirt, 3)]);
        assert!(quantities_by_product(&[]).is_empty());
    }
}
