//! Order database operations

use rust_decimal::Decimal;
use shared::models::{Order, OrderStatus};
use sqlx::PgExecutor;

pub async fn insert(
    executor: impl PgExecutor<'_>,
    hold_id: i64,
    amount: Decimal,
) -> sqlx::Result<Order> {
    sqlx::query_as(
        r#"
        INSERT INTO orders (hold_id, amount)
        VALUES ($1, $2)
        RETURNING id, hold_id, status, amount, created_at, updated_at
        "#,
    )
    .bind(hold_id)
    .bind(amount)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id(
    executor: impl PgExecutor<'_>,
    order_id: i64,
) -> sqlx::Result<Option<Order>> {
    sqlx::query_as(
        r#"
        SELECT id, hold_id, status, amount, created_at, updated_at
        FROM orders
        WHERE id = $1
        "#,
    )
    .bind(order_id)
    .fetch_optional(executor)
    .await
}

/// Load the order row under an exclusive row lock
pub async fn lock_row(executor: impl PgExecutor<'_>, order_id: i64) -> sqlx::Result<Option<Order>> {
    sqlx::query_as(
        r#"
        SELECT id, hold_id, status, amount, created_at, updated_at
        FROM orders
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(order_id)
    .fetch_optional(executor)
    .await
}

pub async fn find_by_hold_id(
    executor: impl PgExecutor<'_>,
    hold_id: i64,
) -> sqlx::Result<Option<Order>> {
    sqlx::query_as(
        r#"
        SELECT id, hold_id, status, amount, created_at, updated_at
        FROM orders
        WHERE hold_id = $1
        "#,
    )
    .bind(hold_id)
    .fetch_optional(executor)
    .await
}

pub async fn set_status(
    executor: impl PgExecutor<'_>,
    order_id: i64,
    status: OrderStatus,
) -> sqlx::Result<()> {
    sqlx::query("UPDATE orders SET status = $2, updated_at = now() WHERE id = $1")
        .bind(order_id)
        .bind(status)
        .execute(executor)
        .await?;
    Ok(())
}
