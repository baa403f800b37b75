//! Product database operations

use shared::models::Product;
use sqlx::PgExecutor;

pub async fn find_by_id(
    executor: impl PgExecutor<'_>,
    product_id: i64,
) -> sqlx::Result<Option<Product>> {
    sqlx::query_as(
        r#"
        SELECT id, name, price, stock_total, stock_sold, created_at, updated_at
        FROM products
        WHERE id = $1
        "#,
    )
    .bind(product_id)
    .fetch_optional(executor)
    .await
}

/// Load the product row under an exclusive row lock.
///
/// The row lock is the correctness boundary for hold creation; the advisory
/// product lock only reduces contention on it.
pub async fn lock_row(
    executor: impl PgExecutor<'_>,
    product_id: i64,
) -> sqlx::Result<Option<Product>> {
    sqlx::query_as(
        r#"
        SELECT id, name, price, stock_total, stock_sold, created_at, updated_at
        FROM products
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(product_id)
    .fetch_optional(executor)
    .await
}

/// Advance `stock_sold` when an order settles as paid.
///
/// Single-statement increment: atomic at row level, no `FOR UPDATE` on the
/// product, so webhook settlement does not serialize per product.
pub async fn add_stock_sold(
    executor: impl PgExecutor<'_>,
    product_id: i64,
    qty: i32,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        UPDATE products
        SET stock_sold = stock_sold + $2, updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(product_id)
    .bind(qty)
    .execute(executor)
    .await?;
    Ok(())
}
