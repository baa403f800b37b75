//! Hold database operations

use chrono::{DateTime, Utc};
use shared::models::Hold;
use sqlx::PgExecutor;

pub async fn insert(
    executor: impl PgExecutor<'_>,
    product_id: i64,
    qty: i32,
    expires_at: DateTime<Utc>,
) -> sqlx::Result<Hold> {
    sqlx::query_as(
        r#"
        INSERT INTO holds (product_id, qty, expires_at)
        VALUES ($1, $2, $3)
        RETURNING id, product_id, qty, expires_at, used, released, created_at
        "#,
    )
    .bind(product_id)
    .bind(qty)
    .bind(expires_at)
    .fetch_one(executor)
    .await
}

/// Load the hold row under an exclusive row lock
pub async fn lock_row(executor: impl PgExecutor<'_>, hold_id: i64) -> sqlx::Result<Option<Hold>> {
    sqlx::query_as(
        r#"
        SELECT id, product_id, qty, expires_at, used, released, created_at
        FROM holds
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(hold_id)
    .fetch_optional(executor)
    .await
}

pub async fn find_by_id(executor: impl PgExecutor<'_>, hold_id: i64) -> sqlx::Result<Option<Hold>> {
    sqlx::query_as(
        r#"
        SELECT id, product_id, qty, expires_at, used, released, created_at
        FROM holds
        WHERE id = $1
        "#,
    )
    .bind(hold_id)
    .fetch_optional(executor)
    .await
}

pub async fn mark_used(executor: impl PgExecutor<'_>, hold_id: i64) -> sqlx::Result<()> {
    sqlx::query("UPDATE holds SET used = TRUE WHERE id = $1")
        .bind(hold_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn mark_released(executor: impl PgExecutor<'_>, hold_id: i64) -> sqlx::Result<()> {
    sqlx::query("UPDATE holds SET released = TRUE WHERE id = $1")
        .bind(hold_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Holds whose TTL elapsed without being used or released.
///
/// Served by the `(expires_at, used, released)` index; the sweep is bounded
/// so one pathological backlog cannot starve a cycle.
pub async fn list_expired_active(
    executor: impl PgExecutor<'_>,
    now: DateTime<Utc>,
    limit: i64,
) -> sqlx::Result<Vec<Hold>> {
    sqlx::query_as(
        r#"
        SELECT id, product_id, qty, expires_at, used, released, created_at
        FROM holds
        WHERE expires_at <= $1 AND NOT used AND NOT released
        ORDER BY expires_at
        LIMIT $2
        "#,
    )
    .bind(now)
    .bind(limit)
    .fetch_all(executor)
    .await
}
