//! Authoritative available-stock calculation
//!
//! One statement, one snapshot:
//!
//! `available = stock_total - stock_sold - active hold qty - pending-settlement qty`
//!
//! Active holds are unused, unreleased and unexpired. Pending-settlement
//! holds are used but unreleased with their order still `pending_payment`;
//! counting those closes the oversell window between order creation and
//! webhook arrival. The two sets are disjoint (`used` differs), so nothing
//! is subtracted twice.

use sqlx::PgExecutor;

/// Compute available stock for a product directly from the store.
///
/// Returns `None` when the product does not exist. The result is floored at
/// zero. Run inside the hold-creation transaction (after the product row
/// lock) to make it the correctness gate; against the pool it is a
/// consistent read-only snapshot.
pub async fn available_stock(
    executor: impl PgExecutor<'_>,
    product_id: i64,
) -> sqlx::Result<Option<i64>> {
    let raw: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT
            p.stock_total::BIGINT
            - p.stock_sold::BIGINT
            - COALESCE((
                SELECT SUM(h.qty)
                FROM holds h
                WHERE h.product_id = p.id
                  AND NOT h.used
                  AND NOT h.released
                  AND h.expires_at > now()
              ), 0)
            - COALESCE((
                SELECT SUM(h.qty)
                FROM holds h
                JOIN orders o ON o.hold_id = h.id
                WHERE h.product_id = p.id
                  AND h.used
                  AND NOT h.released
                  AND o.status = 'pending_payment'
              ), 0)
        FROM products p
        WHERE p.id = $1
        "#,
    )
    .bind(product_id)
    .fetch_optional(executor)
    .await?;

    Ok(raw.map(|available| available.max(0)))
}
