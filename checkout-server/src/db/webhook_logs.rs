//! Webhook log database operations

use shared::models::{WebhookLog, WebhookStatus};
use sqlx::PgExecutor;

pub async fn find_by_key(
    executor: impl PgExecutor<'_>,
    idempotency_key: &str,
) -> sqlx::Result<Option<WebhookLog>> {
    sqlx::query_as(
        r#"
        SELECT id, idempotency_key, payload, status, processed_at
        FROM webhook_logs
        WHERE idempotency_key = $1
        "#,
    )
    .bind(idempotency_key)
    .fetch_optional(executor)
    .await
}

/// Insert a delivery record. A unique-constraint violation on
/// `idempotency_key` means another caller won the race with the same key.
pub async fn insert(
    executor: impl PgExecutor<'_>,
    idempotency_key: &str,
    payload: &serde_json::Value,
    status: WebhookStatus,
) -> sqlx::Result<WebhookLog> {
    sqlx::query_as(
        r#"
        INSERT INTO webhook_logs (idempotency_key, payload, status)
        VALUES ($1, $2, $3)
        RETURNING id, idempotency_key, payload, status, processed_at
        "#,
    )
    .bind(idempotency_key)
    .bind(payload)
    .bind(status)
    .fetch_one(executor)
    .await
}

pub async fn list_pending(executor: impl PgExecutor<'_>) -> sqlx::Result<Vec<WebhookLog>> {
    sqlx::query_as(
        r#"
        SELECT id, idempotency_key, payload, status, processed_at
        FROM webhook_logs
        WHERE status = 'pending_order'
        ORDER BY processed_at
        "#,
    )
    .fetch_all(executor)
    .await
}

/// Flip a reconciled `pending_order` row to `processed`.
///
/// This updates the existing row in place rather than appending; the unique
/// idempotency key keeps duplicate submissions collapsed onto it.
pub async fn mark_processed(executor: impl PgExecutor<'_>, log_id: i64) -> sqlx::Result<()> {
    sqlx::query(
        "UPDATE webhook_logs SET status = 'processed', processed_at = now() WHERE id = $1",
    )
    .bind(log_id)
    .execute(executor)
    .await?;
    Ok(())
}
