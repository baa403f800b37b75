//! Payment webhook settlement
//!
//! Idempotent and out-of-order-safe: the unique `idempotency_key` collapses
//! duplicate deliveries, and a webhook that beats its order into existence
//! parks as `pending_order` until order creation triggers reconciliation.

use shared::error::{AppError, ErrorCode};
use shared::models::{WebhookLog, WebhookOutcome, WebhookPayload, WebhookStatus};
use sqlx::PgPool;

use crate::db;
use crate::error::{is_unique_violation, ServiceError, ServiceResult};
use crate::orders::OrderManager;

#[derive(Clone)]
pub struct WebhookSettlement {
    pool: PgPool,
    orders: OrderManager,
}

impl WebhookSettlement {
    pub fn new(pool: PgPool, orders: OrderManager) -> Self {
        Self { pool, orders }
    }

    /// Process one payment outcome delivery.
    ///
    /// The log insert and the order settlement commit in the same
    /// transaction, so a crash between them cannot leave a recorded-but-
    /// unapplied (or applied-but-unrecorded) delivery behind.
    pub async fn handle(&self, payload: WebhookPayload) -> ServiceResult<WebhookOutcome> {
        if !payload.is_success() && !payload.is_failed() {
            return Err(ServiceError::App(
                AppError::new(ErrorCode::InvalidPaymentStatus)
                    .with_detail("payment_status", payload.payment_status.clone()),
            ));
        }

        let raw = serde_json::to_value(&payload)
            .map_err(|e| ServiceError::App(AppError::internal(e.to_string())))?;

        let mut tx = self.pool.begin().await?;

        if db::webhook_logs::find_by_key(&mut *tx, &payload.idempotency_key)
            .await?
            .is_some()
        {
            tracing::info!(
                idempotency_key = %payload.idempotency_key,
                "Duplicate webhook delivery, skipping"
            );
            return Ok(WebhookOutcome::already_processed());
        }

        let order = db::orders::lock_row(&mut *tx, payload.order_id).await?;

        let Some(order) = order else {
            // Out-of-order delivery: park the payload for reconciliation
            match db::webhook_logs::insert(
                &mut *tx,
                &payload.idempotency_key,
                &raw,
                WebhookStatus::PendingOrder,
            )
            .await
            {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => {
                    return Ok(WebhookOutcome::already_processed());
                }
                Err(e) => return Err(e.into()),
            }
            tx.commit().await?;

            tracing::info!(
                order_id = payload.order_id,
                idempotency_key = %payload.idempotency_key,
                "Webhook arrived before its order, stored as pending_order"
            );
            return Ok(WebhookOutcome::pending_order(payload.order_id));
        };

        match db::webhook_logs::insert(
            &mut *tx,
            &payload.idempotency_key,
            &raw,
            WebhookStatus::Processed,
        )
        .await
        {
            Ok(_) => {}
            // Another caller won the race with the same key
            Err(e) if is_unique_violation(&e) => {
                return Ok(WebhookOutcome::already_processed());
            }
            Err(e) => return Err(e.into()),
        }

        if payload.is_success() {
            let order = OrderManager::settle_paid_in_tx(&mut tx, order).await?;
            tx.commit().await?;
            Ok(WebhookOutcome::settled("success", order.id))
        } else {
            let (order, hold_to_release) = OrderManager::cancel_in_tx(&mut tx, order).await?;
            tx.commit().await?;
            if let Some(hold_id) = hold_to_release {
                self.orders.release_after_cancel(hold_id).await?;
            }
            Ok(WebhookOutcome::settled("failed", order.id))
        }
    }

    /// Settle parked webhooks for a freshly created order.
    ///
    /// Called inline after order creation; errors are logged and leave the
    /// row `pending_order` for a future attempt rather than failing the
    /// sweep. Returns how many logs were settled.
    pub async fn reconcile_pending(&self, order_id: i64) -> usize {
        let logs = match db::webhook_logs::list_pending(&self.pool).await {
            Ok(logs) => logs,
            Err(e) => {
                tracing::error!(error = %e, "Failed to enumerate pending webhook logs");
                return 0;
            }
        };

        let mut settled = 0;
        for log in logs {
            let payload: WebhookPayload = match serde_json::from_value(log.payload.clone()) {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(log_id = log.id, error = %e, "Unparseable pending webhook payload");
                    continue;
                }
            };
            if payload.order_id != order_id {
                continue;
            }
            if !payload.is_success() && !payload.is_failed() {
                tracing::warn!(
                    log_id = log.id,
                    payment_status = %payload.payment_status,
                    "Pending webhook with invalid payment_status, leaving for inspection"
                );
                continue;
            }

            match self.reconcile_one(&log, &payload).await {
                Ok(true) => settled += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(
                        log_id = log.id,
                        order_id,
                        error = %e,
                        "Webhook reconciliation failed, row stays pending_order"
                    );
                }
            }
        }
        settled
    }

    async fn reconcile_one(&self, log: &WebhookLog, payload: &WebhookPayload) -> ServiceResult<bool> {
        let mut tx = self.pool.begin().await?;

        // Re-verify under the order row lock; the order may still not exist
        let Some(order) = db::orders::lock_row(&mut *tx, payload.order_id).await? else {
            return Ok(false);
        };

        let hold_to_release = if payload.is_success() {
            OrderManager::settle_paid_in_tx(&mut tx, order).await?;
            None
        } else {
            let (_, hold_to_release) = OrderManager::cancel_in_tx(&mut tx, order).await?;
            hold_to_release
        };

        db::webhook_logs::mark_processed(&mut *tx, log.id).await?;
        tx.commit().await?;

        if let Some(hold_id) = hold_to_release {
            self.orders.release_after_cancel(hold_id).await?;
        }

        tracing::info!(
            log_id = log.id,
            order_id = payload.order_id,
            payment_status = %payload.payment_status,
            "Reconciled pending webhook"
        );
        Ok(true)
    }
}
