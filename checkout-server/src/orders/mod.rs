//! Order manager: convert holds into orders, settle to paid or cancelled
//!
//! `mark_paid` and `cancel` serialize per order on the order row lock. The
//! in-transaction variants are shared with webhook settlement so a payment
//! outcome and its log row commit atomically.

use shared::error::{AppError, ErrorCode};
use shared::models::{Hold, Order, OrderStatus};
use shared::money;
use sqlx::{PgConnection, PgPool};

use crate::db;
use crate::error::{ServiceError, ServiceResult};
use crate::holds::HoldManager;

#[derive(Clone)]
pub struct OrderManager {
    pool: PgPool,
    holds: HoldManager,
}

impl OrderManager {
    pub fn new(pool: PgPool, holds: HoldManager) -> Self {
        Self { pool, holds }
    }

    /// Convert an active hold into a pending-payment order.
    ///
    /// The hold keeps reserving stock while the payment is outstanding: the
    /// stock calculator counts `used && !released` holds whose order is
    /// still `pending_payment`.
    pub async fn create_order_from_hold(&self, hold_id: i64) -> ServiceResult<Order> {
        let mut tx = self.pool.begin().await?;

        let Some(hold) = db::holds::lock_row(&mut *tx, hold_id).await? else {
            return Err(ServiceError::App(AppError::hold_not_found(hold_id)));
        };
        check_hold_convertible(&hold)?;

        db::holds::mark_used(&mut *tx, hold.id).await?;

        let product = db::products::find_by_id(&mut *tx, hold.product_id)
            .await?
            .ok_or_else(|| ServiceError::App(AppError::product_not_found(hold.product_id)))?;

        let amount = money::line_amount(product.price, hold.qty);
        let order = db::orders::insert(&mut *tx, hold.id, amount).await?;

        tx.commit().await?;

        tracing::info!(
            order_id = order.id,
            hold_id = hold.id,
            amount = %amount,
            "Order created"
        );
        Ok(order)
    }

    /// Settle an order as paid, advancing `stock_sold`.
    pub async fn mark_paid(&self, order_id: i64) -> ServiceResult<Order> {
        let mut tx = self.pool.begin().await?;
        let Some(order) = db::orders::lock_row(&mut *tx, order_id).await? else {
            return Err(ServiceError::App(AppError::order_not_found(order_id)));
        };
        let order = Self::settle_paid_in_tx(&mut tx, order).await?;
        tx.commit().await?;
        Ok(order)
    }

    /// Cancel a pending order and release its hold.
    pub async fn cancel(&self, order_id: i64) -> ServiceResult<Order> {
        let mut tx = self.pool.begin().await?;
        let Some(order) = db::orders::lock_row(&mut *tx, order_id).await? else {
            return Err(ServiceError::App(AppError::order_not_found(order_id)));
        };
        let (order, hold_to_release) = Self::cancel_in_tx(&mut tx, order).await?;
        tx.commit().await?;

        if let Some(hold_id) = hold_to_release {
            self.release_after_cancel(hold_id).await?;
        }
        Ok(order)
    }

    /// Paid settlement against an already-locked order row.
    ///
    /// Idempotent on `paid`; rejects `cancelled`. The `stock_sold` increment
    /// is a single atomic UPDATE, no product row lock taken.
    pub(crate) async fn settle_paid_in_tx(
        tx: &mut PgConnection,
        order: Order,
    ) -> ServiceResult<Order> {
        match order.status {
            OrderStatus::Paid => return Ok(order),
            OrderStatus::Cancelled => {
                return Err(ServiceError::App(
                    AppError::new(ErrorCode::InvalidTransition)
                        .with_detail("order_id", order.id)
                        .with_detail("status", order.status.as_str()),
                ));
            }
            OrderStatus::PendingPayment => {}
        }

        let hold = db::holds::find_by_id(&mut *tx, order.hold_id)
            .await?
            .ok_or_else(|| ServiceError::App(AppError::hold_not_found(order.hold_id)))?;

        db::orders::set_status(&mut *tx, order.id, OrderStatus::Paid).await?;
        db::products::add_stock_sold(&mut *tx, hold.product_id, hold.qty).await?;

        tracing::info!(
            order_id = order.id,
            product_id = hold.product_id,
            qty = hold.qty,
            "Order paid, stock_sold advanced"
        );
        Ok(Order {
            status: OrderStatus::Paid,
            ..order
        })
    }

    /// Cancellation against an already-locked order row.
    ///
    /// Idempotent on `cancelled`; rejects `paid`. Returns the hold id that
    /// must be released once this transaction commits.
    pub(crate) async fn cancel_in_tx(
        tx: &mut PgConnection,
        order: Order,
    ) -> ServiceResult<(Order, Option<i64>)> {
        match order.status {
            OrderStatus::Cancelled => return Ok((order, None)),
            OrderStatus::Paid => {
                return Err(ServiceError::App(
                    AppError::new(ErrorCode::CannotCancelPaid).with_detail("order_id", order.id),
                ));
            }
            OrderStatus::PendingPayment => {}
        }

        db::orders::set_status(&mut *tx, order.id, OrderStatus::Cancelled).await?;

        tracing::info!(order_id = order.id, hold_id = order.hold_id, "Order cancelled");
        let hold_id = order.hold_id;
        Ok((
            Order {
                status: OrderStatus::Cancelled,
                ..order
            },
            Some(hold_id),
        ))
    }

    /// Release the hold of a cancelled order under the hold manager's own
    /// locks. `release_hold` accepts a used hold once its order is cancelled.
    pub(crate) async fn release_after_cancel(&self, hold_id: i64) -> ServiceResult<()> {
        let released = self.holds.release_hold(hold_id).await?;
        if !released {
            // Another caller (or a previous attempt) already released it
            tracing::debug!(hold_id, "Hold already released after cancel");
        }
        Ok(())
    }
}

/// Guard for order creation: the hold must be active, with a specific
/// rejection reason for each way it can have left that state.
fn check_hold_convertible(hold: &Hold) -> Result<(), ServiceError> {
    if hold.used {
        return Err(ServiceError::App(
            AppError::new(ErrorCode::HoldAlreadyUsed).with_detail("hold_id", hold.id),
        ));
    }
    if hold.released {
        return Err(ServiceError::App(
            AppError::new(ErrorCode::HoldReleased).with_detail("hold_id", hold.id),
        ));
    }
    if hold.expires_at <= chrono::Utc::now() {
        return Err(ServiceError::App(
            AppError::new(ErrorCode::HoldExpired).with_detail("hold_id", hold.id),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn hold(used: bool, released: bool, expires_in_secs: i64) -> Hold {
        let now = Utc::now();
        Hold {
            id: 1,
            product_id: 1,
            qty: 5,
            expires_at: now + Duration::seconds(expires_in_secs),
            used,
            released,
            created_at: now,
        }
    }

    fn code_of(err: ServiceError) -> ErrorCode {
        match err {
            ServiceError::App(app) => app.code,
            other => panic!("expected app error, got {other}"),
        }
    }

    #[test]
    fn test_active_hold_is_convertible() {
        assert!(check_hold_convertible(&hold(false, false, 60)).is_ok());
    }

    #[test]
    fn test_used_hold_rejected_with_specific_reason() {
        let err = check_hold_convertible(&hold(true, false, 60)).unwrap_err();
        assert_eq!(code_of(err), ErrorCode::HoldAlreadyUsed);
    }

    #[test]
    fn test_released_hold_rejected_with_specific_reason() {
        let err = check_hold_convertible(&hold(false, true, 60)).unwrap_err();
        assert_eq!(code_of(err), ErrorCode::HoldReleased);
    }

    #[test]
    fn test_expired_hold_rejected_with_specific_reason() {
        let err = check_hold_convertible(&hold(false, false, -60)).unwrap_err();
        assert_eq!(code_of(err), ErrorCode::HoldExpired);
    }

    #[test]
    fn test_used_wins_over_expired() {
        // A used hold that has also passed its TTL reports HoldAlreadyUsed
        let err = check_hold_convertible(&hold(true, false, -60)).unwrap_err();
        assert_eq!(code_of(err), ErrorCode::HoldAlreadyUsed);
    }
}
