//! Hold manager: create and release time-bounded stock reservations
//!
//! Two-level locking per product: the advisory Redis lock keeps the herd off
//! the row lock, the row lock is the correctness boundary. The authoritative
//! stock check always runs inside the row-locked transaction, so a stale or
//! corrupted cache can never oversell.

use std::time::Duration;

use chrono::Utc;
use shared::error::{AppError, ErrorCode};
use shared::models::{Hold, OrderStatus};
use sqlx::PgPool;

use crate::db;
use crate::error::{ServiceError, ServiceResult};
use crate::stock::{calculator, LockManager, StockCache};

/// Hold TTL: how long a reservation survives without settling
pub const HOLD_TTL: Duration = Duration::from_secs(120);

/// Product advisory lock: wait up to 3 s, auto-expire after 10 s
const PRODUCT_LOCK_WAIT: Duration = Duration::from_secs(3);
const PRODUCT_LOCK_HOLD: Duration = Duration::from_secs(10);

/// Hold advisory lock: wait up to 3 s, auto-expire after 10 s
const HOLD_LOCK_WAIT: Duration = Duration::from_secs(3);
const HOLD_LOCK_HOLD: Duration = Duration::from_secs(10);

/// Cache-restore product lock: shorter budget, the restore is best-effort
const RESTORE_LOCK_WAIT: Duration = Duration::from_secs(2);
const RESTORE_LOCK_HOLD: Duration = Duration::from_secs(5);

/// Attempts before a deadlock surfaces as `HighContention`
const DEADLOCK_ATTEMPTS: u32 = 3;

/// Exponential backoff in units of 100 ms: 200 / 400 / 800 ms
fn deadlock_backoff(attempt: u32) -> Duration {
    Duration::from_millis(100 * (1 << attempt))
}

#[derive(Clone)]
pub struct HoldManager {
    pool: PgPool,
    cache: StockCache,
    locks: LockManager,
}

impl HoldManager {
    pub fn new(pool: PgPool, cache: StockCache, locks: LockManager) -> Self {
        Self { pool, cache, locks }
    }

    /// Reserve `qty` units of a product for [`HOLD_TTL`].
    ///
    /// Retries transparently on store-reported deadlocks; all other errors
    /// surface on the first attempt.
    pub async fn create_hold(&self, product_id: i64, qty: i32) -> ServiceResult<Hold> {
        if qty <= 0 {
            return Err(ServiceError::App(
                AppError::new(ErrorCode::InvalidQuantity).with_detail("qty", qty),
            ));
        }

        let mut attempt = 1;
        loop {
            match self.try_create(product_id, qty).await {
                Err(e) if e.is_deadlock() => {
                    if attempt >= DEADLOCK_ATTEMPTS {
                        tracing::warn!(product_id, "Deadlock retries exhausted creating hold");
                        return Err(ServiceError::App(AppError::high_contention(
                            "deadlock retries exhausted",
                        )));
                    }
                    let backoff = deadlock_backoff(attempt);
                    tracing::warn!(
                        product_id,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        "Deadlock creating hold, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn try_create(&self, product_id: i64, qty: i32) -> ServiceResult<Hold> {
        let key = LockManager::product_key(product_id);
        let Some(guard) = self
            .locks
            .acquire(&key, PRODUCT_LOCK_WAIT, PRODUCT_LOCK_HOLD)
            .await?
        else {
            return Err(ServiceError::App(AppError::high_contention(
                "timed out waiting for product lock",
            )));
        };

        let result = self.create_locked(product_id, qty).await;
        self.locks.release(guard).await;
        result
    }

    async fn create_locked(&self, product_id: i64, qty: i32) -> ServiceResult<Hold> {
        let mut tx = self.pool.begin().await?;

        if db::products::lock_row(&mut *tx, product_id).await?.is_none() {
            return Err(ServiceError::App(AppError::product_not_found(product_id)));
        }

        // Row is locked, product exists: the snapshot is authoritative
        let available = calculator::available_stock(&mut *tx, product_id)
            .await?
            .unwrap_or(0);

        // Repair a divergent counter before deciding, still inside the lock,
        // so a corrupted cache is corrected even when the request fails
        let cached = self.cache.cached_value(product_id).await?;
        if cached != Some(available) {
            if let Some(stale) = cached {
                tracing::warn!(product_id, stale, available, "Stock cache diverged, overwriting");
            }
            self.cache.put(product_id, available).await?;
        }

        if i64::from(qty) > available {
            return Err(ServiceError::App(AppError::insufficient_stock(
                qty, available,
            )));
        }

        let expires_at = Utc::now() + HOLD_TTL;
        let hold = db::holds::insert(&mut *tx, product_id, qty, expires_at).await?;

        self.cache.decrement(product_id, qty).await?;
        tx.commit().await?;

        tracing::info!(
            hold_id = hold.id,
            product_id,
            qty,
            expires_at = %hold.expires_at,
            "Hold created"
        );
        Ok(hold)
    }

    /// Release a hold, returning stock to the pool.
    ///
    /// Returns `false` when there is nothing to do: unknown id, already
    /// released, or used by an order that is not cancelled. A used hold
    /// whose order was cancelled is releasable.
    pub async fn release_hold(&self, hold_id: i64) -> ServiceResult<bool> {
        let mut attempt = 1;
        loop {
            match self.try_release(hold_id).await {
                Err(e) if e.is_deadlock() => {
                    if attempt >= DEADLOCK_ATTEMPTS {
                        tracing::warn!(hold_id, "Deadlock retries exhausted releasing hold");
                        return Err(ServiceError::App(AppError::high_contention(
                            "deadlock retries exhausted",
                        )));
                    }
                    let backoff = deadlock_backoff(attempt);
                    tracing::warn!(hold_id, attempt, "Deadlock releasing hold, backing off");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn try_release(&self, hold_id: i64) -> ServiceResult<bool> {
        let key = LockManager::hold_key(hold_id);
        let Some(guard) = self
            .locks
            .acquire(&key, HOLD_LOCK_WAIT, HOLD_LOCK_HOLD)
            .await?
        else {
            return Err(ServiceError::App(AppError::high_contention(
                "timed out waiting for hold lock",
            )));
        };

        let result = self.release_locked(hold_id).await;
        self.locks.release(guard).await;
        result
    }

    async fn release_locked(&self, hold_id: i64) -> ServiceResult<bool> {
        let mut tx = self.pool.begin().await?;

        let Some(hold) = db::holds::lock_row(&mut *tx, hold_id).await? else {
            return Ok(false);
        };
        if hold.released {
            return Ok(false);
        }
        if hold.used {
            let order = db::orders::find_by_hold_id(&mut *tx, hold.id).await?;
            let order_cancelled = order.is_some_and(|o| o.status == OrderStatus::Cancelled);
            if !order_cancelled {
                return Ok(false);
            }
        }

        db::holds::mark_released(&mut *tx, hold.id).await?;
        tx.commit().await?;

        tracing::info!(hold_id, product_id = hold.product_id, qty = hold.qty, "Hold released");

        // Authoritative availability is already correct; the counter restore
        // is best-effort and must not fail the release
        self.restore_cache(hold.product_id, hold.qty).await;
        Ok(true)
    }

    /// Give released quantity back to the advisory counter. Falls back to a
    /// full refresh when the counter is missing or the product lock cannot
    /// be acquired in time (still correct, just slower).
    async fn restore_cache(&self, product_id: i64, qty: i32) {
        let key = LockManager::product_key(product_id);
        let result = async {
            match self
                .locks
                .acquire(&key, RESTORE_LOCK_WAIT, RESTORE_LOCK_HOLD)
                .await?
            {
                Some(guard) => {
                    let outcome = match self.cache.increment(product_id, qty).await {
                        Ok(Some(_)) => Ok(()),
                        Ok(None) => self.cache.refresh(product_id).await.map(|_| ()),
                        Err(e) => Err(e),
                    };
                    self.locks.release(guard).await;
                    outcome
                }
                None => self.cache.refresh(product_id).await.map(|_| ()),
            }
        }
        .await;

        if let Err(e) = result {
            tracing::warn!(product_id, error = %e, "Failed to restore stock cache after release");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadlock_backoff_schedule() {
        assert_eq!(deadlock_backoff(1), Duration::from_millis(200));
        assert_eq!(deadlock_backoff(2), Duration::from_millis(400));
        assert_eq!(deadlock_backoff(3), Duration::from_millis(800));
    }

    #[test]
    fn test_hold_ttl_is_two_minutes() {
        assert_eq!(HOLD_TTL, Duration::from_secs(120));
    }

    #[test]
    fn test_lock_budgets() {
        assert!(PRODUCT_LOCK_WAIT < PRODUCT_LOCK_HOLD);
        assert!(RESTORE_LOCK_WAIT < PRODUCT_LOCK_WAIT);
        assert_eq!(DEADLOCK_ATTEMPTS, 3);
    }
}
