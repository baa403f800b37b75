//! Advisory stock counter in Redis
//!
//! The store is the source of truth; this counter only amortizes the
//! aggregation query on reads. A stale or missing counter can never cause
//! oversell because hold creation always re-checks the authoritative
//! calculator inside the row-locked transaction.

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use sqlx::PgPool;

use crate::error::ServiceResult;
use crate::stock::calculator;

/// Counter TTL: short enough that a crashed process cannot corrupt
/// availability for long, long enough that steady-state reads hit
const CACHE_TTL_SECS: u64 = 300;

/// Decrement only when the key exists; a miss stays a miss until the next
/// authoritative refresh writes the key
const DECR_IF_PRESENT: &str = r#"
if redis.call("EXISTS", KEYS[1]) == 1 then
    return redis.call("DECRBY", KEYS[1], ARGV[1])
end
return false
"#;

const INCR_IF_PRESENT: &str = r#"
if redis.call("EXISTS", KEYS[1]) == 1 then
    return redis.call("INCRBY", KEYS[1], ARGV[1])
end
return false
"#;

/// Cache coordinator for per-product available-stock counters
#[derive(Clone)]
pub struct StockCache {
    pool: PgPool,
    redis: ConnectionManager,
}

impl StockCache {
    pub fn new(pool: PgPool, redis: ConnectionManager) -> Self {
        Self { pool, redis }
    }

    fn key(product_id: i64) -> String {
        format!("product:{product_id}:available_stock")
    }

    /// Fast-path read: cached value if present, otherwise refresh from the
    /// calculator. Returns `None` when the product does not exist.
    pub async fn get_available(&self, product_id: i64) -> ServiceResult<Option<i64>> {
        if let Some(cached) = self.cached_value(product_id).await? {
            return Ok(Some(cached.max(0)));
        }
        self.refresh(product_id).await
    }

    /// Recompute from the store and overwrite the counter
    pub async fn refresh(&self, product_id: i64) -> ServiceResult<Option<i64>> {
        let Some(available) = calculator::available_stock(&self.pool, product_id).await? else {
            return Ok(None);
        };
        self.put(product_id, available).await?;
        Ok(Some(available))
    }

    /// Raw cached counter, not floored; `None` on miss
    pub async fn cached_value(&self, product_id: i64) -> ServiceResult<Option<i64>> {
        let mut conn = self.redis.clone();
        let value: Option<i64> = conn.get(Self::key(product_id)).await?;
        Ok(value)
    }

    /// Overwrite the counter with an authoritative value
    pub async fn put(&self, product_id: i64, available: i64) -> ServiceResult<()> {
        let mut conn = self.redis.clone();
        let _: () = conn
            .set_ex(Self::key(product_id), available, CACHE_TTL_SECS)
            .await?;
        Ok(())
    }

    /// Atomically decrement the counter when present; `None` on miss
    pub async fn decrement(&self, product_id: i64, qty: i32) -> ServiceResult<Option<i64>> {
        let mut conn = self.redis.clone();
        let value: Option<i64> = redis::Script::new(DECR_IF_PRESENT)
            .key(Self::key(product_id))
            .arg(qty)
            .invoke_async(&mut conn)
            .await?;
        Ok(value)
    }

    /// Atomically increment the counter when present; `None` on miss
    pub async fn increment(&self, product_id: i64, qty: i32) -> ServiceResult<Option<i64>> {
        let mut conn = self.redis.clone();
        let value: Option<i64> = redis::Script::new(INCR_IF_PRESENT)
            .key(Self::key(product_id))
            .arg(qty)
            .invoke_async(&mut conn)
            .await?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_format() {
        assert_eq!(StockCache::key(42), "product:42:available_stock");
    }
}
