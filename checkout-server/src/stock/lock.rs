//! Named advisory locks in Redis
//!
//! `SET NX PX` mutexes with bounded wait and bounded hold time. These locks
//! reduce contention on the row locks; they are not the correctness
//! boundary, so a lost lock (expired TTL) degrades to row-lock contention
//! rather than corruption.

use std::time::Duration;

use redis::aio::ConnectionManager;
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::ServiceResult;

/// Poll interval while waiting for a held lock
const ACQUIRE_POLL: Duration = Duration::from_millis(50);

/// Delete only if we still own the lock; an expired-and-reacquired lock
/// belongs to someone else
const UNLOCK_IF_OWNED: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
end
return 0
"#;

/// Proof of lock ownership; pass back to [`LockManager::release`]
#[derive(Debug)]
pub struct LockGuard {
    key: String,
    token: String,
}

/// Advisory lock manager over Redis
#[derive(Clone)]
pub struct LockManager {
    redis: ConnectionManager,
}

impl LockManager {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    pub fn product_key(product_id: i64) -> String {
        format!("lock:product:{product_id}")
    }

    pub fn hold_key(hold_id: i64) -> String {
        format!("lock:hold:{hold_id}")
    }

    /// Try to acquire `key`, polling for at most `wait`. The lock auto-expires
    /// after `hold`. Returns `None` when the wait budget runs out.
    pub async fn acquire(
        &self,
        key: &str,
        wait: Duration,
        hold: Duration,
    ) -> ServiceResult<Option<LockGuard>> {
        let token = Uuid::new_v4().to_string();
        let hold_ms = hold.as_millis() as u64;
        let deadline = Instant::now() + wait;
        let mut conn = self.redis.clone();

        loop {
            let acquired: bool = redis::cmd("SET")
                .arg(key)
                .arg(&token)
                .arg("NX")
                .arg("PX")
                .arg(hold_ms)
                .query_async(&mut conn)
                .await?;

            if acquired {
                return Ok(Some(LockGuard {
                    key: key.to_string(),
                    token,
                }));
            }

            if Instant::now() + ACQUIRE_POLL > deadline {
                return Ok(None);
            }
            tokio::time::sleep(ACQUIRE_POLL).await;
        }
    }

    /// Release a held lock. Best-effort: a failure only means the lock rides
    /// out its TTL, so it is logged and swallowed.
    pub async fn release(&self, guard: LockGuard) {
        let mut conn = self.redis.clone();
        let result: Result<i64, redis::RedisError> = redis::Script::new(UNLOCK_IF_OWNED)
            .key(&guard.key)
            .arg(&guard.token)
            .invoke_async(&mut conn)
            .await;

        if let Err(e) = result {
            tracing::warn!(key = %guard.key, error = %e, "Failed to release advisory lock");
        }
    }
}
