//! Application state for checkout-server

use redis::aio::ConnectionManager;
use sqlx::PgPool;

use crate::config::Config;
use crate::holds::HoldManager;
use crate::orders::OrderManager;
use crate::stock::{LockManager, StockCache};
use crate::webhook::WebhookSettlement;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool (source of truth)
    pub pool: PgPool,
    /// Redis connection (advisory counters, locks, job dedupe)
    pub redis: ConnectionManager,
    /// Advisory stock counters
    pub cache: StockCache,
    /// Named advisory locks
    pub locks: LockManager,
    /// Hold manager
    pub holds: HoldManager,
    /// Order manager
    pub orders: OrderManager,
    /// Webhook settlement
    pub webhook: WebhookSettlement,
}

impl AppState {
    /// Create a new AppState
    pub async fn new(config: &Config) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        // Connect to PostgreSQL
        let pool = PgPool::connect(&config.database_url).await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        // Connect to Redis
        let client = redis::Client::open(config.redis_url.as_str())?;
        let redis = ConnectionManager::new(client).await?;

        let cache = StockCache::new(pool.clone(), redis.clone());
        let locks = LockManager::new(redis.clone());
        let holds = HoldManager::new(pool.clone(), cache.clone(), locks.clone());
        let orders = OrderManager::new(pool.clone(), holds.clone());
        let webhook = WebhookSettlement::new(pool.clone(), orders.clone());

        Ok(Self {
            pool,
            redis,
            cache,
            locks,
            holds,
            orders,
            webhook,
        })
    }
}
