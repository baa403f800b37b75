//! Flash-sale checkout core
//!
//! Guarantees that committed sales never exceed inventory, even under burst
//! concurrency, delayed payment confirmation, and duplicate or out-of-order
//! webhook delivery.
//!
//! # Module structure
//!
//! ```text
//! checkout-server/src/
//! ├── config.rs      # Environment configuration
//! ├── state.rs       # Shared state (pool, redis, managers)
//! ├── error.rs       # Service-layer error bridging
//! ├── api/           # HTTP routes and handlers
//! ├── db/            # sqlx queries, one module per table
//! ├── stock/         # Authoritative calculator, advisory cache, locks
//! ├── holds/         # Hold manager (create / release, deadlock retry)
//! ├── orders/        # Order manager (create / mark_paid / cancel)
//! ├── webhook/       # Idempotent webhook settlement + reconciliation
//! └── sweeper/       # Expired-hold sweeper + release worker
//! ```

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod holds;
pub mod orders;
pub mod state;
pub mod stock;
pub mod sweeper;
pub mod webhook;

// Re-export the entry-point types
pub use config::Config;
pub use state::AppState;
