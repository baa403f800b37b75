//! Database operations, one module per table
//!
//! Functions take `impl PgExecutor` so the same query runs against the pool
//! or inside an open transaction (`&mut *tx`). Row-locking loads
//! (`FOR UPDATE`) must be called inside a transaction.

pub mod holds;
pub mod orders;
pub mod products;
pub mod webhook_logs;
