//! Stock accounting: authoritative calculator, advisory cache, advisory locks

pub mod cache;
pub mod calculator;
pub mod lock;

pub use cache::StockCache;
pub use lock::{LockGuard, LockManager};
