//! Data models (API DTOs + persisted entities)
//!
//! These types are used for REST API requests/responses and map 1:1 onto the
//! persisted tables (`sqlx::FromRow` behind the `db` feature).

pub mod hold;
pub mod order;
pub mod product;
pub mod webhook;

// Re-exports
pub use hold::*;
pub use order::*;
pub use product::*;
pub use webhook::*;
