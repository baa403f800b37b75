//! Shared types for the flash-sale checkout services
//!
//! - [`error`]: unified error codes, `AppError`, API error envelope
//! - [`models`]: persisted entities and API DTOs
//! - [`money`]: fixed-point monetary arithmetic and serialization

pub mod error;
pub mod models;
pub mod money;
