//! API routes for checkout-server

pub mod health;
pub mod holds;
pub mod orders;
pub mod products;
pub mod webhook;

use axum::routing::{get, post};
use axum::Router;
use shared::error::AppError;

use crate::state::AppState;

pub type ApiResult<T> = Result<axum::Json<T>, AppError>;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/products/{id}", get(products::get_product))
        .route("/holds", post(holds::create_hold))
        .route("/orders", post(orders::create_order))
        .route("/payments/webhook", post(webhook::handle_webhook))
        .with_state(state)
}
