//! Order endpoints

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use shared::error::AppError;
use shared::models::{OrderCreate, OrderView};

use crate::db;
use crate::error::ServiceError;
use crate::state::AppState;

/// POST /orders
///
/// Reconciliation runs inline after the commit: the payment webhook may have
/// arrived before this order existed, in which case its parked payload
/// settles the order immediately.
pub async fn create_order(
    State(state): State<AppState>,
    Json(req): Json<OrderCreate>,
) -> Result<(StatusCode, Json<OrderView>), AppError> {
    let mut order = state.orders.create_order_from_hold(req.hold_id).await?;

    if state.webhook.reconcile_pending(order.id).await > 0 {
        // A parked webhook just settled this order; return the fresh status
        if let Some(settled) = db::orders::find_by_id(&state.pool, order.id)
            .await
            .map_err(ServiceError::from)?
        {
            order = settled;
        }
    }

    Ok((StatusCode::CREATED, Json(order.into())))
}
