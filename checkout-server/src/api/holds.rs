//! Hold endpoints

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use shared::error::AppError;
use shared::models::{HoldCreate, HoldCreated};

use crate::state::AppState;

/// POST /holds
pub async fn create_hold(
    State(state): State<AppState>,
    Json(req): Json<HoldCreate>,
) -> Result<(StatusCode, Json<HoldCreated>), AppError> {
    let hold = state.holds.create_hold(req.product_id, req.qty).await?;

    Ok((
        StatusCode::CREATED,
        Json(HoldCreated {
            hold_id: hold.id,
            expires_at: hold.expires_at,
        }),
    ))
}
