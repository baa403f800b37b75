//! Payment webhook endpoint

use axum::extract::State;
use axum::Json;
use shared::models::{WebhookOutcome, WebhookPayload};

use crate::state::AppState;

use super::ApiResult;

/// POST /payments/webhook
///
/// Always 200 for duplicate and early deliveries (`already_processed`,
/// `pending_order`); the payment provider only needs to know the delivery
/// landed.
pub async fn handle_webhook(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> ApiResult<WebhookOutcome> {
    let outcome = state.webhook.handle(payload).await?;
    Ok(Json(outcome))
}
