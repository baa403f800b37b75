//! Product endpoints

use axum::extract::{Path, State};
use axum::Json;
use shared::error::AppError;
use shared::models::ProductView;

use crate::db;
use crate::error::ServiceError;
use crate::state::AppState;

use super::ApiResult;

/// GET /products/{id}
///
/// Availability comes from the cache coordinator: cached counter when warm,
/// authoritative recompute (which re-primes the counter) on a miss.
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> ApiResult<ProductView> {
    let product = db::products::find_by_id(&state.pool, product_id)
        .await
        .map_err(ServiceError::from)?
        .ok_or_else(|| AppError::product_not_found(product_id))?;

    let available = state
        .cache
        .get_available(product_id)
        .await?
        .unwrap_or_default();

    Ok(Json(ProductView::from_product(product, available)))
}
