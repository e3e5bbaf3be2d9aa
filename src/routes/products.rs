use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    AppState,
    error::{AppError, Result},
    models::ProductAvailability,
};

pub async fn get_availability(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProductAvailability>> {
    let product = state
        .store
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product with id {} not found", id)))?;

    Ok(Json(ProductAvailability::from(&product)))
}
