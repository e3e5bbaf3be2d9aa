use axum::{Extension, Json, extract::State};

use crate::{
    AppState,
    error::Result,
    models::OrderResponse,
    services::orders,
    utils::{extractors::extract_user_id, jwt::Claims},
};

pub async fn get_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<OrderResponse>>> {
    let user_id = extract_user_id(&claims)?;
    let response = orders::customer_orders(state.store.as_ref(), user_id).await?;

    Ok(Json(response))
}
