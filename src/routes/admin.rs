use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use http::StatusCode;

use crate::{
    AppState,
    error::Result,
    models::{Order, OrderQuery, OrderSearchResponse, UpdateOrderStatusRequest},
    services::orders,
    utils::{
        extractors::{JsonBody, extract_user_id},
        jwt::Claims,
    },
};

//ORDER ROUTES
pub async fn search_orders(
    State(state): State<AppState>,
    Query(params): Query<OrderQuery>,
) -> Result<Json<OrderSearchResponse>> {
    let response = orders::search_orders(state.store.as_ref(), &params).await?;

    Ok(Json(response))
}

pub async fn update_order_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    JsonBody(payload): JsonBody<UpdateOrderStatusRequest>,
) -> Result<Json<Order>> {
    let admin_id = extract_user_id(&claims)?;
    let order =
        orders::transition_status(state.store.as_ref(), admin_id, id, payload.status).await?;

    Ok(Json(order))
}

pub async fn delete_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    let admin_id = extract_user_id(&claims)?;
    orders::delete_order(state.store.as_ref(), admin_id, id).await?;

    Ok(StatusCode::NO_CONTENT)
}
