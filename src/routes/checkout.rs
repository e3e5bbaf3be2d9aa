use axum::{Extension, Json, extract::State, http::StatusCode};
use http::HeaderMap;

use crate::{
    AppState,
    error::Result,
    models::{CheckoutRequest, CheckoutResponse},
    services::checkout,
    utils::{
        extractors::{JsonBody, extract_idempotency_key, extract_user_id},
        jwt::Claims,
    },
};

pub async fn submit_checkout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    JsonBody(payload): JsonBody<CheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>)> {
    let customer_id = extract_user_id(&claims)?;
    let idempotency_key = extract_idempotency_key(&headers)?;

    let receipt = checkout::submit_checkout(
        state.store.as_ref(),
        customer_id,
        &payload,
        idempotency_key,
        state.delivery_fee,
    )
    .await?;

    let status = if receipt.replayed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };

    Ok((status, Json(receipt.response)))
}
