use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use http::HeaderMap;

use crate::{
    error::{AppError, Result},
    utils::jwt::Claims,
};

pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";
const IDEMPOTENCY_KEY_LEN: std::ops::RangeInclusive<usize> = 8..=128;

pub fn extract_user_id(claims: &Claims) -> Result<i32> {
    claims
        .sub
        .parse::<i32>()
        .map_err(|_| AppError::Unauthorized("Unauthorized".to_string()))
}

/// Optional client token that makes a checkout submission safe to repeat.
pub fn extract_idempotency_key(headers: &HeaderMap) -> Result<Option<String>> {
    let Some(value) = headers.get(IDEMPOTENCY_HEADER) else {
        return Ok(None);
    };

    let key = value
        .to_str()
        .map(str::trim)
        .map_err(|_| AppError::validation("idempotencyKey", "Idempotency key must be ASCII"))?;

    if !IDEMPOTENCY_KEY_LEN.contains(&key.len()) {
        return Err(AppError::validation(
            "idempotencyKey",
            "Idempotency key must be between 8 and 128 characters",
        ));
    }

    Ok(Some(key.to_string()))
}

/// `Json` whose rejections are reported as a validation error on `body`.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::validation("body", rejection.body_text())),
        }
    }
}
