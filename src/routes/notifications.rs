use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};

use crate::{
    AppState,
    error::Result,
    models::{MarkAllReadResponse, Notification, NotificationQuery},
    utils::{extractors::extract_user_id, jwt::Claims},
};

pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<NotificationQuery>,
) -> Result<Json<Vec<Notification>>> {
    let user_id = extract_user_id(&claims)?;
    let notifications = state
        .store
        .list_recent(user_id, params.effective_limit())
        .await?;

    Ok(Json(notifications))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> Result<Json<Notification>> {
    let user_id = extract_user_id(&claims)?;
    let notification = state.store.mark_read(id, user_id).await?;

    Ok(Json(notification))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MarkAllReadResponse>> {
    let user_id = extract_user_id(&claims)?;
    let count = state.store.mark_all_read(user_id).await?;

    Ok(Json(MarkAllReadResponse { count }))
}
