use sqlx::{PgConnection, PgPool};

use crate::{error::Result, models::Notification};

pub async fn insert(conn: &mut PgConnection, user_id: i32, message: &str) -> Result<Notification> {
    let notification = sqlx::query_as::<_, Notification>(
        "INSERT INTO notifications (user_id, message) VALUES ($1, $2) RETURNING *",
    )
    .bind(user_id)
    .bind(message)
    .fetch_one(conn)
    .await?;

    Ok(notification)
}

/// Marks read only when owned by `user_id`; re-marking a read notification still matches.
pub async fn mark_read(pool: &PgPool, id: i32, user_id: i32) -> Result<Option<Notification>> {
    let notification = sqlx::query_as::<_, Notification>(
        "UPDATE notifications SET is_read = TRUE
         WHERE id = $1 AND user_id = $2
         RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(notification)
}

pub async fn find_owner(pool: &PgPool, id: i32) -> Result<Option<i32>> {
    let owner = sqlx::query_scalar::<_, i32>("SELECT user_id FROM notifications WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(owner)
}

pub async fn mark_all_read(pool: &PgPool, user_id: i32) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE",
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn list_recent(pool: &PgPool, user_id: i32, limit: i64) -> Result<Vec<Notification>> {
    let notifications = sqlx::query_as::<_, Notification>(
        "SELECT * FROM notifications WHERE user_id = $1
         ORDER BY created_at DESC, id DESC
         LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(notifications)
}
