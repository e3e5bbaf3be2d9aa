use std::collections::HashMap;

use sqlx::{PgConnection, PgPool};

use crate::{error::Result, models::Product};

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(product)
}

pub async fn find_by_ids(pool: &PgPool, ids: &[i32]) -> Result<HashMap<i32, Product>> {
    let products = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await?;

    Ok(products.into_iter().map(|p| (p.id, p)).collect())
}

/// Conditional decrement; false when the product is gone or has too little stock.
pub async fn decrement_stock(conn: &mut PgConnection, id: i32, amount: i32) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE products SET stock = stock - $1
         WHERE id = $2 AND stock >= $1",
    )
    .bind(amount)
    .bind(id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}
