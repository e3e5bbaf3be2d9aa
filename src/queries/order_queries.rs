use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::{
    error::Result,
    models::{AdminOrder, Order, OrderItem, OrderQuery, OrderStatus},
    services::checkout::{CheckoutPlan, PlannedItem},
};

/// Inserts a pending order. `None` means this customer already used the
/// plan's idempotency key.
pub async fn insert_order(
    conn: &mut PgConnection,
    customer_id: i32,
    plan: &CheckoutPlan,
) -> Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(
        "INSERT INTO orders (customer_id, total_price, status, address, idempotency_key)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT ON CONSTRAINT orders_customer_idempotency_key DO NOTHING
         RETURNING *",
    )
    .bind(customer_id)
    .bind(plan.total)
    .bind(OrderStatus::Pending)
    .bind(&plan.address)
    .bind(plan.idempotency_key.as_deref())
    .fetch_optional(conn)
    .await?;

    Ok(order)
}

pub async fn insert_items(
    conn: &mut PgConnection,
    order_id: i32,
    items: &[PlannedItem],
) -> Result<Vec<OrderItem>> {
    let product_ids: Vec<i32> = items.iter().map(|i| i.product_id).collect();
    let product_names: Vec<&str> = items.iter().map(|i| i.product_name.as_str()).collect();
    let quantities: Vec<i32> = items.iter().map(|i| i.quantity).collect();
    let prices: Vec<Decimal> = items.iter().map(|i| i.unit_price).collect();

    let mut inserted = sqlx::query_as::<_, OrderItem>(
        "INSERT INTO order_items (order_id, product_id, product_name, quantity, unit_price)
         SELECT $1, unnest($2::int[]), unnest($3::varchar[]), unnest($4::int[]), unnest($5::numeric[])
         RETURNING *",
    )
    .bind(order_id)
    .bind(&product_ids)
    .bind(&product_names)
    .bind(&quantities)
    .bind(&prices)
    .fetch_all(conn)
    .await?;

    inserted.sort_by_key(|item| item.id);
    Ok(inserted)
}

pub async fn find_by_idempotency_key(
    pool: &PgPool,
    customer_id: i32,
    key: &str,
) -> Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE customer_id = $1 AND idempotency_key = $2",
    )
    .bind(customer_id)
    .bind(key)
    .fetch_optional(pool)
    .await?;

    Ok(order)
}

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(order)
}

pub async fn get_customer_orders(pool: &PgPool, customer_id: i32) -> Result<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE customer_id = $1 ORDER BY created_at DESC, id DESC",
    )
    .bind(customer_id)
    .fetch_all(pool)
    .await?;

    Ok(orders)
}

pub async fn get_items_for_orders(pool: &PgPool, order_ids: &[i32]) -> Result<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT * FROM order_items WHERE order_id = ANY($1) ORDER BY id",
    )
    .bind(order_ids)
    .fetch_all(pool)
    .await?;

    Ok(items)
}

pub async fn update_status(
    pool: &PgPool,
    id: i32,
    from: OrderStatus,
    to: OrderStatus,
) -> Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(
        "UPDATE orders SET status = $1, updated_at = NOW()
         WHERE id = $2 AND status = $3
         RETURNING *",
    )
    .bind(to)
    .bind(id)
    .bind(from)
    .fetch_optional(pool)
    .await?;

    Ok(order)
}

/// Items go with the order through `ON DELETE CASCADE`.
pub async fn delete_order(pool: &PgPool, id: i32) -> Result<u64> {
    let result = sqlx::query("DELETE FROM orders WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn search_orders(
    pool: &PgPool,
    params: &OrderQuery,
    limit: i64,
    offset: i64,
) -> Result<(Vec<AdminOrder>, i64)> {
    let mut count_query = QueryBuilder::<Postgres>::new(
        "SELECT COUNT(*) FROM orders o JOIN users u ON u.id = o.customer_id WHERE 1=1",
    );
    push_filters(&mut count_query, params);
    let total = count_query
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await?;

    let mut query = QueryBuilder::<Postgres>::new(
        "SELECT o.*, u.name AS customer_name
         FROM orders o JOIN users u ON u.id = o.customer_id WHERE 1=1",
    );
    push_filters(&mut query, params);
    query.push(" ORDER BY o.created_at DESC, o.id DESC");
    query.push(" LIMIT ");
    query.push_bind(limit);
    query.push(" OFFSET ");
    query.push_bind(offset);

    let orders = query.build_query_as::<AdminOrder>().fetch_all(pool).await?;

    Ok((orders, total))
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, params: &OrderQuery) {
    if let Some(search) = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query.push(" AND u.name ILIKE ");
        query.push_bind(format!("%{}%", search));
    }

    if let Some(status) = params.status {
        query.push(" AND o.status = ");
        query.push_bind(status);
    }

    if let Some(min_price) = params.min_price {
        query.push(" AND o.total_price >= ");
        query.push_bind(min_price);
    }

    if let Some(max_price) = params.max_price {
        query.push(" AND o.total_price <= ");
        query.push_bind(max_price);
    }
}
