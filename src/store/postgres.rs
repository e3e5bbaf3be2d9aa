use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;

use super::{
    CatalogStore, CheckoutStore, MarketStore, NotificationOutbox, OrderLedger, PlaceOutcome,
    PlacedOrder,
};
use crate::{
    database,
    error::{AppError, Result},
    models::{AdminOrder, Notification, Order, OrderItem, OrderQuery, OrderStatus, Product},
    queries::{notification_queries, order_queries, product_queries},
    services::checkout::CheckoutPlan,
};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn get_product(&self, id: i32) -> Result<Option<Product>> {
        product_queries::find_by_id(&self.pool, id).await
    }

    async fn find_products(&self, ids: &[i32]) -> Result<HashMap<i32, Product>> {
        product_queries::find_by_ids(&self.pool, ids).await
    }
}

#[async_trait]
impl CheckoutStore for PgStore {
    async fn find_order_by_idempotency_key(
        &self,
        customer_id: i32,
        key: &str,
    ) -> Result<Option<Order>> {
        order_queries::find_by_idempotency_key(&self.pool, customer_id, key).await
    }

    async fn place_order(&self, customer_id: i32, plan: &CheckoutPlan) -> Result<PlaceOutcome> {
        let mut tx = self.pool.begin().await?;

        let order = match order_queries::insert_order(&mut *tx, customer_id, plan).await? {
            Some(order) => order,
            None => {
                tx.rollback().await?;
                let key = plan.idempotency_key.as_deref().ok_or_else(|| {
                    AppError::InternalError("Order insert skipped without idempotency key".to_string())
                })?;
                let prior = order_queries::find_by_idempotency_key(&self.pool, customer_id, key)
                    .await?
                    .ok_or_else(|| {
                        AppError::InternalError(format!(
                            "Idempotency key conflict for customer {} without stored order",
                            customer_id
                        ))
                    })?;
                return Ok(PlaceOutcome::Replayed(prior));
            }
        };

        for (product_id, quantity) in plan.stock_demands() {
            if !product_queries::decrement_stock(&mut *tx, product_id, quantity).await? {
                tx.rollback().await?;
                return Err(AppError::StockConflict { product_id });
            }
        }

        let items = order_queries::insert_items(&mut *tx, order.id, &plan.items).await?;
        let notification =
            notification_queries::insert(&mut *tx, customer_id, &order.placement_notice()).await?;

        tx.commit().await?;

        Ok(PlaceOutcome::Created(PlacedOrder {
            order,
            items,
            notification,
        }))
    }
}

#[async_trait]
impl OrderLedger for PgStore {
    async fn find_order(&self, id: i32) -> Result<Option<Order>> {
        order_queries::find_by_id(&self.pool, id).await
    }

    async fn customer_orders(&self, customer_id: i32) -> Result<Vec<Order>> {
        order_queries::get_customer_orders(&self.pool, customer_id).await
    }

    async fn items_for_orders(&self, order_ids: &[i32]) -> Result<Vec<OrderItem>> {
        order_queries::get_items_for_orders(&self.pool, order_ids).await
    }

    async fn search_orders(
        &self,
        query: &OrderQuery,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<AdminOrder>, i64)> {
        order_queries::search_orders(&self.pool, query, limit, offset).await
    }

    async fn update_order_status(
        &self,
        id: i32,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<Order>> {
        order_queries::update_status(&self.pool, id, from, to).await
    }

    async fn delete_order(&self, id: i32) -> Result<u64> {
        order_queries::delete_order(&self.pool, id).await
    }
}

#[async_trait]
impl NotificationOutbox for PgStore {
    async fn append(&self, user_id: i32, message: &str) -> Result<Notification> {
        let mut conn = self.pool.acquire().await?;
        notification_queries::insert(&mut conn, user_id, message).await
    }

    async fn mark_read(&self, id: i32, user_id: i32) -> Result<Notification> {
        if let Some(notification) = notification_queries::mark_read(&self.pool, id, user_id).await? {
            return Ok(notification);
        }

        match notification_queries::find_owner(&self.pool, id).await? {
            Some(_) => Err(AppError::Forbidden(
                "Notification belongs to another user".to_string(),
            )),
            None => Err(AppError::NotFound(format!("Notification {} not found", id))),
        }
    }

    async fn mark_all_read(&self, user_id: i32) -> Result<u64> {
        notification_queries::mark_all_read(&self.pool, user_id).await
    }

    async fn list_recent(&self, user_id: i32, limit: i64) -> Result<Vec<Notification>> {
        notification_queries::list_recent(&self.pool, user_id, limit).await
    }
}

#[async_trait]
impl MarketStore for PgStore {
    async fn ping(&self) -> Result<()> {
        database::check_health(&self.pool).await
    }
}
