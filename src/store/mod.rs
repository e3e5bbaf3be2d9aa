//! Persistence seam for the checkout core.
//!
//! Each component of the marketplace core talks to storage through its own
//! trait; `MarketStore` bundles them for the application state. `PgStore`
//! is the production backend, `MemoryStore` keeps everything in process
//! behind a single lock and mirrors the Postgres semantics.

mod memory;
mod postgres;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::{
    error::Result,
    models::{AdminOrder, Notification, Order, OrderItem, OrderQuery, OrderStatus, Product},
    services::checkout::CheckoutPlan,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Everything written by one successful checkout.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub notification: Notification,
}

#[derive(Debug, Clone)]
pub enum PlaceOutcome {
    Created(PlacedOrder),
    /// The idempotency key was already used by this customer.
    Replayed(Order),
}

/// Catalog reads. The stock decrement (`ok | conflict`) only runs inside
/// `CheckoutStore::place_order`, in the same transaction as the order insert.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_product(&self, id: i32) -> Result<Option<Product>>;

    async fn find_products(&self, ids: &[i32]) -> Result<HashMap<i32, Product>>;
}

#[async_trait]
pub trait CheckoutStore: Send + Sync {
    async fn find_order_by_idempotency_key(
        &self,
        customer_id: i32,
        key: &str,
    ) -> Result<Option<Order>>;

    /// Inserts the order, its items and the placement notification and
    /// decrements stock, all or nothing. A decrement that would drive stock
    /// negative aborts with `AppError::StockConflict`.
    async fn place_order(&self, customer_id: i32, plan: &CheckoutPlan) -> Result<PlaceOutcome>;
}

#[async_trait]
pub trait OrderLedger: Send + Sync {
    async fn find_order(&self, id: i32) -> Result<Option<Order>>;

    async fn customer_orders(&self, customer_id: i32) -> Result<Vec<Order>>;

    async fn items_for_orders(&self, order_ids: &[i32]) -> Result<Vec<OrderItem>>;

    /// Newest first. Returns the page and the total number of matches.
    async fn search_orders(
        &self,
        query: &OrderQuery,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<AdminOrder>, i64)>;

    /// Compare-and-set on status; `None` when the order is gone or no longer in `from`.
    async fn update_order_status(
        &self,
        id: i32,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<Order>>;

    async fn delete_order(&self, id: i32) -> Result<u64>;
}

#[async_trait]
pub trait NotificationOutbox: Send + Sync {
    async fn append(&self, user_id: i32, message: &str) -> Result<Notification>;

    /// Fails with `Forbidden` when the notification belongs to someone else.
    async fn mark_read(&self, id: i32, user_id: i32) -> Result<Notification>;

    async fn mark_all_read(&self, user_id: i32) -> Result<u64>;

    async fn list_recent(&self, user_id: i32, limit: i64) -> Result<Vec<Notification>>;
}

#[async_trait]
pub trait MarketStore: CatalogStore + CheckoutStore + OrderLedger + NotificationOutbox {
    async fn ping(&self) -> Result<()>;
}
