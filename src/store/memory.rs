use std::{
    collections::{BTreeMap, HashMap},
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::Utc;

use super::{
    CatalogStore, CheckoutStore, MarketStore, NotificationOutbox, OrderLedger, PlaceOutcome,
    PlacedOrder,
};
use crate::{
    error::{AppError, Result},
    models::{AdminOrder, Notification, Order, OrderItem, OrderQuery, OrderStatus, Product},
    services::checkout::CheckoutPlan,
};

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<i32, String>,
    products: BTreeMap<i32, Product>,
    orders: BTreeMap<i32, Order>,
    items: BTreeMap<i32, OrderItem>,
    notifications: BTreeMap<i32, Notification>,
    last_order_id: i32,
    last_item_id: i32,
    last_notification_id: i32,
}

impl MemoryState {
    fn append_notification(&mut self, user_id: i32, message: String) -> Notification {
        self.last_notification_id += 1;
        let notification = Notification {
            id: self.last_notification_id,
            user_id,
            message,
            is_read: false,
            created_at: Utc::now(),
        };
        self.notifications
            .insert(notification.id, notification.clone());
        notification
    }

    fn customer_name(&self, customer_id: i32) -> String {
        self.users.get(&customer_id).cloned().unwrap_or_default()
    }
}

/// In-process store. Every operation runs under one lock, which makes
/// `place_order` atomic with respect to concurrent checkouts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, id: i32, name: impl Into<String>) -> Result<()> {
        self.state()?.users.insert(id, name.into());
        Ok(())
    }

    pub fn insert_product(&self, product: Product) -> Result<()> {
        self.state()?.products.insert(product.id, product);
        Ok(())
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| AppError::InternalError("Memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn get_product(&self, id: i32) -> Result<Option<Product>> {
        Ok(self.state()?.products.get(&id).cloned())
    }

    async fn find_products(&self, ids: &[i32]) -> Result<HashMap<i32, Product>> {
        let state = self.state()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.products.get(id))
            .map(|p| (p.id, p.clone()))
            .collect())
    }
}

#[async_trait]
impl CheckoutStore for MemoryStore {
    async fn find_order_by_idempotency_key(
        &self,
        customer_id: i32,
        key: &str,
    ) -> Result<Option<Order>> {
        let state = self.state()?;
        Ok(state
            .orders
            .values()
            .find(|o| o.customer_id == customer_id && o.idempotency_key.as_deref() == Some(key))
            .cloned())
    }

    async fn place_order(&self, customer_id: i32, plan: &CheckoutPlan) -> Result<PlaceOutcome> {
        let mut state = self.state()?;

        if let Some(ref key) = plan.idempotency_key {
            if let Some(prior) = state
                .orders
                .values()
                .find(|o| o.customer_id == customer_id && o.idempotency_key.as_ref() == Some(key))
            {
                return Ok(PlaceOutcome::Replayed(prior.clone()));
            }
        }

        // Check every decrement before writing anything.
        let demands = plan.stock_demands();
        for &(product_id, quantity) in &demands {
            match state.products.get(&product_id) {
                Some(product) if product.stock >= quantity => {}
                _ => return Err(AppError::StockConflict { product_id }),
            }
        }

        for (product_id, quantity) in demands {
            if let Some(product) = state.products.get_mut(&product_id) {
                product.stock -= quantity;
            }
        }

        let now = Utc::now();
        state.last_order_id += 1;
        let order = Order {
            id: state.last_order_id,
            customer_id,
            total_price: plan.total,
            status: OrderStatus::Pending,
            address: plan.address.clone(),
            idempotency_key: plan.idempotency_key.clone(),
            created_at: now,
            updated_at: now,
        };
        state.orders.insert(order.id, order.clone());

        let mut items = Vec::with_capacity(plan.items.len());
        for planned in &plan.items {
            state.last_item_id += 1;
            let item = OrderItem {
                id: state.last_item_id,
                order_id: order.id,
                product_id: Some(planned.product_id),
                product_name: planned.product_name.clone(),
                quantity: planned.quantity,
                unit_price: planned.unit_price,
            };
            state.items.insert(item.id, item.clone());
            items.push(item);
        }

        let notification = state.append_notification(customer_id, order.placement_notice());

        Ok(PlaceOutcome::Created(PlacedOrder {
            order,
            items,
            notification,
        }))
    }
}

#[async_trait]
impl OrderLedger for MemoryStore {
    async fn find_order(&self, id: i32) -> Result<Option<Order>> {
        Ok(self.state()?.orders.get(&id).cloned())
    }

    async fn customer_orders(&self, customer_id: i32) -> Result<Vec<Order>> {
        let state = self.state()?;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| o.customer_id == customer_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(orders)
    }

    async fn items_for_orders(&self, order_ids: &[i32]) -> Result<Vec<OrderItem>> {
        let state = self.state()?;
        Ok(state
            .items
            .values()
            .filter(|item| order_ids.contains(&item.order_id))
            .cloned()
            .collect())
    }

    async fn search_orders(
        &self,
        query: &OrderQuery,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<AdminOrder>, i64)> {
        let state = self.state()?;
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut matches: Vec<AdminOrder> = state
            .orders
            .values()
            .map(|order| AdminOrder {
                customer_name: state.customer_name(order.customer_id),
                order: order.clone(),
            })
            .filter(|row| {
                search
                    .as_ref()
                    .is_none_or(|s| row.customer_name.to_lowercase().contains(s))
            })
            .filter(|row| query.status.is_none_or(|s| row.order.status == s))
            .filter(|row| query.min_price.is_none_or(|min| row.order.total_price >= min))
            .filter(|row| query.max_price.is_none_or(|max| row.order.total_price <= max))
            .collect();

        matches.sort_by(|a, b| {
            (b.order.created_at, b.order.id).cmp(&(a.order.created_at, a.order.id))
        });

        let total = matches.len() as i64;
        let page = matches
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();

        Ok((page, total))
    }

    async fn update_order_status(
        &self,
        id: i32,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<Order>> {
        let mut state = self.state()?;
        match state.orders.get_mut(&id) {
            Some(order) if order.status == from => {
                order.status = to;
                order.updated_at = Utc::now();
                Ok(Some(order.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_order(&self, id: i32) -> Result<u64> {
        let mut state = self.state()?;
        if state.orders.remove(&id).is_none() {
            return Ok(0);
        }
        state.items.retain(|_, item| item.order_id != id);
        Ok(1)
    }
}

#[async_trait]
impl NotificationOutbox for MemoryStore {
    async fn append(&self, user_id: i32, message: &str) -> Result<Notification> {
        Ok(self.state()?.append_notification(user_id, message.to_string()))
    }

    async fn mark_read(&self, id: i32, user_id: i32) -> Result<Notification> {
        let mut state = self.state()?;
        match state.notifications.get_mut(&id) {
            Some(notification) if notification.user_id == user_id => {
                notification.is_read = true;
                Ok(notification.clone())
            }
            Some(_) => Err(AppError::Forbidden(
                "Notification belongs to another user".to_string(),
            )),
            None => Err(AppError::NotFound(format!("Notification {} not found", id))),
        }
    }

    async fn mark_all_read(&self, user_id: i32) -> Result<u64> {
        let mut state = self.state()?;
        let mut count = 0;
        for notification in state.notifications.values_mut() {
            if notification.user_id == user_id && !notification.is_read {
                notification.is_read = true;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn list_recent(&self, user_id: i32, limit: i64) -> Result<Vec<Notification>> {
        let state = self.state()?;
        let mut notifications: Vec<Notification> = state
            .notifications
            .values()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        notifications.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        notifications.truncate(limit.max(0) as usize);
        Ok(notifications)
    }
}

#[async_trait]
impl MarketStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        self.state().map(|_| ())
    }
}
