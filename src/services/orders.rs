use std::collections::HashMap;

use crate::{
    error::{AppError, Result},
    models::{
        AdminOrderResponse, Order, OrderItem, OrderQuery, OrderResponse, OrderSearchResponse,
        OrderStatus,
    },
    store::MarketStore,
};

/// Orders per page in the admin listing.
pub const ORDER_PAGE_SIZE: i64 = 4;

pub async fn customer_orders(store: &dyn MarketStore, customer_id: i32) -> Result<Vec<OrderResponse>> {
    let orders = store.customer_orders(customer_id).await?;
    let mut items_map = group_items(store, orders.iter().map(|o| o.id).collect()).await?;

    Ok(orders
        .into_iter()
        .map(|order| {
            let items = items_map.remove(&order.id).unwrap_or_default();
            OrderResponse { order, items }
        })
        .collect())
}

pub async fn search_orders(store: &dyn MarketStore, query: &OrderQuery) -> Result<OrderSearchResponse> {
    if let (Some(min), Some(max)) = (query.min_price, query.max_price) {
        if min > max {
            return Err(AppError::validation(
                "minPrice",
                "Minimum price must not exceed maximum price",
            ));
        }
    }

    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1).saturating_mul(ORDER_PAGE_SIZE);

    let (orders, total) = store.search_orders(query, ORDER_PAGE_SIZE, offset).await?;
    let mut items_map = group_items(store, orders.iter().map(|o| o.order.id).collect()).await?;

    let orders = orders
        .into_iter()
        .map(|order| {
            let items = items_map.remove(&order.order.id).unwrap_or_default();
            AdminOrderResponse { order, items }
        })
        .collect();

    Ok(OrderSearchResponse {
        orders,
        total,
        page,
        per_page: ORDER_PAGE_SIZE,
        last_page: last_page(total),
    })
}

pub async fn transition_status(
    store: &dyn MarketStore,
    admin_id: i32,
    order_id: i32,
    next: OrderStatus,
) -> Result<Order> {
    let order = store
        .find_order(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;

    if order.status.is_terminal() {
        return Err(AppError::Conflict(format!(
            "Order {} is already {} and can no longer change status",
            order_id, order.status
        )));
    }

    if !order.status.can_transition_to(next) {
        return Err(AppError::Conflict(format!(
            "Order {} cannot move from {} to {}",
            order_id, order.status, next
        )));
    }

    let updated = store
        .update_order_status(order_id, order.status, next)
        .await?
        .ok_or_else(|| {
            AppError::Conflict(format!("Order {} was modified concurrently", order_id))
        })?;

    tracing::info!(
        order_id,
        admin_id,
        from = %order.status,
        to = %next,
        "Order status changed"
    );

    Ok(updated)
}

pub async fn delete_order(store: &dyn MarketStore, admin_id: i32, order_id: i32) -> Result<()> {
    if store.delete_order(order_id).await? == 0 {
        return Err(AppError::NotFound(format!("Order {} not found", order_id)));
    }

    tracing::info!(order_id, admin_id, "Order deleted with its items");
    Ok(())
}

fn last_page(total: i64) -> i64 {
    ((total + ORDER_PAGE_SIZE - 1) / ORDER_PAGE_SIZE).max(1)
}

async fn group_items(
    store: &dyn MarketStore,
    order_ids: Vec<i32>,
) -> Result<HashMap<i32, Vec<OrderItem>>> {
    let mut items_map: HashMap<i32, Vec<OrderItem>> = HashMap::new();
    if order_ids.is_empty() {
        return Ok(items_map);
    }

    for item in store.items_for_orders(&order_ids).await? {
        items_map.entry(item.order_id).or_default().push(item);
    }
    Ok(items_map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_page_rounds_up_and_never_drops_below_one() {
        assert_eq!(last_page(0), 1);
        assert_eq!(last_page(4), 1);
        assert_eq!(last_page(5), 2);
        assert_eq!(last_page(9), 3);
    }
}
