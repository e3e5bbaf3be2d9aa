use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;

use crate::{
    error::{AppError, Result},
    models::{CheckoutRequest, CheckoutResponse, OrderStatus, Product},
    store::{MarketStore, PlaceOutcome},
};

pub const MAX_ADDRESS_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedItem {
    pub product_id: i32,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// A validated, server-priced checkout ready to be committed.
#[derive(Debug, Clone)]
pub struct CheckoutPlan {
    pub address: String,
    pub items: Vec<PlannedItem>,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
    pub idempotency_key: Option<String>,
}

impl CheckoutPlan {
    /// Quantity to take from each product, ordered by product id so that
    /// concurrent checkouts lock rows in the same order.
    pub fn stock_demands(&self) -> Vec<(i32, i32)> {
        let mut demand: BTreeMap<i32, i32> = BTreeMap::new();
        for item in &self.items {
            *demand.entry(item.product_id).or_insert(0) += item.quantity;
        }
        demand.into_iter().collect()
    }
}

#[derive(Debug, Clone)]
pub struct CheckoutReceipt {
    pub response: CheckoutResponse,
    pub replayed: bool,
}

/// Input checks that need no catalog access.
pub fn validate_request(req: &CheckoutRequest) -> Result<()> {
    let address = req.address.trim();
    if address.is_empty() {
        return Err(AppError::validation("address", "Address is required"));
    }
    if address.chars().count() > MAX_ADDRESS_LEN {
        return Err(AppError::validation(
            "address",
            format!("Address must be at most {} characters", MAX_ADDRESS_LEN),
        ));
    }

    if req.items.is_empty() {
        return Err(AppError::validation("items", "Cart is empty"));
    }

    for (index, line) in req.items.iter().enumerate() {
        if line.quantity < 1 {
            return Err(AppError::validation(
                format!("items.{}.quantity", index),
                "Quantity must be at least 1",
            ));
        }
    }

    Ok(())
}

/// Checks every line against the catalog and prices it with the catalog price.
pub fn plan_checkout(
    req: &CheckoutRequest,
    products: &HashMap<i32, Product>,
    delivery_fee: Decimal,
    idempotency_key: Option<String>,
) -> Result<CheckoutPlan> {
    for (index, line) in req.items.iter().enumerate() {
        match products.get(&line.product_id) {
            Some(product) if product.is_active() => {}
            Some(_) => {
                return Err(AppError::validation(
                    format!("items.{}.productId", index),
                    format!("Product {} is not available", line.product_id),
                ));
            }
            None => {
                return Err(AppError::validation(
                    format!("items.{}.productId", index),
                    format!("Product {} does not exist", line.product_id),
                ));
            }
        }
    }

    // Duplicate lines for the same product share its stock.
    let mut demand: HashMap<i32, i64> = HashMap::new();
    for line in &req.items {
        *demand.entry(line.product_id).or_insert(0) += i64::from(line.quantity);
    }

    let mut items = Vec::with_capacity(req.items.len());
    let mut subtotal = Decimal::ZERO;

    for line in &req.items {
        let product = &products[&line.product_id];

        if demand[&line.product_id] > i64::from(product.stock) {
            return Err(AppError::StockConflict {
                product_id: product.id,
            });
        }

        subtotal += product.price * Decimal::from(line.quantity);
        items.push(PlannedItem {
            product_id: product.id,
            product_name: product.name.clone(),
            quantity: line.quantity,
            unit_price: product.price,
        });
    }

    Ok(CheckoutPlan {
        address: req.address.trim().to_string(),
        items,
        subtotal,
        delivery_fee,
        total: subtotal + delivery_fee,
        idempotency_key,
    })
}

pub async fn submit_checkout(
    store: &dyn MarketStore,
    customer_id: i32,
    req: &CheckoutRequest,
    idempotency_key: Option<String>,
    delivery_fee: Decimal,
) -> Result<CheckoutReceipt> {
    validate_request(req)?;

    if let Some(ref key) = idempotency_key {
        if let Some(prior) = store
            .find_order_by_idempotency_key(customer_id, key)
            .await?
        {
            tracing::info!(
                order_id = prior.id,
                customer_id,
                "Checkout replayed from idempotency key"
            );
            return Ok(replayed(prior.id, prior.status, prior.total_price));
        }
    }

    let mut product_ids: Vec<i32> = req.items.iter().map(|line| line.product_id).collect();
    product_ids.sort_unstable();
    product_ids.dedup();

    let products = store.find_products(&product_ids).await?;
    let plan = plan_checkout(req, &products, delivery_fee, idempotency_key)?;

    match store.place_order(customer_id, &plan).await {
        Ok(PlaceOutcome::Created(placed)) => {
            tracing::info!(
                order_id = placed.order.id,
                customer_id,
                items = placed.items.len(),
                total = %placed.order.total_price,
                "Order placed"
            );
            Ok(CheckoutReceipt {
                response: CheckoutResponse {
                    order_id: placed.order.id,
                    status: placed.order.status,
                    total: placed.order.total_price,
                },
                replayed: false,
            })
        }
        Ok(PlaceOutcome::Replayed(prior)) => {
            tracing::info!(
                order_id = prior.id,
                customer_id,
                "Concurrent checkout resolved to existing order"
            );
            Ok(replayed(prior.id, prior.status, prior.total_price))
        }
        Err(AppError::StockConflict { product_id }) => {
            tracing::warn!(customer_id, product_id, "Checkout aborted on stock conflict");
            Err(AppError::StockConflict { product_id })
        }
        Err(e) => Err(e),
    }
}

fn replayed(order_id: i32, status: OrderStatus, total: Decimal) -> CheckoutReceipt {
    CheckoutReceipt {
        response: CheckoutResponse {
            order_id,
            status,
            total,
        },
        replayed: true,
    }
}
