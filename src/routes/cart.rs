use std::collections::HashMap;

use axum::{Json, extract::State};

use crate::{
    AppState,
    error::Result,
    models::{CartQuoteRequest, CartQuoteResponse, ProductAvailability},
    services::cart::Cart,
    utils::extractors::JsonBody,
};

/// Rebuilds the client's cart from current catalog data without writing anything.
pub async fn quote_cart(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CartQuoteRequest>,
) -> Result<Json<CartQuoteResponse>> {
    let mut product_ids: Vec<i32> = payload.items.iter().map(|i| i.product_id).collect();
    product_ids.sort_unstable();
    product_ids.dedup();

    let catalog: HashMap<i32, ProductAvailability> = state
        .store
        .find_products(&product_ids)
        .await?
        .values()
        .map(|p| (p.id, ProductAvailability::from(p)))
        .collect();

    let mut cart = Cart::new(state.delivery_fee);
    let mut adjusted = false;

    for line in &payload.items {
        let Some(product) = catalog.get(&line.product_id) else {
            adjusted = true;
            continue;
        };

        match cart.add_item(product, line.quantity) {
            Some(_) => {
                if line.price.is_some_and(|price| price != product.price) {
                    adjusted = true;
                }
            }
            None => adjusted = true,
        }
    }

    let mut requested: HashMap<i32, i64> = HashMap::new();
    for line in &payload.items {
        *requested.entry(line.product_id).or_insert(0) += i64::from(line.quantity);
    }
    adjusted |= cart
        .lines()
        .iter()
        .any(|line| requested.get(&line.product_id) != Some(&i64::from(line.quantity)));

    Ok(Json(CartQuoteResponse {
        totals: cart.compute_totals(),
        single_seller: cart.is_single_seller(),
        items: cart.lines().to_vec(),
        adjusted,
    }))
}
