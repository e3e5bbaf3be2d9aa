use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::CheckoutLine;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: i32,
    pub name: String,
    pub quantity: i32,
    /// Unit price captured when the line was added.
    pub price: Decimal,
    /// Stock as known at the last catalog fetch.
    pub stock: i32,
    pub seller_id: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct CartQuoteRequest {
    #[serde(default)]
    pub items: Vec<CheckoutLine>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartQuoteResponse {
    pub items: Vec<CartLine>,
    #[serde(flatten)]
    pub totals: CartTotals,
    pub single_seller: bool,
    pub adjusted: bool,
}
