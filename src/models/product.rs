use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i32,
    pub seller_id: i32,
    pub category_id: Option<i32>,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub is_moderated: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Only approved products can be purchased.
    pub fn is_active(&self) -> bool {
        self.is_moderated
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAvailability {
    pub id: i32,
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
    pub active: bool,
    pub seller_id: i32,
}

impl From<&Product> for ProductAvailability {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            stock: product.stock,
            active: product.is_active(),
            seller_id: product.seller_id,
        }
    }
}
