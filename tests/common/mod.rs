#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tanimart::{
    app::{self, AppState},
    models::{Product, UserRole},
    store::MemoryStore,
    utils::jwt,
};
use tower::ServiceExt;

pub const SECRET: &str = "test-secret";
pub const DELIVERY_FEE: i64 = 13000;

pub const ADMIN_ID: i32 = 1;
pub const SELLER_ID: i32 = 2;
pub const CUSTOMER_ID: i32 = 3;
pub const OTHER_CUSTOMER_ID: i32 = 4;

#[derive(Clone)]
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        store.insert_user(ADMIN_ID, "Admin Tani").unwrap();
        store.insert_user(SELLER_ID, "Pak Tani").unwrap();
        store.insert_user(CUSTOMER_ID, "Budi Santoso").unwrap();
        store.insert_user(OTHER_CUSTOMER_ID, "Siti Aminah").unwrap();

        let state = AppState::new(store.clone(), SECRET, Decimal::from(DELIVERY_FEE));
        let router = app::router(state, 1024 * 1024);

        Self { router, store }
    }

    pub fn with_product(self, id: i32, price: i64, stock: i32) -> Self {
        self.store.insert_product(product(id, price, stock)).unwrap();
        self
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.request_with_headers(method, uri, token, &[], body).await
    }

    pub async fn request_with_headers(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        headers: &[(&str, &str)],
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, value)
    }

    pub async fn checkout(&self, customer_id: i32, body: Value) -> (StatusCode, Value) {
        let token = customer_token(customer_id);
        self.request("POST", "/checkout", Some(&token), Some(body)).await
    }

    pub async fn stock_of(&self, product_id: i32) -> i32 {
        let (status, body) = self
            .request("GET", &format!("/products/{}", product_id), None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        body["stock"].as_i64().unwrap() as i32
    }

    pub async fn orders_of(&self, customer_id: i32) -> Vec<Value> {
        let token = customer_token(customer_id);
        let (status, body) = self.request("GET", "/orders", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        body.as_array().unwrap().clone()
    }

    pub async fn notifications_of(&self, user_id: i32) -> Vec<Value> {
        let token = customer_token(user_id);
        let (status, body) = self
            .request("GET", "/notifications?limit=50", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        body.as_array().unwrap().clone()
    }
}

pub fn product(id: i32, price: i64, stock: i32) -> Product {
    Product {
        id,
        seller_id: SELLER_ID,
        category_id: None,
        name: format!("Gabah {}", id),
        description: None,
        price: Decimal::from(price),
        stock,
        is_moderated: true,
        created_at: Utc::now(),
    }
}

pub fn token(user_id: i32, role: UserRole) -> String {
    jwt::generate_token(user_id, &format!("user{}@tanimart.test", user_id), role, SECRET).unwrap()
}

pub fn customer_token(user_id: i32) -> String {
    token(user_id, UserRole::Customer)
}

pub fn admin_token() -> String {
    token(ADMIN_ID, UserRole::Admin)
}

pub fn checkout_body(address: &str, items: &[(i32, i32)]) -> Value {
    let items: Vec<Value> = items
        .iter()
        .map(|(product_id, quantity)| json!({ "productId": product_id, "quantity": quantity }))
        .collect();
    json!({ "address": address, "items": items })
}

pub fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().unwrap(),
        Value::Number(n) => n.to_string().parse().unwrap(),
        other => panic!("not a decimal: {other}"),
    }
}
