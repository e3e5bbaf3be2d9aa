mod common;

use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::json;

use common::{CUSTOMER_ID, TestApp, customer_token, decimal};

#[tokio::test]
async fn quote_prices_lines_from_the_catalog() {
    let app = TestApp::new()
        .with_product(7, 10000, 5)
        .with_product(8, 2500, 10);

    let (status, body) = app
        .request(
            "POST",
            "/cart/quote",
            Some(&customer_token(CUSTOMER_ID)),
            Some(json!({
                "items": [
                    { "productId": 7, "quantity": 1, "price": "10000" },
                    { "productId": 8, "quantity": 2 }
                ]
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["adjusted"], false);
    assert_eq!(body["singleSeller"], true);
    assert_eq!(decimal(&body["subtotal"]), Decimal::from(15000));
    assert_eq!(decimal(&body["deliveryFee"]), Decimal::from(13000));
    assert_eq!(decimal(&body["total"]), Decimal::from(28000));
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn quote_clamps_to_stock_and_drops_unknown_products() {
    let app = TestApp::new()
        .with_product(7, 10000, 5)
        .with_product(8, 2500, 10);

    let (status, body) = app
        .request(
            "POST",
            "/cart/quote",
            Some(&customer_token(CUSTOMER_ID)),
            Some(json!({
                "items": [
                    { "productId": 7, "quantity": 8 },
                    { "productId": 8, "quantity": 2 },
                    { "productId": 99, "quantity": 1 }
                ]
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["adjusted"], true);

    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["productId"], 7);
    assert_eq!(items[0]["quantity"], 5);
    assert_eq!(decimal(&body["total"]), Decimal::from(68000));

    assert_eq!(app.stock_of(7).await, 5);
}

#[tokio::test]
async fn quote_flags_stale_client_prices() {
    let app = TestApp::new().with_product(7, 12000, 5);

    let (status, body) = app
        .request(
            "POST",
            "/cart/quote",
            Some(&customer_token(CUSTOMER_ID)),
            Some(json!({ "items": [{ "productId": 7, "quantity": 1, "price": "10000" }] })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["adjusted"], true);
    assert_eq!(decimal(&body["items"][0]["price"]), Decimal::from(12000));
}

#[tokio::test]
async fn mistyped_quote_lines_are_body_errors() {
    let app = TestApp::new().with_product(7, 10000, 5);

    let (status, body) = app
        .request(
            "POST",
            "/cart/quote",
            Some(&customer_token(CUSTOMER_ID)),
            Some(json!({ "items": [{ "productId": 7, "quantity": "two" }] })),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["body"].is_string());
}
