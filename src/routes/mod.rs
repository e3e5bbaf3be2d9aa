mod admin;
mod cart;
mod checkout;
mod health;
mod notifications;
mod orders;
mod products;

use axum::{
    Router, middleware,
    routing::{delete, get, patch, post},
};

use crate::{
    AppState,
    middleware::{admin_middleware, auth_middleware},
};

pub fn create_router(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/products/{id}", get(products::get_availability));

    let customer = Router::new()
        .route("/checkout", post(checkout::submit_checkout))
        .route("/cart/quote", post(cart::quote_cart))
        .route("/orders", get(orders::get_orders))
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .route("/notifications/{id}/read", post(notifications::mark_read))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin = Router::new()
        .route("/admin/orders", get(admin::search_orders))
        .route("/admin/orders/{id}/status", patch(admin::update_order_status))
        .route("/admin/orders/{id}", delete(admin::delete_order))
        .route_layer(middleware::from_fn_with_state(state.clone(), admin_middleware));

    public.merge(customer).merge(admin)
}
