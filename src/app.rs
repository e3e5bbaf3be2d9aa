use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
};
use rust_decimal::Decimal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::AppConfig,
    database,
    error::{AppError, Result},
    routes,
    store::{MarketStore, PgStore},
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MarketStore>,
    pub jwt_secret: Arc<str>,
    pub delivery_fee: Decimal,
}

impl AppState {
    pub fn new(store: Arc<dyn MarketStore>, jwt_secret: &str, delivery_fee: Decimal) -> Self {
        Self {
            store,
            jwt_secret: Arc::from(jwt_secret),
            delivery_fee,
        }
    }
}

/// Routes plus the layers every deployment gets.
pub fn router(state: AppState, max_body_size: usize) -> Router {
    routes::create_router(&state)
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn build(config: &AppConfig) -> Result<Router> {
    let pool = database::create_pool(&config.database).await?;
    let state = AppState::new(
        Arc::new(PgStore::new(pool)),
        &config.auth.jwt_secret,
        config.checkout.delivery_fee,
    );

    let allowed_origins: Vec<HeaderValue> = config
        .cors
        .allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|_| AppError::ConfigError(format!("Invalid CORS origin: {}", origin)))
        })
        .collect::<Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            http::header::CONTENT_TYPE,
            http::header::AUTHORIZATION,
            http::HeaderName::from_static("idempotency-key"),
        ])
        .allow_origin(allowed_origins);

    Ok(router(state, config.server.max_body_size).layer(cors))
}
