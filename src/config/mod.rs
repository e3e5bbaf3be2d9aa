mod app_config;

pub use app_config::{
    AppConfig, AuthConfig, CheckoutConfig, CorsConfig, DEFAULT_DELIVERY_FEE, DatabaseConfig,
    ServerConfig,
};
