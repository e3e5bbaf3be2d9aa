use std::{env, str::FromStr};

use rust_decimal::Decimal;

use crate::error::{AppError, Result};

pub const DEFAULT_DELIVERY_FEE: i64 = 13000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub auth: AuthConfig,
    pub checkout: CheckoutConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_size: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    pub delivery_fee: Decimal,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| AppError::ConfigError(format!("{} is not set", key)))
        };
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let delivery_fee = match lookup("DELIVERY_FEE") {
            Some(raw) => parse_value::<Decimal>("DELIVERY_FEE", &raw)?,
            None => Decimal::from(DEFAULT_DELIVERY_FEE),
        };
        if delivery_fee.is_sign_negative() {
            return Err(AppError::ConfigError(
                "DELIVERY_FEE must not be negative".to_string(),
            ));
        }

        let jwt_secret = required("JWT_SECRET")?;
        if jwt_secret.is_empty() {
            return Err(AppError::ConfigError("JWT_SECRET must not be empty".to_string()));
        }

        Ok(Self {
            server: ServerConfig {
                host: or_default("HOST", "0.0.0.0"),
                port: parse_value("PORT", &or_default("PORT", "3000"))?,
                max_body_size: parse_value("MAX_BODY_SIZE", &or_default("MAX_BODY_SIZE", "1048576"))?,
            },
            database: DatabaseConfig {
                url: required("DB_URL")?,
                max_connections: parse_value(
                    "DB_MAX_CONNECTIONS",
                    &or_default("DB_MAX_CONNECTIONS", "20"),
                )?,
            },
            cors: CorsConfig {
                allowed_origins: required("FRONTEND_URL")?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            auth: AuthConfig { jwt_secret },
            checkout: CheckoutConfig { delivery_fee },
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::ConfigError(format!("Invalid {} value", key)))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("DB_URL", "postgres://localhost/tanimart"),
        ("FRONTEND_URL", "http://localhost:5173, https://tanimart.id"),
        ("JWT_SECRET", "secret"),
    ];

    #[test]
    fn defaults_apply_when_optional_vars_missing() {
        let config = AppConfig::from_lookup(lookup_from(&REQUIRED)).unwrap();

        assert_eq!(config.server_address(), "0.0.0.0:3000");
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.checkout.delivery_fee, Decimal::from(13000));
        assert_eq!(
            config.cors.allowed_origins,
            vec!["http://localhost:5173", "https://tanimart.id"]
        );
    }

    #[test]
    fn missing_database_url_is_a_config_error() {
        let err = AppConfig::from_lookup(lookup_from(&REQUIRED[1..])).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(msg) if msg.contains("DB_URL")));
    }

    #[test]
    fn invalid_port_is_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PORT", "http"));
        let err = AppConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(msg) if msg.contains("PORT")));
    }

    #[test]
    fn delivery_fee_is_configurable_but_not_negative() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("DELIVERY_FEE", "15000.50"));
        let config = AppConfig::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.checkout.delivery_fee, Decimal::new(1500050, 2));

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("DELIVERY_FEE", "-1"));
        assert!(AppConfig::from_lookup(lookup_from(&pairs)).is_err());
    }
}
