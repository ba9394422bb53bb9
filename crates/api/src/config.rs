//! Application configuration loaded from environment variables.

use std::str::FromStr;

use checkout::CheckoutPolicy;
use common::{Decimal, Money};
use domain::PricingPolicy;
use thiserror::Error;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("expected pretty or json, got {other}")),
        }
    }
}

/// A variable was set but could not be parsed.
#[derive(Debug, Error)]
#[error("invalid value for {key}: {message}")]
pub struct ConfigError {
    pub key: &'static str,
    pub message: String,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`, `PORT`: bind address (default `0.0.0.0:3000`)
/// - `RUST_LOG`: tracing filter directive (default `info`)
/// - `LOG_FORMAT`: `pretty` or `json` (default `pretty`)
/// - `DATABASE_URL`: PostgreSQL URL; the in-memory store is used when unset
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default `5`)
/// - `COD_SHIPPING_FEE`: cash-on-delivery fee (default `15000`)
/// - `TAX_RATE`: tax rate applied to the subtotal (default `0.10`)
/// - `DELIVERY_DAYS`: days until the estimated delivery (default `7`)
/// - `STRICT_STATUS_TRANSITIONS`: enforce the status table (default `false`)
/// - `ADMIN_TOKEN`: provisions an admin user owning this bearer token
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub cod_shipping_fee: Money,
    pub tax_rate: Decimal,
    pub delivery_days: i64,
    pub strict_status_transitions: bool,
    pub admin_token: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let text = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            host: text("HOST").unwrap_or(defaults.host),
            port: parse(&lookup, "PORT", defaults.port)?,
            log_level: text("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: parse(&lookup, "LOG_FORMAT", defaults.log_format)?,
            database_url: text("DATABASE_URL"),
            database_max_connections: parse(
                &lookup,
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            )?,
            cod_shipping_fee: Money::new(parse(
                &lookup,
                "COD_SHIPPING_FEE",
                defaults.cod_shipping_fee.amount(),
            )?),
            tax_rate: parse(&lookup, "TAX_RATE", defaults.tax_rate)?,
            delivery_days: parse(&lookup, "DELIVERY_DAYS", defaults.delivery_days)?,
            strict_status_transitions: parse(
                &lookup,
                "STRICT_STATUS_TRANSITIONS",
                defaults.strict_status_transitions,
            )?,
            admin_token: text("ADMIN_TOKEN"),
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn checkout_policy(&self) -> CheckoutPolicy {
        CheckoutPolicy {
            pricing: PricingPolicy {
                cod_shipping_fee: self.cod_shipping_fee,
                tax_rate: self.tax_rate,
                delivery_days: self.delivery_days,
            },
            strict_status_transitions: self.strict_status_transitions,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let pricing = PricingPolicy::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            database_url: None,
            database_max_connections: 5,
            cod_shipping_fee: pricing.cod_shipping_fee,
            tax_rate: pricing.tax_rate,
            delivery_days: pricing.delivery_days,
            strict_status_transitions: false,
            admin_token: None,
        }
    }
}

impl From<&Config> for CheckoutPolicy {
    fn from(config: &Config) -> Self {
        config.checkout_policy()
    }
}

fn parse<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => {
            value.trim().parse().map_err(|e: T::Err| ConfigError {
                key,
                message: e.to_string(),
            })
        }
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.database_url.is_none());
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.cod_shipping_fee, Money::from_major(15000));
        assert_eq!(config.tax_rate, Decimal::new(10, 2));
        assert!(!config.strict_status_transitions);
        assert!(config.admin_token.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("LOG_FORMAT", "JSON"),
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("TAX_RATE", "0.2"),
            ("COD_SHIPPING_FEE", "9.5"),
            ("STRICT_STATUS_TRANSITIONS", "true"),
            ("ADMIN_TOKEN", "secret"),
        ])
        .unwrap();

        assert_eq!(config.addr(), "127.0.0.1:8080");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/shop")
        );
        assert_eq!(config.admin_token.as_deref(), Some("secret"));

        let policy = CheckoutPolicy::from(&config);
        assert!(policy.strict_status_transitions);
        assert_eq!(policy.pricing.tax_rate, Decimal::new(2, 1));
        assert_eq!(policy.pricing.cod_shipping_fee, Money::new(Decimal::new(95, 1)));
    }

    #[test]
    fn test_blank_values_fall_back() {
        let config = from_pairs(&[("PORT", " "), ("DATABASE_URL", "")]).unwrap();
        assert_eq!(config.port, 3000);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_invalid_value_names_key() {
        let err = from_pairs(&[("PORT", "eighty")]).unwrap_err();
        assert_eq!(err.key, "PORT");
        assert!(err.to_string().starts_with("invalid value for PORT"));
    }

    #[test]
    fn test_addr_default() {
        assert_eq!(Config::default().addr(), "0.0.0.0:3000");
    }
}
