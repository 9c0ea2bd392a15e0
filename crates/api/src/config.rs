//! Application configuration loaded from environment variables.

use std::time::Duration;

use saga::config::DEFAULT_STEP_TIMEOUT;
use saga::{SagaConfig, SagaStep, ServiceEndpoints, StepTimeouts};

/// Output format of the log layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`, `PORT` — bind address (default: `0.0.0.0:8000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT` — `pretty` or `json`
/// - `DATABASE_URL` — Postgres connection string; unset keeps orders in memory
/// - `*_SERVICE_URL` — base URLs of the five downstream services
/// - `STEP_TIMEOUT_MS` and `{INVENTORY,FRAUD,PAYMENT,SHIPPING,NOTIFICATION}_TIMEOUT_MS`
/// - `NOTIFICATION_EMAIL_DOMAIN` — recipient domain for order notifications
/// - `SAGA_JOURNAL_RETENTION` — orders whose saga journal is kept in memory
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub endpoints: ServiceEndpoints,
    pub saga: SagaConfig,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parse_ms = |key: &str| {
            lookup(key)
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
        };

        let step_timeout = parse_ms("STEP_TIMEOUT_MS").unwrap_or(DEFAULT_STEP_TIMEOUT);
        let mut timeouts = StepTimeouts::uniform(step_timeout);
        for (key, steps) in [
            (
                "INVENTORY_TIMEOUT_MS",
                &[SagaStep::InventoryCheck, SagaStep::InventoryReserve][..],
            ),
            ("FRAUD_TIMEOUT_MS", &[SagaStep::FraudCheck][..]),
            ("PAYMENT_TIMEOUT_MS", &[SagaStep::Payment][..]),
            ("SHIPPING_TIMEOUT_MS", &[SagaStep::Shipping][..]),
            ("NOTIFICATION_TIMEOUT_MS", &[SagaStep::Notification][..]),
        ] {
            if let Some(timeout) = parse_ms(key) {
                for step in steps {
                    timeouts = timeouts.with_step(*step, timeout);
                }
            }
        }

        let endpoints = ServiceEndpoints {
            inventory: lookup("INVENTORY_SERVICE_URL").unwrap_or(defaults.endpoints.inventory),
            fraud: lookup("FRAUD_SERVICE_URL").unwrap_or(defaults.endpoints.fraud),
            payment: lookup("PAYMENT_SERVICE_URL").unwrap_or(defaults.endpoints.payment),
            shipping: lookup("SHIPPING_SERVICE_URL").unwrap_or(defaults.endpoints.shipping),
            notification: lookup("NOTIFICATION_SERVICE_URL")
                .unwrap_or(defaults.endpoints.notification),
        };

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or_default(),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            endpoints,
            saga: SagaConfig {
                timeouts,
                notification_domain: lookup("NOTIFICATION_EMAIL_DOMAIN")
                    .unwrap_or(defaults.saga.notification_domain),
                journal_retention: lookup("SAGA_JOURNAL_RETENTION")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.saga.journal_retention),
            },
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            database_url: None,
            endpoints: ServiceEndpoints::default(),
            saga: SagaConfig::default(),
        }
    }
}
