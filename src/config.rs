use anyhow::Context;
use dotenvy::dotenv;
use std::env;

pub const DEFAULT_LOG_FILTER: &str = "info,order_fulfillment=debug";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub metrics_host: String,
    pub metrics_port: u16,
    pub metrics_enabled: bool,
    pub log_filter: String,
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the config from any variable source. Unset variables fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let metrics_host = lookup("METRICS_HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let metrics_port = lookup("METRICS_PORT")
            .unwrap_or_else(|| "9090".to_string())
            .parse::<u16>()
            .context("Invalid METRICS_PORT")?;

        let metrics_enabled = lookup("METRICS_ENABLED")
            .unwrap_or_else(|| "true".to_string())
            .parse::<bool>()
            .context("Invalid METRICS_ENABLED")?;

        let log_filter = lookup("LOG_FILTER").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            metrics_host,
            metrics_port,
            metrics_enabled,
            log_filter,
        })
    }
}
