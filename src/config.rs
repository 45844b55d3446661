use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::Decimal;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    /// Base URL of the bot status API (live telemetry feed).
    pub telemetry_api_url: String,
    /// Delivery webhook for rendered statements.
    pub notify_webhook_url: String,
    /// Profit share applied to clients created without an explicit one.
    pub default_profit_share: Decimal,
    /// Telemetry younger than this is "fresh".
    pub staleness_fresh_ms: i64,
    /// Telemetry younger than this (but not fresh) is "delayed"; older is "stale".
    pub staleness_delayed_ms: i64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let telemetry_api_url = env_map
            .get("TELEMETRY_API_URL")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("TELEMETRY_API_URL".to_string()))?;

        let notify_webhook_url = env_map
            .get("NOTIFY_WEBHOOK_URL")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("NOTIFY_WEBHOOK_URL".to_string()))?;

        let default_profit_share_str = env_map
            .get("DEFAULT_PROFIT_SHARE")
            .map(|s| s.as_str())
            .unwrap_or("0.5");
        let default_profit_share =
            Decimal::from_str(default_profit_share_str).map_err(|_| {
                ConfigError::InvalidValue(
                    "DEFAULT_PROFIT_SHARE".to_string(),
                    "must be a decimal".to_string(),
                )
            })?;
        if default_profit_share.is_negative() || default_profit_share > Decimal::from_int(1) {
            return Err(ConfigError::InvalidValue(
                "DEFAULT_PROFIT_SHARE".to_string(),
                "must be between 0 and 1".to_string(),
            ));
        }

        let staleness_fresh_ms = parse_i64(&env_map, "STALENESS_FRESH_MS", "300000")?;
        let staleness_delayed_ms = parse_i64(&env_map, "STALENESS_DELAYED_MS", "480000")?;
        if staleness_delayed_ms < staleness_fresh_ms {
            return Err(ConfigError::InvalidValue(
                "STALENESS_DELAYED_MS".to_string(),
                "must be >= STALENESS_FRESH_MS".to_string(),
            ));
        }

        Ok(Config {
            port,
            database_path,
            telemetry_api_url,
            notify_webhook_url,
            default_profit_share,
            staleness_fresh_ms,
            staleness_delayed_ms,
        })
    }
}

fn parse_i64(
    env_map: &HashMap<String, String>,
    key: &str,
    default: &str,
) -> Result<i64, ConfigError> {
    env_map
        .get(key)
        .map(|s| s.as_str())
        .unwrap_or(default)
        .parse::<i64>()
        .map_err(|_| ConfigError::InvalidValue(key.to_string(), "must be a valid i64".to_string()))
}
