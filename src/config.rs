use std::env;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Expected `aud` claim; `None` skips the audience check.
    pub jwt_audience: Option<String>,
    pub server_host: String,
    pub server_port: u16,
    /// Maximum POST attempts per user per window. 0 disables throttling.
    pub submission_rate_limit: u32,
    pub submission_rate_window: Duration,
    pub run_migrations: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_audience: match env::var("JWT_AUDIENCE") {
                Ok(aud) if aud.is_empty() => None,
                Ok(aud) => Some(aud),
                Err(_) => Some("authenticated".to_string()),
            },
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: parsed("SERVER_PORT", 8080)?,
            submission_rate_limit: parsed("SUBMISSION_RATE_LIMIT", 0)?,
            submission_rate_window: Duration::from_secs(parsed(
                "SUBMISSION_RATE_WINDOW_SECS",
                15 * 60,
            )?),
            run_migrations: parsed("RUN_MIGRATIONS", false)?,
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn parsed<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value.trim().parse().map_err(|_| {
            tracing::warn!("Invalid {} value: {}", key, value);
            ConfigError::Invalid { key, value }
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_addr() {
        let config = Config {
            database_url: "postgres://localhost/market".to_string(),
            jwt_secret: "secret".to_string(),
            jwt_audience: None,
            server_host: "127.0.0.1".to_string(),
            server_port: 9000,
            submission_rate_limit: 0,
            submission_rate_window: Duration::from_secs(900),
            run_migrations: false,
        };
        assert_eq!(config.server_addr(), "127.0.0.1:9000");
    }

    #[test]
    fn test_parsed_falls_back_to_default() {
        let port: u16 = parsed("FOOD_MARKET_TEST_UNSET_PORT", 8080).unwrap();
        assert_eq!(port, 8080);
    }
}
