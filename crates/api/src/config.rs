//! Application configuration loaded from environment variables.

use std::time::Duration;

use thiserror::Error;

/// Raised when a required environment variable is absent at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),
}

/// Server configuration with provider credentials and sensible defaults.
///
/// Required environment variables (startup fails without them):
/// - `STRIPE_PRIVATE_KEY` — payment provider credential
/// - `RESEND_API_KEY` — mail provider credential
/// - `RESEND_FROM_EMAIL` — sender address for abandonment reminders
/// - `TEST_EMAIL` — fallback recipient when a cart has no usable email
///
/// Optional, with defaults:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `ABANDONED_CART_TIMEOUT_SECS` — inactivity window (default: `600`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub abandonment_window: Duration,
    pub stripe_private_key: String,
    pub resend_api_key: String,
    pub from_email: String,
    pub fallback_email: String,
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnv(name))
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// Missing provider credentials are fatal; everything else falls back
    /// to a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            abandonment_window: Duration::from_secs(
                std::env::var("ABANDONED_CART_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
            stripe_private_key: required("STRIPE_PRIVATE_KEY")?,
            resend_api_key: required("RESEND_API_KEY")?,
            from_email: required("RESEND_FROM_EMAIL")?,
            fallback_email: required("TEST_EMAIL")?,
        })
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
            port: 3000,
            log_level: "info".to_string(),
            abandonment_window: Duration::from_secs(600),
            stripe_private_key: String::new(),
            resend_api_key: String::new(),
            from_email: "shop@example.com".to_string(),
            fallback_email: "test@example.com".to_string(),
        }
    }
}
