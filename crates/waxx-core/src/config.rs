//! Configuration management for the Waxx verification client.

use crate::signing::AppCredential;
use crate::{Error, Result};
use std::env;
use std::time::Duration;
use url::Url;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub credential: AppCredential,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL; endpoint names are appended after a `/`.
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl ApiConfig {
    /// Production API base URL.
    pub const DEFAULT_BASE_URL: &'static str = "https://app.unicoreus.com/supplement/front/waxx";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            max_retries: Self::DEFAULT_MAX_RETRIES,
        }
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env`, if present).
    #[allow(clippy::result_large_err)]
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    #[allow(clippy::result_large_err)]
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("WAXX_API_BASE_URL")
            .unwrap_or_else(|| ApiConfig::DEFAULT_BASE_URL.to_string());
        let parsed = Url::parse(&base_url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Config {
                message: format!("WAXX_API_BASE_URL must be http(s), got {}", base_url),
            });
        }

        let secret = lookup("WAXX_APP_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::Config {
                message: "WAXX_APP_SECRET environment variable not set".to_string(),
            })?;
        let credential = match lookup("WAXX_APP_KEY").filter(|s| !s.is_empty()) {
            Some(app_key) => AppCredential::new(secret, app_key),
            None => AppCredential::shared(secret),
        };

        Ok(Self {
            api: ApiConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                timeout: Duration::from_secs(
                    lookup("WAXX_HTTP_TIMEOUT_SECS")
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(ApiConfig::DEFAULT_TIMEOUT_SECS),
                ),
                max_retries: lookup("WAXX_MAX_RETRIES")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(ApiConfig::DEFAULT_MAX_RETRIES),
            },
            credential,
        })
    }
}
