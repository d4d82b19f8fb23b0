use anyhow::{bail, Context, Result};
use config::{Config, Environment, Source};
use serde::Deserialize;
use std::time::Duration;

use crate::autocomplete::LookupConfig;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub api_base_url: String,
    pub nominatim_url: String,
    pub user_agent: String,
    pub settle_delay_ms: u64,
    pub result_limit: usize,
    pub min_query_chars: usize,
    pub request_timeout_secs: u64,
}

impl AppConfig {
    /// Defaults overlaid with `EVENTS_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_source(Environment::with_prefix("EVENTS").try_parsing(true))
    }

    pub fn from_source<S>(source: S) -> Result<Self>
    where
        S: Source + Send + Sync + 'static,
    {
        let settings = Config::builder()
            .set_default("api_base_url", DEFAULT_API_BASE_URL)?
            .set_default("nominatim_url", DEFAULT_NOMINATIM_URL)?
            .set_default(
                "user_agent",
                concat!("events-client/", env!("CARGO_PKG_VERSION")),
            )?
            .set_default("settle_delay_ms", 300_i64)?
            .set_default("result_limit", 5_i64)?
            .set_default("min_query_chars", 1_i64)?
            .set_default("request_timeout_secs", 10_i64)?
            .add_source(source)
            .build()
            .context("Failed to load configuration")?;

        let mut config: AppConfig = settings
            .try_deserialize()
            .context("Configuration has invalid values")?;
        config.api_base_url = normalize_url("api_base_url", &config.api_base_url)?;
        config.nominatim_url = normalize_url("nominatim_url", &config.nominatim_url)?;

        if config.result_limit == 0 {
            bail!("result_limit must be at least 1");
        }
        if config.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be at least 1");
        }

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn lookup(&self) -> LookupConfig {
        LookupConfig {
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            min_query_chars: self.min_query_chars.max(1),
        }
    }
}

/// Strips trailing slashes so endpoint paths can be appended with `format!`.
pub fn normalize_url(key: &str, raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        bail!("{} must be an http(s) URL, got {:?}", key, raw);
    }
    Ok(trimmed.to_string())
}
