//! Client configuration.
//!
//! # Design
//! Everything here is fixed at construction and read-only afterwards, so a
//! `TopClient` can be shared between threads without locking. The UTC offset
//! used when stamping `timestamp` is part of the configuration rather than a
//! process-wide constant; it defaults to China Standard Time (UTC+8, no DST).

use std::fmt;
use std::time::Duration;

use chrono::FixedOffset;
use serde::Deserialize;
use tracing::info;
use url::Url;

use crate::error::ApiError;

/// Endpoint for single calls.
pub const DEFAULT_API_URL: &str = "https://eco.taobao.com/router/rest";
/// Endpoint for batch calls.
pub const DEFAULT_BATCH_URL: &str = "https://eco.taobao.com/router/batch";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
/// UTC+8.
pub const DEFAULT_UTC_OFFSET_SECS: i32 = 8 * 3600;

const MAX_UTC_OFFSET_SECS: u32 = 24 * 3600;

#[derive(Clone, Deserialize)]
pub struct ClientConfig {
    pub app_key: String,
    pub app_secret: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_batch_url")]
    pub batch_url: String,
    #[serde(default)]
    pub session: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_utc_offset_secs")]
    pub utc_offset_secs: i32,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_batch_url() -> String {
    DEFAULT_BATCH_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_utc_offset_secs() -> i32 {
    DEFAULT_UTC_OFFSET_SECS
}

impl ClientConfig {
    /// Create a configuration with default endpoints. Key and secret must be
    /// non-empty.
    pub fn new(app_key: &str, app_secret: &str) -> Result<Self, ApiError> {
        let config = Self {
            app_key: app_key.to_string(),
            app_secret: app_secret.to_string(),
            api_url: default_api_url(),
            batch_url: default_batch_url(),
            session: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            utc_offset_secs: DEFAULT_UTC_OFFSET_SECS,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from `TOP_APP_KEY`, `TOP_APP_SECRET` and the optional
    /// `TOP_API_URL`, `TOP_BATCH_URL`, `TOP_SESSION`, `TOP_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app_key = lookup("TOP_APP_KEY").ok_or_else(|| ApiError::Config("TOP_APP_KEY not set".to_string()))?;
        let app_secret =
            lookup("TOP_APP_SECRET").ok_or_else(|| ApiError::Config("TOP_APP_SECRET not set".to_string()))?;
        let mut config = Self::new(&app_key, &app_secret)?;
        if let Some(url) = lookup("TOP_API_URL") {
            config.api_url = url;
        }
        if let Some(url) = lookup("TOP_BATCH_URL") {
            config.batch_url = url;
        }
        config.session = lookup("TOP_SESSION").filter(|s| !s.is_empty());
        if let Some(raw) = lookup("TOP_TIMEOUT_SECS") {
            let secs: u64 = raw
                .parse()
                .map_err(|_| ApiError::Config(format!("TOP_TIMEOUT_SECS is not a number: {raw}")))?;
            config.timeout_ms = secs.saturating_mul(1000);
        }
        config.validate()?;
        info!(api_url = %config.api_url, batch_url = %config.batch_url, "client configuration loaded");
        Ok(config)
    }

    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = url.to_string();
        self
    }

    pub fn with_batch_url(mut self, url: &str) -> Self {
        self.batch_url = url.to_string();
        self
    }

    /// Set the user session token. An empty token means no session.
    pub fn with_session(mut self, session: &str) -> Self {
        self.session = Some(session.to_string()).filter(|s| !s.is_empty());
        self
    }

    /// Per-call deadline, kept at millisecond precision.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_utc_offset_secs(mut self, secs: i32) -> Self {
        self.utc_offset_secs = secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn utc_offset(&self) -> Result<FixedOffset, ApiError> {
        FixedOffset::east_opt(self.utc_offset_secs)
            .ok_or_else(|| ApiError::Config(format!("UTC offset out of range: {}s", self.utc_offset_secs)))
    }

    /// The session token, if one is configured and non-empty.
    pub fn session(&self) -> Option<&str> {
        self.session.as_deref().filter(|s| !s.is_empty())
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.app_key.is_empty() {
            return Err(ApiError::Config("app key cannot be empty".to_string()));
        }
        if self.app_secret.is_empty() {
            return Err(ApiError::Config("app secret cannot be empty".to_string()));
        }
        for (name, value) in [("api_url", &self.api_url), ("batch_url", &self.batch_url)] {
            Url::parse(value).map_err(|e| ApiError::Config(format!("{name} {value:?} is invalid: {e}")))?;
        }
        if self.timeout_ms == 0 {
            return Err(ApiError::Config("timeout must be at least one millisecond".to_string()));
        }
        if self.utc_offset_secs.unsigned_abs() >= MAX_UTC_OFFSET_SECS {
            return Err(ApiError::Config(format!(
                "UTC offset out of range: {}s",
                self.utc_offset_secs
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("app_key", &self.app_key)
            .field("app_secret", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("batch_url", &self.batch_url)
            .field("session", &self.session.as_ref().map(|_| "<redacted>"))
            .field("timeout_ms", &self.timeout_ms)
            .field("utc_offset_secs", &self.utc_offset_secs)
            .finish()
    }
}
