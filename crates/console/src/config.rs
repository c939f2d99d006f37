//! Console configuration resolved from the deployment environment.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

pub const API_URL_VAR: &str = "TENANTDESK_API_URL";
pub const TOKEN_PATH_VAR: &str = "TENANTDESK_TOKEN_PATH";
pub const HTTP_TIMEOUT_VAR: &str = "TENANTDESK_HTTP_TIMEOUT_SECS";
pub const LOG_FILTER_VAR: &str = "TENANTDESK_LOG";

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Base URL of the REST API (no trailing slash).
    pub api_url: String,
    /// Explicit token file location; `None` means the per-user data directory.
    pub token_path: Option<PathBuf>,
    pub http_timeout: Duration,
    /// Login entry point that unauthenticated navigation is sent to.
    pub login_path: String,
    /// Landing page after login when no location was recorded.
    pub home_path: String,
    /// Tracing filter used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// `VAR=value` pairs that were present but ignored as invalid.
    ///
    /// Configuration is read before logging starts; callers report these once
    /// the subscriber is installed.
    pub rejected: Vec<String>,
}

impl ConsoleConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: normalize_base_url(api_url.into()),
            token_path: None,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            login_path: "/login".to_string(),
            home_path: "/dashboard".to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            rejected: Vec::new(),
        }
    }

    /// Resolve configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup(API_URL_VAR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let mut config = Self::new(api_url);
        config.token_path = lookup(TOKEN_PATH_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        if let Some(raw) = lookup(HTTP_TIMEOUT_VAR) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.http_timeout = Duration::from_secs(secs),
                _ => config.rejected.push(format!("{HTTP_TIMEOUT_VAR}={raw}")),
            }
        }

        if let Some(filter) = lookup(LOG_FILTER_VAR).filter(|v| !v.trim().is_empty()) {
            config.log_filter = filter.trim().to_string();
        }

        config
    }

    /// Where the session token is persisted.
    pub fn token_path(&self) -> anyhow::Result<PathBuf> {
        if let Some(path) = &self.token_path {
            return Ok(path.clone());
        }

        let base = dirs::data_dir()
            .or_else(|| {
                dirs::home_dir().map(|mut h| {
                    h.push(".local");
                    h.push("share");
                    h
                })
            })
            .context("failed to resolve OS app data directory - tried data_dir() and home_dir()/.local/share")?;

        let mut path = base;
        path.push("tenantdesk");
        path.push("token.json");
        Ok(path)
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

fn normalize_base_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}
