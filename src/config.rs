//! Configuration management

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::time::Duration;

/// Process-wide settings
#[derive(Debug, Clone)]
pub struct Config {
    /// Upper bound on a single resource fetch
    pub fetch_timeout: Duration,

    /// Resources polled at once by one fetcher
    pub max_concurrent_fetches: usize,

    /// Upper bound on one skill execution
    pub execution_timeout: Duration,

    /// Cache successful resource fetches
    pub cache_enabled: bool,

    /// Cache TTL in seconds
    pub cache_ttl_secs: u64,

    /// Cache capacity in entries
    pub cache_max_entries: u64,

    /// Locator scheme → HTTP base URL (e.g. `news` → `https://host/feeds`)
    pub scheme_endpoints: HashMap<String, String>,

    /// User-Agent for outbound HTTP
    pub user_agent: String,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Emit JSON logs on stderr
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_millis(10_000),
            max_concurrent_fetches: 8,
            execution_timeout: Duration::from_secs(60),
            cache_enabled: true,
            cache_ttl_secs: 300,
            cache_max_entries: 1000,
            scheme_endpoints: HashMap::new(),
            user_agent: format!("skill-contract/{}", env!("CARGO_PKG_VERSION")),
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env`, if present)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let fetch_timeout = lookup("SKILL_FETCH_TIMEOUT_MS")
            .map(|v| v.parse::<u64>().context("SKILL_FETCH_TIMEOUT_MS must be an integer"))
            .transpose()?
            .map(Duration::from_millis)
            .unwrap_or(defaults.fetch_timeout);

        let max_concurrent_fetches = lookup("SKILL_MAX_CONCURRENT_FETCHES")
            .map(|v| v.parse::<usize>().context("SKILL_MAX_CONCURRENT_FETCHES must be an integer"))
            .transpose()?
            .unwrap_or(defaults.max_concurrent_fetches)
            .max(1);

        let execution_timeout = lookup("SKILL_EXECUTION_TIMEOUT_SECS")
            .map(|v| v.parse::<u64>().context("SKILL_EXECUTION_TIMEOUT_SECS must be an integer"))
            .transpose()?
            .map(Duration::from_secs)
            .unwrap_or(defaults.execution_timeout);

        let cache_enabled = lookup("SKILL_CACHE_ENABLED")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(defaults.cache_enabled);

        let cache_ttl_secs = lookup("SKILL_CACHE_TTL")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.cache_ttl_secs);

        let cache_max_entries = lookup("SKILL_CACHE_MAX_ENTRIES")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.cache_max_entries);

        let scheme_endpoints = match lookup("TREND_SCHEME_ENDPOINTS") {
            Some(raw) => parse_endpoints(&raw)?,
            None => HashMap::new(),
        };

        let user_agent = lookup("SKILL_HTTP_USER_AGENT").unwrap_or(defaults.user_agent);

        let log_level = lookup("RUST_LOG").unwrap_or(defaults.log_level);

        let log_json = lookup("SKILL_LOG_JSON")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(defaults.log_json);

        Ok(Self {
            fetch_timeout,
            max_concurrent_fetches,
            execution_timeout,
            cache_enabled,
            cache_ttl_secs,
            cache_max_entries,
            scheme_endpoints,
            user_agent,
            log_level,
            log_json,
        })
    }
}

/// Parse `scheme=url,scheme=url`
fn parse_endpoints(raw: &str) -> Result<HashMap<String, String>> {
    let mut endpoints = HashMap::new();

    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (scheme, url) = entry
            .split_once('=')
            .with_context(|| format!("TREND_SCHEME_ENDPOINTS entry '{}' is not scheme=url", entry))?;

        let scheme = scheme.trim().to_lowercase();
        let url = url.trim();
        if scheme.is_empty() || !(url.starts_with("http://") || url.starts_with("https://")) {
            anyhow::bail!("TREND_SCHEME_ENDPOINTS entry '{}' is not scheme=http(s)://...", entry);
        }
        endpoints.insert(scheme, url.to_string());
    }

    Ok(endpoints)
}
