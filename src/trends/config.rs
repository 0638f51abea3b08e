//! Trend Fetch Configuration

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use super::fetcher::FetchError;
use crate::skills::payload::TaskPayload;

/// `scheme://rest`, no whitespace
static LOCATOR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://\S+$").expect("locator pattern is valid")
});

/// What to poll and how picky to be
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendFetchConfig {
    /// Agent the alerts are emitted for
    pub agent_id: String,
    /// Resource locators to poll
    pub resource_uris: Vec<String>,
    /// Signals below this strength are discarded
    pub relevance_threshold: f64,
    /// Per-resource timeout override in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl TrendFetchConfig {
    pub fn new(agent_id: &str, resource_uris: &[&str], relevance_threshold: f64) -> Self {
        Self {
            agent_id: agent_id.to_string(),
            resource_uris: resource_uris.iter().map(|u| u.to_string()).collect(),
            relevance_threshold,
            timeout_ms: None,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Build from a `fetch_trends` task payload
    pub fn from_payload(task: &TaskPayload) -> Result<Self, FetchError> {
        let resource_uris: Vec<String> = task
            .context_value("resource_uris")
            .ok_or_else(|| FetchError::InvalidConfig("context.resource_uris is missing".to_string()))?;
        let relevance_threshold: f64 = task.context_value("relevance_threshold").ok_or_else(|| {
            FetchError::InvalidConfig("context.relevance_threshold is missing".to_string())
        })?;

        let config = Self {
            agent_id: task.agent_id.clone(),
            resource_uris,
            relevance_threshold,
            timeout_ms: task.context_value("timeout_ms"),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML or JSON file
    pub async fn from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let config: Self = match path.extension().and_then(|e| e.to_str()).unwrap_or("") {
            "json" => serde_json::from_str(&content).context("Failed to parse JSON")?,
            "toml" => toml::from_str(&content).context("Failed to parse TOML")?,
            _ => toml::from_str(&content)
                .or_else(|_| serde_json::from_str(&content))
                .context("Failed to parse trend fetch configuration")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check the batch as a whole. Individual locators are not inspected here;
    /// a malformed one fails on its own during the fetch.
    pub fn validate(&self) -> Result<(), FetchError> {
        if self.agent_id.is_empty() {
            return Err(FetchError::InvalidConfig("agent_id is empty".to_string()));
        }
        if !(0.0..=1.0).contains(&self.relevance_threshold) {
            return Err(FetchError::InvalidConfig(format!(
                "relevance_threshold {} is outside [0, 1]",
                self.relevance_threshold
            )));
        }
        if self.resource_uris.is_empty() {
            return Err(FetchError::InvalidConfig("resource_uris is empty".to_string()));
        }
        if self.timeout_ms == Some(0) {
            return Err(FetchError::InvalidConfig("timeout_ms must be positive".to_string()));
        }
        Ok(())
    }

    /// `scheme://rest` with no whitespace
    pub fn is_locator(uri: &str) -> bool {
        LOCATOR_PATTERN.is_match(uri)
    }

    /// Resource URIs with duplicates removed, first occurrence order kept
    pub fn unique_uris(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.resource_uris
            .iter()
            .filter(|u| seen.insert(u.as_str()))
            .cloned()
            .collect()
    }
}
