//! HTTP Resource Source
//!
//! Resolves locators over HTTP with reqwest. `http://` and `https://`
//! locators are fetched as-is; other schemes go through a scheme → base URL
//! table, so `news://tech/ai` with `news = https://host/feeds` becomes
//! `https://host/feeds/tech/ai`.
//!
//! The response body is JSON, either `{"signals": [...]}` or a bare array of
//! `{"signal_strength": f64, "topic"?: str, "summary"?: str}`.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

use super::source::{RawSignal, ResourceError, ResourceSource};
use crate::config::Config;

#[derive(Deserialize)]
#[serde(untagged)]
enum SignalBody {
    Wrapped { signals: Vec<RawSignal> },
    Bare(Vec<RawSignal>),
}

impl SignalBody {
    fn into_signals(self) -> Vec<RawSignal> {
        match self {
            Self::Wrapped { signals } => signals,
            Self::Bare(signals) => signals,
        }
    }
}

/// reqwest-backed [`ResourceSource`]
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    endpoints: HashMap<String, String>,
}

impl HttpSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            endpoints: HashMap::new(),
        }
    }

    /// Client and scheme table from configuration
    pub fn from_config(config: &Config) -> Result<Self, ResourceError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| ResourceError::Request(e.to_string()))?;

        let mut source = Self::new(client);
        for (scheme, base) in &config.scheme_endpoints {
            source = source.with_endpoint(scheme, base);
        }
        Ok(source)
    }

    /// Map `scheme://...` locators onto `base/...`
    pub fn with_endpoint(mut self, scheme: &str, base: &str) -> Self {
        self.endpoints
            .insert(scheme.to_lowercase(), base.trim_end_matches('/').to_string());
        self
    }

    /// Resolve a locator to a fetchable URL
    pub fn resolve(&self, uri: &str) -> Result<String, ResourceError> {
        let (scheme, rest) = uri
            .split_once("://")
            .ok_or_else(|| ResourceError::UnsupportedLocator(uri.to_string()))?;

        let scheme = scheme.to_lowercase();
        if scheme == "http" || scheme == "https" {
            return Ok(uri.to_string());
        }

        let base = self
            .endpoints
            .get(&scheme)
            .ok_or_else(|| ResourceError::UnsupportedLocator(uri.to_string()))?;

        Ok(format!("{}/{}", base, rest.trim_start_matches('/')))
    }
}

#[async_trait]
impl ResourceSource for HttpSource {
    async fn fetch(&self, uri: &str) -> Result<Vec<RawSignal>, ResourceError> {
        let url = self.resolve(uri)?;
        debug!("Fetching {} via {}", uri, url);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| ResourceError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ResourceError::Status(response.status().as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ResourceError::Request(e.to_string()))?;

        let body: SignalBody =
            serde_json::from_slice(&bytes).map_err(|e| ResourceError::Malformed(e.to_string()))?;

        Ok(body.into_signals())
    }

    fn name(&self) -> &str {
        "http"
    }
}
