//! Resource Sources
//!
//! Pluggable capability that resolves a resource locator to raw trend signals.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Raw signal as reported by a resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSignal {
    /// Expected in [0.0, 1.0]
    pub signal_strength: f64,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl RawSignal {
    pub fn new(signal_strength: f64) -> Self {
        Self {
            signal_strength,
            topic: None,
            summary: None,
        }
    }

    pub fn with_topic(mut self, topic: &str) -> Self {
        self.topic = Some(topic.to_string());
        self
    }

    pub fn with_summary(mut self, summary: &str) -> Self {
        self.summary = Some(summary.to_string());
        self
    }

    /// Strength is a finite number in [0.0, 1.0]
    pub fn is_normalized(&self) -> bool {
        (0.0..=1.0).contains(&self.signal_strength)
    }
}

/// Errors fetching a single resource
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResourceError {
    #[error("Unsupported locator: {0}")]
    UnsupportedLocator(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Resource unavailable: {0}")]
    Unavailable(String),
}

/// Given a locator, return its raw signals or fail
#[async_trait]
pub trait ResourceSource: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<Vec<RawSignal>, ResourceError>;

    /// Short name for logs
    fn name(&self) -> &str {
        "source"
    }
}

/// In-process source backed by a fixed table of responses
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    responses: HashMap<String, Result<Vec<RawSignal>, String>>,
    delays: HashMap<String, Duration>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_signals(mut self, uri: &str, signals: Vec<RawSignal>) -> Self {
        self.responses.insert(uri.to_string(), Ok(signals));
        self
    }

    pub fn with_failure(mut self, uri: &str, reason: &str) -> Self {
        self.responses.insert(uri.to_string(), Err(reason.to_string()));
        self
    }

    /// Delay the response for `uri`
    pub fn with_delay(mut self, uri: &str, delay: Duration) -> Self {
        self.delays.insert(uri.to_string(), delay);
        self
    }
}

#[async_trait]
impl ResourceSource for MemorySource {
    async fn fetch(&self, uri: &str) -> Result<Vec<RawSignal>, ResourceError> {
        if let Some(delay) = self.delays.get(uri) {
            tokio::time::sleep(*delay).await;
        }

        debug!("Memory source lookup: {}", uri);
        match self.responses.get(uri) {
            Some(Ok(signals)) => Ok(signals.clone()),
            Some(Err(reason)) => Err(ResourceError::Unavailable(reason.clone())),
            None => Err(ResourceError::Unavailable(format!("no such resource: {}", uri))),
        }
    }

    fn name(&self) -> &str {
        "memory"
    }
}
