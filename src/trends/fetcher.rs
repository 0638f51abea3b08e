//! Trend Fetcher
//!
//! Polls every configured resource concurrently, drops signals below the
//! relevance threshold and turns the rest into [`TrendAlert`]s.
//!
//! Per-resource fetches are futures driven inside the `fetch()` future, so
//! dropping that future (or tripping the shutdown signal passed to
//! [`TrendFetcher::fetch_with_shutdown`]) cancels every in-flight request.
//!
//! Alerts come out in resource order (first-occurrence order of
//! `resource_uris`), then in the order the source returned signals for that
//! resource.

use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::alert::{Trend, TrendAlert};
use super::config::TrendFetchConfig;
use super::source::{RawSignal, ResourceSource};
use crate::config::Config;

/// Default bound on a single resource fetch
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of resources polled at once
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// A resource that could not be fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceFetchFailure {
    pub uri: String,
    pub reason: String,
}

/// Outcome of a fetch in which at least one resource answered
#[derive(Debug, Clone, Default, Serialize)]
pub struct FetchReport {
    /// Alerts at or above the threshold
    pub alerts: Vec<TrendAlert>,
    /// Resources that failed
    pub failures: Vec<ResourceFetchFailure>,
    /// Signals dropped for being below the threshold
    pub discarded: usize,
    /// Distinct resources polled
    pub resources_polled: usize,
}

impl FetchReport {
    /// Some resources failed but not all
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.failures.len()
    }
}

/// Trend fetch errors
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid trend fetch configuration: {0}")]
    InvalidConfig(String),

    #[error("All {} resource(s) failed: {}", .failures.len(), join_failures(.failures))]
    TotalFetchFailure { failures: Vec<ResourceFetchFailure> },

    #[error("Trend fetch cancelled")]
    Cancelled,
}

fn join_failures(failures: &[ResourceFetchFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.uri, f.reason))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Polls resources for trend signals
pub struct TrendFetcher {
    config: TrendFetchConfig,
    source: Arc<dyn ResourceSource>,
    timeout: Duration,
    max_concurrency: usize,
}

impl TrendFetcher {
    /// Create a fetcher; the configuration is validated up front
    pub fn new(config: TrendFetchConfig, source: Arc<dyn ResourceSource>) -> Result<Self, FetchError> {
        config.validate()?;
        let timeout = config
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_FETCH_TIMEOUT);

        Ok(Self {
            config,
            source,
            timeout,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        })
    }

    /// Apply process-wide limits; a per-config `timeout_ms` still wins
    pub fn with_settings(mut self, settings: &Config) -> Self {
        if self.config.timeout_ms.is_none() {
            self.timeout = settings.fetch_timeout;
        }
        self.max_concurrency = settings.max_concurrent_fetches.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn config(&self) -> &TrendFetchConfig {
        &self.config
    }

    /// Poll every resource and collect alerts.
    ///
    /// Individual failures are recorded in the report; only when every
    /// resource fails is [`FetchError::TotalFetchFailure`] returned.
    pub async fn fetch(&self) -> Result<FetchReport, FetchError> {
        let uris = self.config.unique_uris();
        let polled = uris.len();
        debug!(
            "Fetching trends for {} from {} resource(s) via {} source",
            self.config.agent_id,
            polled,
            self.source.name()
        );

        let this = self;
        let outcomes: Vec<(String, Result<Vec<RawSignal>, String>)> = stream::iter(uris)
            .map(move |uri| async move {
                let outcome = this.fetch_one(&uri).await;
                (uri, outcome)
            })
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let mut report = FetchReport {
            resources_polled: polled,
            ..Default::default()
        };

        for (uri, outcome) in outcomes {
            match outcome {
                Ok(signals) => self.collect(&uri, signals, &mut report),
                Err(reason) => {
                    warn!("Resource {} failed: {}", uri, reason);
                    report.failures.push(ResourceFetchFailure { uri, reason });
                }
            }
        }

        if polled > 0 && report.failures.len() == polled {
            warn!("All {} resource(s) failed for {}", polled, self.config.agent_id);
            return Err(FetchError::TotalFetchFailure {
                failures: report.failures,
            });
        }

        info!(
            "Trend fetch for {}: {} alert(s), {} discarded, {} failed of {} resource(s)",
            self.config.agent_id,
            report.alerts.len(),
            report.discarded,
            report.failures.len(),
            polled
        );
        Ok(report)
    }

    /// [`TrendFetcher::fetch`], abandoned as soon as `shutdown` reads `true`
    pub async fn fetch_with_shutdown(
        &self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<FetchReport, FetchError> {
        if *shutdown.borrow() {
            return Err(FetchError::Cancelled);
        }

        tokio::select! {
            result = self.fetch() => result,
            _ = wait_for_shutdown(&mut shutdown) => {
                info!("Trend fetch for {} cancelled", self.config.agent_id);
                Err(FetchError::Cancelled)
            }
        }
    }

    async fn fetch_one(&self, uri: &str) -> Result<Vec<RawSignal>, String> {
        if !TrendFetchConfig::is_locator(uri) {
            return Err(format!("'{}' is not a resource locator", uri));
        }

        let signals = match tokio::time::timeout(self.timeout, self.source.fetch(uri)).await {
            Ok(Ok(signals)) => signals,
            Ok(Err(e)) => return Err(e.to_string()),
            Err(_) => return Err(format!("timed out after {}ms", self.timeout.as_millis())),
        };

        if let Some(bad) = signals.iter().find(|s| !s.is_normalized()) {
            return Err(format!(
                "malformed signal: signal_strength {} outside [0, 1]",
                bad.signal_strength
            ));
        }

        debug!("Resource {} returned {} signal(s)", uri, signals.len());
        Ok(signals)
    }

    fn collect(&self, uri: &str, signals: Vec<RawSignal>, report: &mut FetchReport) {
        for signal in signals {
            if signal.signal_strength < self.config.relevance_threshold {
                report.discarded += 1;
                continue;
            }

            report.alerts.push(TrendAlert::new(
                &self.config.agent_id,
                Trend {
                    signal_strength: signal.signal_strength,
                    source: uri.to_string(),
                    topic: signal.topic,
                    summary: signal.summary,
                },
            ));
        }
    }
}

/// Resolves once the flag reads `true`; never resolves if the sender is gone
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
        if *shutdown.borrow() {
            return;
        }
    }
}
