//! `fetch_trends` skill

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::config::TrendFetchConfig;
use super::fetcher::TrendFetcher;
use super::source::ResourceSource;
use crate::config::Config;
use crate::skills::builtin;
use crate::skills::payload::TaskPayload;
use crate::skills::skill::{Skill, SkillError};
use crate::skills::validator::SkillContract;

/// Runs a [`TrendFetcher`] for each `fetch_trends` task
pub struct TrendFetchSkill {
    contract: SkillContract,
    source: Arc<dyn ResourceSource>,
    settings: Option<Config>,
}

impl TrendFetchSkill {
    pub fn new(source: Arc<dyn ResourceSource>) -> Self {
        Self {
            contract: builtin::fetch_trends(),
            source,
            settings: None,
        }
    }

    /// Apply process-wide fetch timeout and concurrency limits
    pub fn with_settings(mut self, settings: Config) -> Self {
        self.settings = Some(settings);
        self
    }
}

#[async_trait]
impl Skill for TrendFetchSkill {
    fn contract(&self) -> &SkillContract {
        &self.contract
    }

    async fn execute(&self, task: &TaskPayload) -> Result<Value, SkillError> {
        let config = TrendFetchConfig::from_payload(task)?;
        let mut fetcher = TrendFetcher::new(config, self.source.clone())?;
        if let Some(ref settings) = self.settings {
            fetcher = fetcher.with_settings(settings);
        }

        let report = fetcher.fetch().await?;

        Ok(serde_json::json!({
            "alerts": serde_json::to_value(&report.alerts)?,
            "failures": serde_json::to_value(&report.failures)?,
        }))
    }
}
