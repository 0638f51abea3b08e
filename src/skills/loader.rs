//! Contract Loader
//!
//! Loads additional skill contracts from TOML or JSON files.

use super::validator::{SchemaRegistryBuilder, SkillContract};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info, warn};

/// Reads [`SkillContract`]s from disk
#[derive(Debug, Default, Clone, Copy)]
pub struct ContractLoader;

impl ContractLoader {
    pub fn new() -> Self {
        Self
    }

    /// Parse contract text; format chosen by extension hint
    pub fn parse(content: &str, extension: &str) -> Result<SkillContract> {
        let contract: SkillContract = match extension {
            "toml" => toml::from_str(content).context("Failed to parse TOML contract")?,
            "json" => serde_json::from_str(content).context("Failed to parse JSON contract")?,
            _ => toml::from_str(content)
                .or_else(|_| serde_json::from_str(content))
                .context("Failed to parse contract")?,
        };

        if contract.name.trim().is_empty() {
            anyhow::bail!("Contract has an empty name");
        }
        Ok(contract)
    }

    /// Load one contract file
    pub async fn load_file(&self, path: &Path) -> Result<SkillContract> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read contract file {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let contract = Self::parse(&content, extension)
            .with_context(|| format!("Invalid contract file {}", path.display()))?;

        debug!("Loaded contract '{}' from {}", contract.name, path.display());
        Ok(contract)
    }

    /// Load every `.toml` / `.json` contract in a directory, in file name order.
    ///
    /// Unparseable files are skipped with a warning.
    pub async fn load_dir(&self, dir: &Path) -> Result<Vec<SkillContract>> {
        let mut paths = Vec::new();
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .with_context(|| format!("Failed to read contract directory {}", dir.display()))?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_contract = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e == "toml" || e == "json")
                .unwrap_or(false);
            if is_contract {
                paths.push(path);
            }
        }
        paths.sort();

        let mut contracts = Vec::with_capacity(paths.len());
        for path in &paths {
            match self.load_file(path).await {
                Ok(contract) => contracts.push(contract),
                Err(e) => warn!("Skipping contract {}: {:#}", path.display(), e),
            }
        }

        info!("Loaded {} contract(s) from {}", contracts.len(), dir.display());
        Ok(contracts)
    }

    /// Load a directory of contracts into a registry builder
    pub async fn extend(&self, builder: SchemaRegistryBuilder, dir: &Path) -> Result<SchemaRegistryBuilder> {
        let contracts = self.load_dir(dir).await?;
        Ok(contracts
            .into_iter()
            .fold(builder, |builder, contract| builder.register(contract)))
    }
}
