//! Skill Trait
//!
//! Common interface every task handler implements.

use async_trait::async_trait;
use serde_json::Value;

use super::payload::TaskPayload;
use super::schema::SchemaDescriptor;
use super::validator::{SkillContract, ValidationError};
use crate::trends::FetchError;

/// Errors raised while a skill executes
#[derive(Debug, thiserror::Error)]
pub enum SkillError {
    #[error("Invalid task input: {0}")]
    InvalidInput(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Trend fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A named, independently invokable unit of task handling
#[async_trait]
pub trait Skill: Send + Sync {
    /// Input/output contract; `contract().name` is the task type handled
    fn contract(&self) -> &SkillContract;

    fn name(&self) -> &str {
        &self.contract().name
    }

    fn input_schema(&self) -> &SchemaDescriptor {
        &self.contract().input
    }

    fn output_schema(&self) -> &SchemaDescriptor {
        &self.contract().output
    }

    fn validate_input(&self, payload: &Value) -> Result<(), ValidationError> {
        self.contract().validate_input(payload)
    }

    fn validate_output(&self, result: &Value) -> Result<(), ValidationError> {
        self.contract().validate_output(result)
    }

    /// Run the task. The payload has already passed input validation.
    async fn execute(&self, task: &TaskPayload) -> Result<Value, SkillError>;
}
