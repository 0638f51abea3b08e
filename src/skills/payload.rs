//! Task Payloads
//!
//! The standardized envelope every skill receives.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Tag selecting which skill handles a task.
///
/// The set of valid tags is whatever the schema registry knows about; the
/// built-in ones are exposed as constants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskType(String);

impl TaskType {
    pub const GENERATE_CONTENT: &'static str = "generate_content";
    pub const FETCH_TRENDS: &'static str = "fetch_trends";

    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn generate_content() -> Self {
        Self::new(Self::GENERATE_CONTENT)
    }

    pub fn fetch_trends() -> Self {
        Self::new(Self::FETCH_TRENDS)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskType {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

/// Standardized task input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPayload {
    /// Caller-assigned, opaque
    pub task_id: String,
    /// Requesting agent
    pub agent_id: String,
    /// Selects the handling skill
    pub task_type: TaskType,
    /// Task-type-specific fields
    #[serde(default)]
    pub context: Map<String, Value>,
    /// What a valid result must contain
    #[serde(default)]
    pub acceptance_criteria: Map<String, Value>,
}

impl TaskPayload {
    pub fn new(task_id: &str, agent_id: &str, task_type: TaskType) -> Self {
        Self {
            task_id: task_id.to_string(),
            agent_id: agent_id.to_string(),
            task_type,
            context: Map::new(),
            acceptance_criteria: Map::new(),
        }
    }

    /// Create a payload with a fresh random task id
    pub fn generate(agent_id: &str, task_type: TaskType) -> Self {
        Self::new(&uuid::Uuid::new_v4().to_string(), agent_id, task_type)
    }

    pub fn with_context(mut self, key: &str, value: Value) -> Self {
        self.context.insert(key.to_string(), value);
        self
    }

    pub fn with_criterion(mut self, key: &str, value: Value) -> Self {
        self.acceptance_criteria.insert(key.to_string(), value);
        self
    }

    /// Typed read of a context field
    pub fn context_value<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.context
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Typed read of an acceptance criterion
    pub fn criterion<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.acceptance_criteria
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// JSON form, as seen by the validator
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
