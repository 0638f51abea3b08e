//! Skill Dispatcher
//!
//! Routes task payloads to skills by their `task_type` tag and runs the
//! validate → execute → validate pipeline:
//!
//! ```text
//! raw JSON ──► validate_input ──► Skill::execute ──► validate_output ──► DispatchOutcome
//!                  │                    │                  │
//!            UnknownSkill /        SkillError /      SchemaMismatch
//!            SchemaMismatch          Timeout
//! ```
//!
//! Input validation always runs before any skill code, so a rejected payload
//! has no side effects.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::payload::TaskPayload;
use super::skill::{Skill, SkillError};
use super::validator::{SchemaRegistry, SchemaRegistryBuilder, SkillContract, ValidationError};
use crate::config::Config;

/// Errors surfaced by [`SkillDispatcher::dispatch`]
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Task payload has no string `task_type`")]
    MissingTaskType,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Malformed task payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("No handler registered for skill '{0}'")]
    NoHandler(String),

    #[error("Skill '{skill}' failed: {source}")]
    Skill {
        skill: String,
        #[source]
        source: SkillError,
    },

    #[error("Skill '{skill}' timed out after {}ms", .after.as_millis())]
    Timeout { skill: String, after: Duration },
}

/// A validated skill result
#[derive(Debug, Clone, Serialize)]
pub struct DispatchOutcome {
    pub task_id: String,
    pub skill: String,
    pub result: Value,
    pub duration_ms: u64,
}

/// Registry of skill handlers plus the schema registry guarding them
pub struct SkillDispatcher {
    registry: Arc<SchemaRegistry>,
    skills: HashMap<String, Arc<dyn Skill>>,
    execution_timeout: Duration,
}

impl SkillDispatcher {
    pub fn builder() -> SkillDispatcherBuilder {
        SkillDispatcherBuilder::default()
    }

    /// Shared, read-only schema registry
    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// Names of skills with a handler, sorted
    pub fn handled_skills(&self) -> Vec<String> {
        let mut names: Vec<String> = self.skills.keys().cloned().collect();
        names.sort();
        names
    }

    /// Validate and run a raw JSON task payload
    pub async fn dispatch(&self, raw: &Value) -> Result<DispatchOutcome, DispatchError> {
        let task_type = raw
            .get("task_type")
            .and_then(Value::as_str)
            .ok_or(DispatchError::MissingTaskType)?;

        self.registry.validate_input(task_type, raw)?;
        let task: TaskPayload = serde_json::from_value(raw.clone())?;

        self.run(&task).await
    }

    /// Validate and run a typed task payload
    pub async fn dispatch_payload(&self, task: &TaskPayload) -> Result<DispatchOutcome, DispatchError> {
        self.registry
            .validate_input(task.task_type.as_str(), &task.to_value())?;
        self.run(task).await
    }

    async fn run(&self, task: &TaskPayload) -> Result<DispatchOutcome, DispatchError> {
        let requested = task.task_type.as_str();
        // Aliases resolve to the canonical contract name handlers are keyed by
        let skill_name = self
            .registry
            .contract(requested)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| requested.to_string());

        let skill = self
            .skills
            .get(&skill_name)
            .cloned()
            .ok_or_else(|| DispatchError::NoHandler(skill_name.clone()))?;

        debug!("Dispatching task {} to skill '{}'", task.task_id, skill_name);
        let start = Instant::now();

        let result = match tokio::time::timeout(self.execution_timeout, skill.execute(task)).await {
            Ok(Ok(result)) => result,
            Ok(Err(source)) => {
                warn!("Skill '{}' failed on task {}: {}", skill_name, task.task_id, source);
                return Err(DispatchError::Skill {
                    skill: skill_name,
                    source,
                });
            }
            Err(_) => {
                warn!(
                    "Skill '{}' timed out on task {} after {:?}",
                    skill_name, task.task_id, self.execution_timeout
                );
                return Err(DispatchError::Timeout {
                    skill: skill_name,
                    after: self.execution_timeout,
                });
            }
        };

        if let Err(e) = self.registry.validate_output(&skill_name, &result) {
            warn!("Skill '{}' produced a non-conforming result: {}", skill_name, e);
            return Err(e.into());
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Task {} completed by skill '{}' in {}ms",
            task.task_id, skill_name, duration_ms
        );

        Ok(DispatchOutcome {
            task_id: task.task_id.clone(),
            skill: skill_name,
            result,
            duration_ms,
        })
    }
}

/// Assembles a [`SkillDispatcher`]
pub struct SkillDispatcherBuilder {
    schemas: SchemaRegistryBuilder,
    skills: HashMap<String, Arc<dyn Skill>>,
    execution_timeout: Duration,
}

impl Default for SkillDispatcherBuilder {
    fn default() -> Self {
        Self {
            schemas: SchemaRegistry::builder(),
            skills: HashMap::new(),
            execution_timeout: Duration::from_secs(60),
        }
    }
}

impl SkillDispatcherBuilder {
    /// Apply timeouts from configuration
    pub fn with_config(mut self, config: &Config) -> Self {
        self.execution_timeout = config.execution_timeout;
        self
    }

    pub fn execution_timeout(mut self, timeout: Duration) -> Self {
        self.execution_timeout = timeout;
        self
    }

    /// Start from the built-in contracts
    pub fn with_builtin_contracts(mut self) -> Self {
        self.schemas = self.schemas.with_builtin_contracts();
        self
    }

    /// Register a schema-only contract (validated, but no handler)
    pub fn contract(mut self, contract: SkillContract) -> Self {
        self.schemas.insert(contract);
        self
    }

    pub fn alias(mut self, alias: &str, skill: &str) -> Self {
        self.schemas = self.schemas.alias(alias, skill);
        self
    }

    /// Register a skill handler together with its contract
    pub fn skill(mut self, skill: Arc<dyn Skill>) -> Self {
        let contract = skill.contract().clone();
        info!("Registered skill handler: {}", contract.name);
        self.skills.insert(contract.name.clone(), skill);
        self.schemas.insert(contract);
        self
    }

    pub fn build(self) -> SkillDispatcher {
        SkillDispatcher {
            registry: Arc::new(self.schemas.build()),
            skills: self.skills,
            execution_timeout: self.execution_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::schema::{FieldSpec, SchemaDescriptor};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct UpperSkill {
        contract: SkillContract,
        calls: AtomicUsize,
        broken: bool,
    }

    impl UpperSkill {
        fn new(broken: bool) -> Self {
            let input = crate::skills::builtin::envelope("upper").field(
                "context",
                FieldSpec::object("", true).field("text", FieldSpec::string("", true)),
            );
            let output = SchemaDescriptor::new("upper_output")
                .field("text", FieldSpec::string("", true));
            Self {
                contract: SkillContract::new("upper", input, output),
                calls: AtomicUsize::new(0),
                broken,
            }
        }
    }

    #[async_trait]
    impl Skill for UpperSkill {
        fn contract(&self) -> &SkillContract {
            &self.contract
        }

        async fn execute(&self, task: &TaskPayload) -> Result<Value, SkillError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.broken {
                return Ok(json!({"text": 42}));
            }
            let text: String = task
                .context_value("text")
                .ok_or_else(|| SkillError::InvalidInput("text".to_string()))?;
            Ok(json!({"text": text.to_uppercase()}))
        }
    }

    fn task(text: Value) -> Value {
        json!({
            "task_id": "t-1",
            "agent_id": "agent-001",
            "task_type": "upper",
            "context": {"text": text}
        })
    }

    #[tokio::test]
    async fn test_dispatch_runs_pipeline() {
        let skill = Arc::new(UpperSkill::new(false));
        let dispatcher = SkillDispatcher::builder().skill(skill.clone()).build();

        let outcome = dispatcher.dispatch(&task(json!("hi"))).await.unwrap();
        assert_eq!(outcome.result, json!({"text": "HI"}));
        assert_eq!(outcome.skill, "upper");
        assert_eq!(outcome.task_id, "t-1");
        assert_eq!(skill.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_skill() {
        let skill = Arc::new(UpperSkill::new(false));
        let dispatcher = SkillDispatcher::builder().skill(skill.clone()).build();

        let err = dispatcher.dispatch(&task(json!(7))).await.unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Validation(ValidationError::SchemaMismatch { .. })
        ));
        assert_eq!(skill.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_non_conforming_output_is_rejected() {
        let dispatcher = SkillDispatcher::builder()
            .skill(Arc::new(UpperSkill::new(true)))
            .build();

        let err = dispatcher.dispatch(&task(json!("hi"))).await.unwrap_err();
        match err {
            DispatchError::Validation(ValidationError::SchemaMismatch { direction, .. }) => {
                assert_eq!(direction, crate::skills::Direction::Output);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_and_unhandled_skills() {
        let dispatcher = SkillDispatcher::builder().with_builtin_contracts().build();

        let mut raw = task(json!("hi"));
        raw["task_type"] = json!("nonexistent");
        let err = dispatcher.dispatch(&raw).await.unwrap_err();
        assert!(matches!(err, DispatchError::Validation(ValidationError::UnknownSkill(_))));

        let content = json!({
            "task_id": "123",
            "agent_id": "agent-001",
            "task_type": "generate_content",
            "context": {"goal_description": "Test goal"},
            "acceptance_criteria": {"content_type": "text"}
        });
        let err = dispatcher.dispatch(&content).await.unwrap_err();
        assert!(matches!(err, DispatchError::NoHandler(ref s) if s == "generate_content"));
    }

    #[tokio::test]
    async fn test_missing_task_type() {
        let dispatcher = SkillDispatcher::builder().build();
        let err = dispatcher.dispatch(&json!({"task_id": "1"})).await.unwrap_err();
        assert!(matches!(err, DispatchError::MissingTaskType));
    }

    #[tokio::test]
    async fn test_dispatch_payload() {
        let dispatcher = SkillDispatcher::builder()
            .skill(Arc::new(UpperSkill::new(false)))
            .build();

        let payload = TaskPayload::new("t-2", "agent-001", "upper".into())
            .with_context("text", json!("abc"));
        let outcome = dispatcher.dispatch_payload(&payload).await.unwrap();
        assert_eq!(outcome.result["text"], "ABC");
    }
}
