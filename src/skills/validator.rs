//! Skill Interface Validator
//!
//! Gatekeeper between callers and skills: every payload entering a skill and
//! every result leaving it is checked against the contract registered for
//! that skill. The registry is assembled once through [`SchemaRegistryBuilder`]
//! and is read-only afterwards, so it can be shared behind an `Arc` without
//! locking.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

use super::schema::{SchemaDescriptor, Violation};

/// Which side of a skill a schema guards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Input,
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Output => f.write_str("output"),
        }
    }
}

/// Validation errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error("Unknown skill: {0}")]
    UnknownSkill(String),

    #[error("Schema mismatch on {direction} of skill '{skill}': {}", join_violations(.violations))]
    SchemaMismatch {
        skill: String,
        direction: Direction,
        violations: Vec<Violation>,
    },
}

impl ValidationError {
    /// Violations carried by a mismatch (empty for other variants)
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::SchemaMismatch { violations, .. } => violations,
            Self::UnknownSkill(_) => &[],
        }
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Input and output schema of one skill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillContract {
    /// Skill name; matches the `task_type` tag it handles
    pub name: String,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    pub input: SchemaDescriptor,
    pub output: SchemaDescriptor,
}

impl SkillContract {
    pub fn new(name: &str, input: SchemaDescriptor, output: SchemaDescriptor) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            input,
            output,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn schema(&self, direction: Direction) -> &SchemaDescriptor {
        match direction {
            Direction::Input => &self.input,
            Direction::Output => &self.output,
        }
    }

    /// Check a document against one side of the contract
    pub fn validate(&self, direction: Direction, value: &Value) -> Result<(), ValidationError> {
        let violations = self.schema(direction).check(value);
        if violations.is_empty() {
            debug!("{} of skill '{}' conforms", direction, self.name);
            Ok(())
        } else {
            debug!(
                "{} of skill '{}' has {} violation(s)",
                direction,
                self.name,
                violations.len()
            );
            Err(ValidationError::SchemaMismatch {
                skill: self.name.clone(),
                direction,
                violations,
            })
        }
    }

    pub fn validate_input(&self, payload: &Value) -> Result<(), ValidationError> {
        self.validate(Direction::Input, payload)
    }

    pub fn validate_output(&self, result: &Value) -> Result<(), ValidationError> {
        self.validate(Direction::Output, result)
    }
}

/// Read-only mapping from skill name to contract
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    contracts: HashMap<String, SkillContract>,
    aliases: HashMap<String, String>,
}

impl SchemaRegistry {
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::default()
    }

    /// Registry holding the built-in contracts
    pub fn builtin() -> Self {
        Self::builder().with_builtin_contracts().build()
    }

    /// Look up a contract by name or alias
    pub fn contract(&self, skill: &str) -> Option<&SkillContract> {
        let name = self.aliases.get(skill).map(String::as_str).unwrap_or(skill);
        self.contracts.get(name)
    }

    pub fn contains(&self, skill: &str) -> bool {
        self.contract(skill).is_some()
    }

    /// Registered skill names, sorted
    pub fn skill_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.contracts.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    fn lookup(&self, skill: &str) -> Result<&SkillContract, ValidationError> {
        self.contract(skill)
            .ok_or_else(|| ValidationError::UnknownSkill(skill.to_string()))
    }

    /// Validate a task payload against the skill's input schema
    pub fn validate_input(&self, skill: &str, payload: &Value) -> Result<(), ValidationError> {
        self.lookup(skill)?.validate_input(payload)
    }

    /// Validate a skill result against the skill's output schema
    pub fn validate_output(&self, skill: &str, result: &Value) -> Result<(), ValidationError> {
        self.lookup(skill)?.validate_output(result)
    }

    /// Boolean form of [`SchemaRegistry::validate_input`].
    ///
    /// A mismatch yields `Ok(false)`; an unknown skill is still an error.
    pub fn is_valid_input(&self, skill: &str, payload: &Value) -> Result<bool, ValidationError> {
        Ok(self.lookup(skill)?.input.conforms(payload))
    }

    /// Boolean form of [`SchemaRegistry::validate_output`]
    pub fn is_valid_output(&self, skill: &str, result: &Value) -> Result<bool, ValidationError> {
        Ok(self.lookup(skill)?.output.conforms(result))
    }
}

/// Assembles a [`SchemaRegistry`]
#[derive(Debug, Default)]
pub struct SchemaRegistryBuilder {
    contracts: HashMap<String, SkillContract>,
    aliases: HashMap<String, String>,
}

impl SchemaRegistryBuilder {
    /// Register a contract, replacing any previous one with the same name
    pub fn register(mut self, contract: SkillContract) -> Self {
        self.insert(contract);
        self
    }

    pub(crate) fn insert(&mut self, contract: SkillContract) {
        if self.contracts.contains_key(&contract.name) {
            warn!("Replacing existing contract for skill '{}'", contract.name);
        }
        self.contracts.insert(contract.name.clone(), contract);
    }

    /// Let `alias` resolve to the contract registered as `skill`
    pub fn alias(mut self, alias: &str, skill: &str) -> Self {
        self.aliases.insert(alias.to_string(), skill.to_string());
        self
    }

    /// Add the `generate_content` and `fetch_trends` contracts
    pub fn with_builtin_contracts(self) -> Self {
        super::builtin::contracts()
            .into_iter()
            .fold(self, |builder, contract| builder.register(contract))
            .alias("skill_content_generator", super::payload::TaskType::GENERATE_CONTENT)
            .alias("skill_trend_fetcher", super::payload::TaskType::FETCH_TRENDS)
    }

    pub fn build(self) -> SchemaRegistry {
        let mut aliases = self.aliases;
        aliases.retain(|alias, target| {
            let known = self.contracts.contains_key(target);
            if !known {
                warn!("Dropping alias '{}': no contract named '{}'", alias, target);
            }
            known
        });

        info!(
            "Schema registry ready: {} contract(s), {} alias(es)",
            self.contracts.len(),
            aliases.len()
        );

        SchemaRegistry {
            contracts: self.contracts,
            aliases,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::schema::FieldSpec;
    use serde_json::json;

    fn echo_contract() -> SkillContract {
        SkillContract::new(
            "echo",
            SchemaDescriptor::new("echo_input").field("text", FieldSpec::string("", true)),
            SchemaDescriptor::new("echo_output").field("echo", FieldSpec::string("", true)),
        )
    }

    #[test]
    fn test_unknown_skill() {
        let registry = SchemaRegistry::builder().register(echo_contract()).build();

        let err = registry.validate_input("nope", &json!({})).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownSkill(ref s) if s == "nope"));

        let err = registry.validate_output("nope", &json!({})).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownSkill(_)));

        assert!(registry.is_valid_input("nope", &json!({})).is_err());
    }

    #[test]
    fn test_input_and_output_use_their_own_schema() {
        let registry = SchemaRegistry::builder().register(echo_contract()).build();

        assert!(registry.validate_input("echo", &json!({"text": "hi"})).is_ok());
        assert!(registry.validate_output("echo", &json!({"echo": "hi"})).is_ok());

        let err = registry.validate_output("echo", &json!({"text": "hi"})).unwrap_err();
        match err {
            ValidationError::SchemaMismatch {
                skill,
                direction,
                violations,
            } => {
                assert_eq!(skill, "echo");
                assert_eq!(direction, Direction::Output);
                assert_eq!(violations[0].path, "echo");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_boolean_form() {
        let registry = SchemaRegistry::builder().register(echo_contract()).build();
        assert!(registry.is_valid_input("echo", &json!({"text": "x"})).unwrap());
        assert!(!registry.is_valid_input("echo", &json!({"text": 1})).unwrap());
    }

    #[test]
    fn test_aliases_resolve_and_dangling_aliases_are_dropped() {
        let registry = SchemaRegistry::builder()
            .register(echo_contract())
            .alias("repeat", "echo")
            .alias("ghost", "missing")
            .build();

        assert!(registry.contains("repeat"));
        assert!(!registry.contains("ghost"));
        assert!(registry.validate_input("repeat", &json!({"text": "hi"})).is_ok());
    }

    #[test]
    fn test_mismatch_message_names_every_violation() {
        let registry = SchemaRegistry::builder().register(echo_contract()).build();
        let err = registry.validate_input("echo", &json!({"text": 5})).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("input"));
        assert!(message.contains("`text`"));
        assert_eq!(err.violations().len(), 1);
    }

    #[test]
    fn test_registration_replaces() {
        let replacement = SkillContract::new(
            "echo",
            SchemaDescriptor::new("echo_input"),
            SchemaDescriptor::new("echo_output"),
        );
        let registry = SchemaRegistry::builder()
            .register(echo_contract())
            .register(replacement)
            .build();

        assert_eq!(registry.len(), 1);
        assert!(registry.validate_input("echo", &json!({})).is_ok());
    }
}
