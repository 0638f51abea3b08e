//! Built-in skill contracts

use super::payload::TaskType;
use super::schema::{FieldSpec, SchemaDescriptor};
use super::validator::SkillContract;
use crate::trends::alert::TrendAlert;

/// Content types a `generate_content` task may ask for
pub const CONTENT_TYPES: &[&str] = &["text", "image", "video", "audio"];

/// Fields shared by every task payload
pub fn envelope(task_type: &str) -> SchemaDescriptor {
    SchemaDescriptor::new(&format!("{}_input", task_type))
        .field(
            "task_id",
            FieldSpec::string("Caller-assigned task identifier", true).non_empty(),
        )
        .field(
            "agent_id",
            FieldSpec::string("Requesting agent", true).non_empty(),
        )
        .field(
            "task_type",
            FieldSpec::string("Skill selector", true).one_of(&[task_type]),
        )
        .field("context", FieldSpec::object("Task-specific fields", true))
        .field(
            "acceptance_criteria",
            FieldSpec::object("What a valid result must contain", false),
        )
}

pub fn generate_content() -> SkillContract {
    let input = envelope(TaskType::GENERATE_CONTENT)
        .field(
            "context",
            FieldSpec::object("Task-specific fields", true)
                .field(
                    "goal_description",
                    FieldSpec::string("What the content should achieve", true).non_empty(),
                )
                .field(
                    "persona_constraints",
                    FieldSpec::array(
                        "Ordered persona rules",
                        false,
                        FieldSpec::string("Persona rule", true),
                    ),
                ),
        )
        .field(
            "acceptance_criteria",
            FieldSpec::object("What a valid result must contain", true).field(
                "content_type",
                FieldSpec::string("Expected content type", true).one_of(CONTENT_TYPES),
            ),
        );

    let output = SchemaDescriptor::new("generate_content_output")
        .field("task_id", FieldSpec::string("Task the content answers", true).non_empty())
        .field(
            "content_type",
            FieldSpec::string("Produced content type", true).one_of(CONTENT_TYPES),
        )
        .field("body", FieldSpec::string("Generated content", true));

    SkillContract::new(TaskType::GENERATE_CONTENT, input, output)
        .with_description("Generate content for a goal under persona constraints")
}

pub fn fetch_trends() -> SkillContract {
    let input = envelope(TaskType::FETCH_TRENDS).field(
        "context",
        FieldSpec::object("Task-specific fields", true)
            .field(
                "resource_uris",
                FieldSpec::array(
                    "Resource locators to poll",
                    true,
                    FieldSpec::string("Resource locator", true).non_empty(),
                )
                .non_empty(),
            )
            .field(
                "relevance_threshold",
                FieldSpec::number("Minimum signal strength", true).range(0.0, 1.0),
            )
            .field(
                "timeout_ms",
                FieldSpec::integer("Per-resource timeout override", false).range(1.0, f64::MAX),
            ),
    );

    let failure = FieldSpec::object("Resource that could not be fetched", true)
        .field("uri", FieldSpec::string("Resource locator", true))
        .field("reason", FieldSpec::string("Failure reason", true));

    let output = SchemaDescriptor::new("fetch_trends_output")
        .field(
            "alerts",
            FieldSpec::array("Emitted alerts", true, TrendAlert::field_spec()),
        )
        .field(
            "failures",
            FieldSpec::array("Per-resource failures", true, failure),
        );

    SkillContract::new(TaskType::FETCH_TRENDS, input, output)
        .with_description("Poll resources and emit trend alerts above a relevance threshold")
}

pub fn contracts() -> Vec<SkillContract> {
    vec![generate_content(), fetch_trends()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reference_generate_content_payload() {
        let payload = json!({
            "task_id": "123",
            "agent_id": "agent-001",
            "task_type": "generate_content",
            "context": {
                "goal_description": "Test goal",
                "persona_constraints": ["Be funny"]
            },
            "acceptance_criteria": {"content_type": "text"}
        });
        assert!(generate_content().validate_input(&payload).is_ok());
    }

    #[test]
    fn test_envelope_rejects_wrong_task_type() {
        let payload = json!({
            "task_id": "1",
            "agent_id": "a",
            "task_type": "fetch_trends",
            "context": {"goal_description": "g"},
            "acceptance_criteria": {"content_type": "text"}
        });
        let err = generate_content().validate_input(&payload).unwrap_err();
        assert_eq!(err.violations()[0].path, "task_type");
    }

    #[test]
    fn test_fetch_trends_threshold_must_be_normalized() {
        let payload = json!({
            "task_id": "1",
            "agent_id": "a",
            "task_type": "fetch_trends",
            "context": {"resource_uris": ["news://tech/ai"], "relevance_threshold": 1.5}
        });
        let err = fetch_trends().validate_input(&payload).unwrap_err();
        assert_eq!(err.violations()[0].path, "context.relevance_threshold");
    }

    #[test]
    fn test_fetch_trends_output_accepts_empty_report() {
        let result = json!({"alerts": [], "failures": []});
        assert!(fetch_trends().validate_output(&result).is_ok());
    }
}
