//! Schema Descriptors
//!
//! Data-driven contracts for skill inputs and outputs. A schema is a tree of
//! [`FieldSpec`]s; one generic routine ([`SchemaDescriptor::check`]) walks the
//! tree against a JSON value and collects every [`Violation`] it finds.
//!
//! Descriptors deserialize from TOML or JSON, so contracts can live on disk:
//!
//! ```toml
//! name = "summarize"
//!
//! [fields.task_id]
//! type = "string"
//! required = true
//! non_empty = true
//!
//! [fields.context]
//! type = "object"
//! required = true
//!
//! [fields.context.fields.style]
//! type = "string"
//! enum = ["short", "long"]
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// JSON value kinds a field may be declared as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    /// Any non-null value
    Any,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Any => "any",
        }
    }

    /// Check whether a JSON value has this kind
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
            Self::Any => !value.is_null(),
        }
    }
}

/// Name of the JSON kind of a value, used in violation messages
fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Declaration of a single field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Expected kind
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Must the field be present (and non-null)?
    #[serde(default)]
    pub required: bool,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Allowed values (string fields only)
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,
    /// Inclusive lower bound (numeric fields)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    /// Inclusive upper bound (numeric fields)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    /// Reject empty strings / empty arrays
    #[serde(default)]
    pub non_empty: bool,
    /// Element declaration (array fields)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<FieldSpec>>,
    /// Nested declarations (object fields)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, FieldSpec>,
}

impl FieldSpec {
    fn of(field_type: FieldType, description: &str, required: bool) -> Self {
        Self {
            field_type,
            required,
            description: if description.is_empty() {
                None
            } else {
                Some(description.to_string())
            },
            allowed: None,
            minimum: None,
            maximum: None,
            non_empty: false,
            items: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn string(description: &str, required: bool) -> Self {
        Self::of(FieldType::String, description, required)
    }

    pub fn number(description: &str, required: bool) -> Self {
        Self::of(FieldType::Number, description, required)
    }

    pub fn integer(description: &str, required: bool) -> Self {
        Self::of(FieldType::Integer, description, required)
    }

    pub fn boolean(description: &str, required: bool) -> Self {
        Self::of(FieldType::Boolean, description, required)
    }

    /// Array whose elements all satisfy `items`
    pub fn array(description: &str, required: bool, items: FieldSpec) -> Self {
        let mut spec = Self::of(FieldType::Array, description, required);
        spec.items = Some(Box::new(items));
        spec
    }

    /// Object with nested field declarations (add them with [`FieldSpec::field`])
    pub fn object(description: &str, required: bool) -> Self {
        Self::of(FieldType::Object, description, required)
    }

    pub fn any(description: &str, required: bool) -> Self {
        Self::of(FieldType::Any, description, required)
    }

    /// Restrict a string field to a fixed set of values
    pub fn one_of(mut self, values: &[&str]) -> Self {
        self.allowed = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }

    /// Inclusive numeric range
    pub fn range(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    pub fn non_empty(mut self) -> Self {
        self.non_empty = true;
        self
    }

    /// Declare a nested field (object fields)
    pub fn field(mut self, name: &str, spec: FieldSpec) -> Self {
        self.fields.insert(name.to_string(), spec);
        self
    }

    /// Convert to JSON Schema
    pub fn to_json_schema(&self) -> Value {
        let mut schema = serde_json::json!({});
        if self.field_type != FieldType::Any {
            schema["type"] = serde_json::json!(self.field_type.as_str());
        }
        if let Some(ref description) = self.description {
            schema["description"] = serde_json::json!(description);
        }
        if let Some(ref allowed) = self.allowed {
            schema["enum"] = serde_json::json!(allowed);
        }
        if let Some(min) = self.minimum {
            schema["minimum"] = serde_json::json!(min);
        }
        if let Some(max) = self.maximum {
            schema["maximum"] = serde_json::json!(max);
        }
        if self.non_empty {
            match self.field_type {
                FieldType::String => schema["minLength"] = serde_json::json!(1),
                FieldType::Array => schema["minItems"] = serde_json::json!(1),
                _ => {}
            }
        }
        if let Some(ref items) = self.items {
            schema["items"] = items.to_json_schema();
        }
        if !self.fields.is_empty() {
            let (properties, required) = object_schema(&self.fields);
            schema["properties"] = properties;
            schema["required"] = required;
        }
        schema
    }
}

fn object_schema(fields: &BTreeMap<String, FieldSpec>) -> (Value, Value) {
    let mut properties = serde_json::Map::new();
    let mut required = Vec::new();

    for (name, spec) in fields {
        properties.insert(name.clone(), spec.to_json_schema());
        if spec.required {
            required.push(Value::String(name.clone()));
        }
    }

    (Value::Object(properties), Value::Array(required))
}

/// A single schema violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Dotted path to the offending field (`$` for the document root)
    pub path: String,
    /// What the schema expected
    pub expected: String,
    /// What was actually found
    pub found: String,
}

impl Violation {
    fn new(path: &str, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self {
            path: if path.is_empty() {
                "$".to_string()
            } else {
                path.to_string()
            },
            expected: expected.into(),
            found: found.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}`: expected {}, found {}", self.path, self.expected, self.found)
    }
}

/// Top-level schema for a JSON document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    /// Schema name (used in logs and JSON Schema titles)
    pub name: String,
    /// Declared top-level fields
    #[serde(default)]
    pub fields: BTreeMap<String, FieldSpec>,
    /// Reject fields that are not declared, at every level
    #[serde(default)]
    pub strict: bool,
}

impl SchemaDescriptor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: BTreeMap::new(),
            strict: false,
        }
    }

    pub fn field(mut self, name: &str, spec: FieldSpec) -> Self {
        self.fields.insert(name.to_string(), spec);
        self
    }

    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Check a document against this schema, returning every violation found.
    ///
    /// An empty vector means the document conforms.
    pub fn check(&self, value: &Value) -> Vec<Violation> {
        let mut violations = Vec::new();
        match value.as_object() {
            Some(map) => self.check_fields(&self.fields, map, "", &mut violations),
            None => violations.push(Violation::new("", "object", kind_of(value))),
        }
        violations
    }

    pub fn conforms(&self, value: &Value) -> bool {
        self.check(value).is_empty()
    }

    fn check_fields(
        &self,
        fields: &BTreeMap<String, FieldSpec>,
        map: &serde_json::Map<String, Value>,
        prefix: &str,
        out: &mut Vec<Violation>,
    ) {
        for (name, spec) in fields {
            let path = join_path(prefix, name);
            match map.get(name) {
                None | Some(Value::Null) => {
                    if spec.required {
                        out.push(Violation::new(&path, spec.field_type.as_str(), "missing"));
                    }
                }
                Some(value) => self.check_value(spec, value, &path, out),
            }
        }

        if self.strict {
            for key in map.keys().filter(|k| !fields.contains_key(*k)) {
                out.push(Violation::new(
                    &join_path(prefix, key),
                    "no undeclared field",
                    "unexpected field",
                ));
            }
        }
    }

    fn check_value(&self, spec: &FieldSpec, value: &Value, path: &str, out: &mut Vec<Violation>) {
        if !spec.field_type.matches(value) {
            out.push(Violation::new(path, spec.field_type.as_str(), kind_of(value)));
            return;
        }

        match value {
            Value::String(s) => {
                if spec.non_empty && s.is_empty() {
                    out.push(Violation::new(path, "non-empty string", "empty string"));
                }
                if let Some(ref allowed) = spec.allowed {
                    if !allowed.iter().any(|a| a == s) {
                        out.push(Violation::new(
                            path,
                            format!("one of [{}]", allowed.join(", ")),
                            format!("\"{}\"", s),
                        ));
                    }
                }
            }
            Value::Number(n) => {
                if let Some(v) = n.as_f64() {
                    if let Some(min) = spec.minimum {
                        if v < min {
                            out.push(Violation::new(path, format!(">= {}", min), v.to_string()));
                        }
                    }
                    if let Some(max) = spec.maximum {
                        if v > max {
                            out.push(Violation::new(path, format!("<= {}", max), v.to_string()));
                        }
                    }
                }
            }
            Value::Array(items) => {
                if spec.non_empty && items.is_empty() {
                    out.push(Violation::new(path, "non-empty array", "empty array"));
                }
                if let Some(ref item_spec) = spec.items {
                    for (i, item) in items.iter().enumerate() {
                        let item_path = format!("{}[{}]", path, i);
                        if item.is_null() {
                            out.push(Violation::new(&item_path, item_spec.field_type.as_str(), "null"));
                        } else {
                            self.check_value(item_spec, item, &item_path, out);
                        }
                    }
                }
            }
            Value::Object(map) => {
                // Objects without declared fields are free-form, even under `strict`
                if !spec.fields.is_empty() {
                    self.check_fields(&spec.fields, map, path, out);
                }
            }
            Value::Bool(_) | Value::Null => {}
        }
    }

    /// Convert to JSON Schema
    pub fn to_json_schema(&self) -> Value {
        let (properties, required) = object_schema(&self.fields);
        let mut schema = serde_json::json!({
            "title": self.name,
            "type": "object",
            "properties": properties,
            "required": required,
        });
        if self.strict {
            schema["additionalProperties"] = Value::Bool(false);
        }
        schema
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn content_schema() -> SchemaDescriptor {
        SchemaDescriptor::new("content")
            .field("task_id", FieldSpec::string("Task id", true).non_empty())
            .field(
                "context",
                FieldSpec::object("Task context", true)
                    .field("goal_description", FieldSpec::string("Goal", true))
                    .field(
                        "persona_constraints",
                        FieldSpec::array("Constraints", false, FieldSpec::string("", true)),
                    ),
            )
            .field(
                "criteria",
                FieldSpec::object("", true).field(
                    "content_type",
                    FieldSpec::string("", true).one_of(&["text", "image"]),
                ),
            )
    }

    #[test]
    fn test_conforming_document_has_no_violations() {
        let doc = json!({
            "task_id": "1",
            "context": {"goal_description": "Test goal", "persona_constraints": ["Be funny"]},
            "criteria": {"content_type": "text"}
        });
        assert!(content_schema().check(&doc).is_empty());
    }

    #[test]
    fn test_missing_nested_field_reports_path() {
        let doc = json!({
            "task_id": "1",
            "context": {},
            "criteria": {"content_type": "text"}
        });
        let violations = content_schema().check(&doc);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "context.goal_description");
        assert_eq!(violations[0].found, "missing");
    }

    #[test]
    fn test_enum_and_type_violations_are_all_collected() {
        let doc = json!({
            "task_id": "",
            "context": {"goal_description": 7, "persona_constraints": ["ok", 3]},
            "criteria": {"content_type": "hologram"}
        });
        let violations = content_schema().check(&doc);
        let paths: Vec<&str> = violations.iter().map(|v| v.path.as_str()).collect();

        assert!(paths.contains(&"task_id"));
        assert!(paths.contains(&"context.goal_description"));
        assert!(paths.contains(&"context.persona_constraints[1]"));
        assert!(paths.contains(&"criteria.content_type"));
        assert_eq!(violations.len(), 4);
    }

    #[test]
    fn test_non_object_root() {
        let violations = content_schema().check(&json!([1, 2]));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "$");
        assert_eq!(violations[0].found, "array");
    }

    #[test]
    fn test_null_is_treated_as_absent() {
        let schema = SchemaDescriptor::new("t")
            .field("optional", FieldSpec::string("", false))
            .field("required", FieldSpec::string("", true));
        let violations = schema.check(&json!({"optional": null, "required": null}));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "required");
    }

    #[test]
    fn test_numeric_range_is_inclusive() {
        let schema = SchemaDescriptor::new("t")
            .field("score", FieldSpec::number("", true).range(0.0, 1.0));
        assert!(schema.conforms(&json!({"score": 0.0})));
        assert!(schema.conforms(&json!({"score": 1})));
        assert!(!schema.conforms(&json!({"score": 1.01})));
        assert!(!schema.conforms(&json!({"score": -0.1})));
    }

    #[test]
    fn test_integer_rejects_fractional_numbers() {
        let schema = SchemaDescriptor::new("t").field("n", FieldSpec::integer("", true));
        assert!(schema.conforms(&json!({"n": 3})));
        assert!(!schema.conforms(&json!({"n": 3.5})));
    }

    #[test]
    fn test_strict_schema_rejects_undeclared_fields() {
        let schema = SchemaDescriptor::new("t")
            .field("a", FieldSpec::string("", true))
            .strict();
        let violations = schema.check(&json!({"a": "x", "b": 1}));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "b");

        let lenient = SchemaDescriptor::new("t").field("a", FieldSpec::string("", true));
        assert!(lenient.conforms(&json!({"a": "x", "b": 1})));
    }

    #[test]
    fn test_strict_leaves_free_form_objects_alone() {
        let schema = SchemaDescriptor::new("t")
            .field("meta", FieldSpec::object("", true))
            .field(
                "nested",
                FieldSpec::object("", false).field("x", FieldSpec::integer("", true)),
            )
            .strict();

        assert!(schema.conforms(&json!({"meta": {"k": 1, "v": [true]}})));

        let violations = schema.check(&json!({"meta": {}, "nested": {"x": 1, "y": 2}}));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "nested.y");
    }

    #[test]
    fn test_non_empty_means_not_zero_length() {
        let schema = SchemaDescriptor::new("t")
            .field("id", FieldSpec::string("", true).non_empty())
            .field("tags", FieldSpec::array("", false, FieldSpec::string("", true)).non_empty());

        assert!(schema.conforms(&json!({"id": " "})));
        assert!(!schema.conforms(&json!({"id": ""})));
        assert!(!schema.conforms(&json!({"id": "1", "tags": []})));
    }

    #[test]
    fn test_boolean_and_any_fields() {
        let schema = SchemaDescriptor::new("t")
            .field("flag", FieldSpec::boolean("", true))
            .field("extra", FieldSpec::any("", true));

        assert!(schema.conforms(&json!({"flag": false, "extra": [1, "two"]})));
        assert!(schema.conforms(&json!({"flag": true, "extra": "anything"})));

        let violations = schema.check(&json!({"flag": "yes"}));
        let paths: Vec<&str> = violations.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(paths, vec!["extra", "flag"]);
        assert_eq!(violations[1].expected, "boolean");
    }

    #[test]
    fn test_to_json_schema() {
        let schema = content_schema().to_json_schema();

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["task_id"]["minLength"], 1);
        assert_eq!(
            schema["properties"]["criteria"]["properties"]["content_type"]["enum"][1],
            "image"
        );
        assert_eq!(schema["properties"]["context"]["required"][0], "goal_description");
    }

    #[test]
    fn test_descriptor_from_toml() {
        let raw = r#"
name = "summarize"

[fields.style]
type = "string"
required = true
enum = ["short", "long"]
"#;
        let schema: SchemaDescriptor = toml::from_str(raw).unwrap();
        assert!(schema.conforms(&json!({"style": "short"})));
        assert!(!schema.conforms(&json!({"style": "epic"})));
    }
}
