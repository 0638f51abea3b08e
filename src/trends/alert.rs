//! Trend Alert Events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::skills::schema::{FieldSpec, SchemaDescriptor};

/// Wire literal of [`AlertKind::TrendAlert`]
pub const TREND_ALERT_EVENT_TYPE: &str = "trend_alert";

/// Event type tag; only one kind exists, so any other value fails to deserialize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    #[default]
    TrendAlert,
}

/// Detected trend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    /// Normalized relevance in [0.0, 1.0]
    pub signal_strength: f64,
    /// Resource URI the signal came from (extension)
    pub source: String,
    /// Topic label, if the source provided one (extension)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Free-form summary, if the source provided one (extension)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Output event for a trend that cleared the relevance threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAlert {
    /// Generated at emission time
    pub event_id: Uuid,
    /// Always `"trend_alert"`
    pub event_type: AlertKind,
    /// Agent the fetch ran for (extension)
    pub agent_id: String,
    /// Emission time (extension)
    pub emitted_at: DateTime<Utc>,
    pub trend: Trend,
}

impl TrendAlert {
    pub fn new(agent_id: &str, trend: Trend) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type: AlertKind::TrendAlert,
            agent_id: agent_id.to_string(),
            emitted_at: Utc::now(),
            trend,
        }
    }

    pub fn signal_strength(&self) -> f64 {
        self.trend.signal_strength
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Declaration of one alert object.
    ///
    /// Only `event_id`, `event_type` and `trend.signal_strength` are required;
    /// the other fields are optional extensions.
    pub fn field_spec() -> FieldSpec {
        FieldSpec::object("Trend alert event", true)
            .field("event_id", FieldSpec::string("Unique event id", true).non_empty())
            .field(
                "event_type",
                FieldSpec::string("Event type", true).one_of(&[TREND_ALERT_EVENT_TYPE]),
            )
            .field("agent_id", FieldSpec::string("Agent the fetch ran for", false))
            .field("emitted_at", FieldSpec::string("RFC 3339 emission time", false))
            .field(
                "trend",
                FieldSpec::object("Detected trend", true)
                    .field(
                        "signal_strength",
                        FieldSpec::number("Normalized relevance", true).range(0.0, 1.0),
                    )
                    .field("source", FieldSpec::string("Resource URI", false))
                    .field("topic", FieldSpec::string("Topic label", false))
                    .field("summary", FieldSpec::string("Summary", false)),
            )
    }

    /// Standalone `TrendAlert` schema
    pub fn schema() -> SchemaDescriptor {
        let mut schema = SchemaDescriptor::new("trend_alert");
        schema.fields = Self::field_spec().fields;
        schema
    }
}
