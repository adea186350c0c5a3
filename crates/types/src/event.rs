// crates/types/src/event.rs
//! The transcript event model.
//!
//! Events arrive as JSON objects discriminated by an `event` field. The set of
//! kinds is open-ended on the wire: kinds this crate does not know about decode
//! into [`Event::Unknown`] carrying the raw value, so no record is ever dropped
//! from a transcript.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::change::ChangeRecord;

/// Fields shared by every event kind.
///
/// Timestamps are carried verbatim as ISO-8601 strings; the engine never
/// interprets them beyond equality and pass-through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../src/types/generated/"))]
pub struct EventCommon {
    #[serde(default)]
    pub timestamp: String,
    /// Execution-time accounting offset (seconds), as opposed to wall clock.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_start: Option<f64>,
    /// Provisional record, not yet committed by the producer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
}

/// Beginning of processing for a sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../src/types/generated/"))]
pub struct SampleInitEvent {
    #[serde(flatten)]
    pub common: EventCommon,
    #[serde(default)]
    pub sample: Value,
    /// Initial resolved state; the baseline for `state` change replay.
    #[serde(default)]
    pub state: Value,
}

/// Processing halted by a limit (tokens, time, messages, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../src/types/generated/"))]
pub struct SampleLimitEvent {
    #[serde(flatten)]
    pub common: EventCommon,
    #[serde(rename = "type", default)]
    pub limit_type: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

/// Structural diff against the task state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../src/types/generated/"))]
pub struct StateEvent {
    #[serde(flatten)]
    pub common: EventCommon,
    #[serde(default)]
    pub changes: Vec<ChangeRecord>,
}

/// Structural diff against the shared store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../src/types/generated/"))]
pub struct StoreEvent {
    #[serde(flatten)]
    pub common: EventCommon,
    #[serde(default)]
    pub changes: Vec<ChangeRecord>,
}

/// Call to a language model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../src/types/generated/"))]
pub struct ModelEvent {
    #[serde(flatten)]
    pub common: EventCommon,
    #[serde(default)]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub input: Value,
    #[serde(default)]
    pub tools: Value,
    #[serde(default)]
    pub tool_choice: Value,
    #[serde(default)]
    pub output: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_time: Option<f64>,
}

/// Call to a tool.
///
/// `events` is the tool's embedded sub-transcript. Current producers record
/// everything in the main stream instead, but older transcripts still carry
/// per-tool event lists and they must render nested.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../src/types/generated/"))]
pub struct ToolEvent {
    #[serde(flatten)]
    pub common: EventCommon,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub function: String,
    #[serde(default)]
    pub arguments: Value,
    #[serde(default)]
    pub result: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[ts(type = "Array<Record<string, unknown>>")]
    pub events: Vec<Event>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_time: Option<f64>,
    /// Agent name when the call was a handoff.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed: Option<bool>,
}

/// Sub-task (or forked execution) with its own embedded transcript.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../src/types/generated/"))]
pub struct SubtaskEvent {
    #[serde(flatten)]
    pub common: EventCommon,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub subtask_type: Option<String>,
    #[serde(default)]
    pub input: Value,
    #[serde(default)]
    pub result: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[ts(type = "Array<Record<string, unknown>>")]
    pub events: Vec<Event>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_time: Option<f64>,
}

/// Tool-call approval decision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../src/types/generated/"))]
pub struct ApprovalEvent {
    #[serde(flatten)]
    pub common: EventCommon,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub call: Value,
    #[serde(default)]
    pub approver: String,
    #[serde(default)]
    pub decision: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Interactive input screen session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../src/types/generated/"))]
pub struct InputEvent {
    #[serde(flatten)]
    pub common: EventCommon,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub input_ansi: String,
}

/// Final or intermediate score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../src/types/generated/"))]
pub struct ScoreEvent {
    #[serde(flatten)]
    pub common: EventCommon,
    #[serde(default)]
    pub score: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Value>,
    #[serde(default)]
    pub intermediate: bool,
}

/// Log record emitted through the producer's logging facade.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../src/types/generated/"))]
pub struct LoggerEvent {
    #[serde(flatten)]
    pub common: EventCommon,
    #[serde(default)]
    pub message: Value,
}

/// Free-form info/data record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../src/types/generated/"))]
pub struct InfoEvent {
    #[serde(flatten)]
    pub common: EventCommon,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub data: Value,
}

/// Sandbox execution or file I/O.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../src/types/generated/"))]
pub struct SandboxEvent {
    #[serde(flatten)]
    pub common: EventCommon,
    #[serde(default)]
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<String>,
}

/// Error raised while processing the sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../src/types/generated/"))]
pub struct ErrorEvent {
    #[serde(flatten)]
    pub common: EventCommon,
    #[serde(default)]
    pub error: Value,
}

/// Begin/end marker for a named step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../src/types/generated/"))]
pub struct StepEvent {
    #[serde(flatten)]
    pub common: EventCommon,
    pub action: StepAction,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub step_type: Option<String>,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../src/types/generated/"))]
#[serde(rename_all = "lowercase")]
pub enum StepAction {
    Begin,
    End,
}

/// Begin marker for a span (newer producers emit spans alongside steps).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../src/types/generated/"))]
pub struct SpanBeginEvent {
    #[serde(flatten)]
    pub common: EventCommon,
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub span_type: Option<String>,
    #[serde(default)]
    pub name: String,
}

/// End marker for a span.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../src/types/generated/"))]
pub struct SpanEndEvent {
    #[serde(flatten)]
    pub common: EventCommon,
    #[serde(default)]
    pub id: String,
}

/// One record in the execution transcript.
///
/// Serializes back to the wire shape (payload fields plus the `event`
/// discriminant); `Unknown` round-trips its raw value untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    SampleInit(SampleInitEvent),
    SampleLimit(SampleLimitEvent),
    State(StateEvent),
    Store(StoreEvent),
    Model(ModelEvent),
    Tool(ToolEvent),
    Subtask(SubtaskEvent),
    Approval(ApprovalEvent),
    Input(InputEvent),
    Score(ScoreEvent),
    Logger(LoggerEvent),
    Info(InfoEvent),
    Sandbox(SandboxEvent),
    Error(ErrorEvent),
    Step(StepEvent),
    SpanBegin(SpanBeginEvent),
    SpanEnd(SpanEndEvent),
    /// Kind this crate does not recognize. Kept verbatim so the record still
    /// occupies its position in the transcript.
    Unknown(Value),
}

impl Event {
    /// Decode a raw JSON object into an event.
    ///
    /// Never fails: an unrecognized `event` discriminant, a missing
    /// discriminant, or a payload the typed decoder rejects all fall back to
    /// [`Event::Unknown`] with the raw value preserved.
    pub fn from_value(value: Value) -> Event {
        let kind = value
            .get("event")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        fn decode<T: serde::de::DeserializeOwned>(
            value: Value,
            wrap: fn(T) -> Event,
        ) -> Event {
            match serde_json::from_value::<T>(value.clone()) {
                Ok(inner) => wrap(inner),
                Err(_) => Event::Unknown(value),
            }
        }

        match kind.as_str() {
            "sample_init" => decode(value, Event::SampleInit),
            "sample_limit" => decode(value, Event::SampleLimit),
            "state" => decode(value, Event::State),
            "store" => decode(value, Event::Store),
            "model" => decode(value, Event::Model),
            "tool" => decode(value, Event::Tool),
            "subtask" => decode(value, Event::Subtask),
            "approval" => decode(value, Event::Approval),
            "input" => decode(value, Event::Input),
            "score" => decode(value, Event::Score),
            "logger" => decode(value, Event::Logger),
            "info" => decode(value, Event::Info),
            "sandbox" => decode(value, Event::Sandbox),
            "error" => decode(value, Event::Error),
            "step" => decode(value, Event::Step),
            "span_begin" => decode(value, Event::SpanBegin),
            "span_end" => decode(value, Event::SpanEnd),
            _ => Event::Unknown(value),
        }
    }

    /// Wire discriminant for this event.
    pub fn kind(&self) -> &str {
        match self {
            Event::SampleInit(_) => "sample_init",
            Event::SampleLimit(_) => "sample_limit",
            Event::State(_) => "state",
            Event::Store(_) => "store",
            Event::Model(_) => "model",
            Event::Tool(_) => "tool",
            Event::Subtask(_) => "subtask",
            Event::Approval(_) => "approval",
            Event::Input(_) => "input",
            Event::Score(_) => "score",
            Event::Logger(_) => "logger",
            Event::Info(_) => "info",
            Event::Sandbox(_) => "sandbox",
            Event::Error(_) => "error",
            Event::Step(_) => "step",
            Event::SpanBegin(_) => "span_begin",
            Event::SpanEnd(_) => "span_end",
            Event::Unknown(raw) => raw
                .get("event")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown"),
        }
    }

    /// Common fields, when the event decoded to a known kind.
    pub fn common(&self) -> Option<&EventCommon> {
        match self {
            Event::SampleInit(ev) => Some(&ev.common),
            Event::SampleLimit(ev) => Some(&ev.common),
            Event::State(ev) => Some(&ev.common),
            Event::Store(ev) => Some(&ev.common),
            Event::Model(ev) => Some(&ev.common),
            Event::Tool(ev) => Some(&ev.common),
            Event::Subtask(ev) => Some(&ev.common),
            Event::Approval(ev) => Some(&ev.common),
            Event::Input(ev) => Some(&ev.common),
            Event::Score(ev) => Some(&ev.common),
            Event::Logger(ev) => Some(&ev.common),
            Event::Info(ev) => Some(&ev.common),
            Event::Sandbox(ev) => Some(&ev.common),
            Event::Error(ev) => Some(&ev.common),
            Event::Step(ev) => Some(&ev.common),
            Event::SpanBegin(ev) => Some(&ev.common),
            Event::SpanEnd(ev) => Some(&ev.common),
            Event::Unknown(_) => None,
        }
    }

    /// Timestamp string ("" when the record carries none).
    pub fn timestamp(&self) -> &str {
        match self {
            Event::Unknown(raw) => raw
                .get("timestamp")
                .and_then(|v| v.as_str())
                .unwrap_or_default(),
            _ => self.common().map(|c| c.timestamp.as_str()).unwrap_or_default(),
        }
    }

    /// Whether the record is provisional (explicit `pending: true`).
    pub fn is_pending(&self) -> bool {
        match self {
            Event::Unknown(raw) => {
                raw.get("pending").and_then(|v| v.as_bool()) == Some(true)
            }
            _ => self
                .common()
                .map(|c| c.pending == Some(true))
                .unwrap_or(false),
        }
    }

    /// Embedded sub-transcript for kinds that carry one.
    pub fn embedded_events(&self) -> Option<&[Event]> {
        match self {
            Event::Tool(ev) => Some(&ev.events),
            Event::Subtask(ev) => Some(&ev.events),
            _ => None,
        }
    }

    /// Re-encode to the wire shape.
    pub fn to_value(&self) -> Value {
        fn tagged<T: Serialize>(kind: &str, inner: &T) -> Value {
            let mut value = serde_json::to_value(inner).unwrap_or(Value::Null);
            if let Value::Object(map) = &mut value {
                map.insert("event".to_string(), Value::String(kind.to_string()));
            }
            value
        }

        match self {
            Event::SampleInit(ev) => tagged("sample_init", ev),
            Event::SampleLimit(ev) => tagged("sample_limit", ev),
            Event::State(ev) => tagged("state", ev),
            Event::Store(ev) => tagged("store", ev),
            Event::Model(ev) => tagged("model", ev),
            Event::Tool(ev) => tagged("tool", ev),
            Event::Subtask(ev) => tagged("subtask", ev),
            Event::Approval(ev) => tagged("approval", ev),
            Event::Input(ev) => tagged("input", ev),
            Event::Score(ev) => tagged("score", ev),
            Event::Logger(ev) => tagged("logger", ev),
            Event::Info(ev) => tagged("info", ev),
            Event::Sandbox(ev) => tagged("sandbox", ev),
            Event::Error(ev) => tagged("error", ev),
            Event::Step(ev) => tagged("step", ev),
            Event::SpanBegin(ev) => tagged("span_begin", ev),
            Event::SpanEnd(ev) => tagged("span_end", ev),
            Event::Unknown(raw) => raw.clone(),
        }
    }
}

impl Serialize for Event {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Event {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Event::from_value(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_step_event_round_trip() {
        let json = r#"{"event":"step","action":"begin","name":"solver","timestamp":"2026-02-01T09:00:00Z"}"#;
        let event: Event = serde_json::from_str(json).unwrap();

        match &event {
            Event::Step(step) => {
                assert_eq!(step.action, StepAction::Begin);
                assert_eq!(step.name, "solver");
                assert_eq!(step.common.timestamp, "2026-02-01T09:00:00Z");
            }
            other => panic!("Expected Step event, got: {:?}", other),
        }

        let back = event.to_value();
        assert_eq!(back.get("event").unwrap(), "step");
        assert_eq!(back.get("action").unwrap(), "begin");
        assert_eq!(back.get("name").unwrap(), "solver");
    }

    #[test]
    fn test_unknown_kind_preserved() {
        let raw = json!({"event":"telemetry","timestamp":"2026-02-01T09:00:00Z","payload":{"a":1}});
        let event = Event::from_value(raw.clone());

        assert!(matches!(event, Event::Unknown(_)));
        assert_eq!(event.kind(), "telemetry");
        assert_eq!(event.timestamp(), "2026-02-01T09:00:00Z");
        assert_eq!(event.to_value(), raw);
    }

    #[test]
    fn test_missing_discriminant_is_unknown() {
        let event = Event::from_value(json!({"timestamp":"2026-02-01T09:00:00Z"}));
        assert!(matches!(event, Event::Unknown(_)));
        assert_eq!(event.kind(), "unknown");
    }

    #[test]
    fn test_state_event_changes_decode() {
        let json = r#"{"event":"state","timestamp":"t","changes":[{"op":"add","path":"/messages/0","value":{"role":"system"}}]}"#;
        let event: Event = serde_json::from_str(json).unwrap();

        match event {
            Event::State(state) => {
                assert_eq!(state.changes.len(), 1);
                assert_eq!(state.changes[0].path, "/messages/0");
            }
            other => panic!("Expected State event, got: {:?}", other),
        }
    }

    #[test]
    fn test_pending_flag() {
        let pending = Event::from_value(json!({"event":"model","model":"mockllm","pending":true}));
        let committed = Event::from_value(json!({"event":"model","model":"mockllm"}));
        assert!(pending.is_pending());
        assert!(!committed.is_pending());
    }

    #[test]
    fn test_subtask_embedded_events() {
        let raw = json!({
            "event": "subtask",
            "name": "search",
            "timestamp": "t",
            "events": [
                {"event":"model","model":"mockllm","timestamp":"t1"},
                {"event":"info","data":"done","timestamp":"t2"}
            ]
        });
        let event = Event::from_value(raw);

        let embedded = event.embedded_events().unwrap();
        assert_eq!(embedded.len(), 2);
        assert_eq!(embedded[0].kind(), "model");
        assert_eq!(embedded[1].kind(), "info");
    }

    #[test]
    fn test_tool_event_missing_fields_tolerated() {
        // Older transcripts omit result/completed entirely.
        let event = Event::from_value(json!({"event":"tool","id":"t1","function":"bash"}));
        match event {
            Event::Tool(tool) => {
                assert_eq!(tool.function, "bash");
                assert_eq!(tool.result, Value::Null);
                assert!(tool.events.is_empty());
            }
            other => panic!("Expected Tool event, got: {:?}", other),
        }
    }

    #[test]
    fn test_span_markers_decode() {
        let begin = Event::from_value(json!({"event":"span_begin","id":"s1","name":"solver"}));
        let end = Event::from_value(json!({"event":"span_end","id":"s1"}));
        assert!(matches!(begin, Event::SpanBegin(_)));
        assert!(matches!(end, Event::SpanEnd(_)));
    }

    #[test]
    fn test_serialize_omits_absent_options() {
        let event = Event::from_value(json!({"event":"info","data":"x","timestamp":"t"}));
        let text = serde_json::to_string(&event).unwrap();
        assert!(!text.contains("working_start"));
        assert!(!text.contains("pending"));
        assert!(!text.contains("source"));
    }
}
