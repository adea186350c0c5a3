// crates/core/src/attachments.rs
//! Attachment reference resolution.
//!
//! The producer de-duplicates large content fields (images, repeated
//! messages) into a per-transcript side table and replaces occurrences with
//! `attachment://<hash>` references. Resolution restores the content before
//! display; a reference with no table entry stays verbatim rather than
//! failing the record.

use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;
use trace_view_types::{Event, Transcript};

/// URI scheme marking a de-duplicated content reference.
pub const ATTACHMENT_PROTOCOL: &str = "attachment://";

/// Replace every `attachment://<hash>` string in `value` with its side-table
/// content, recursively. Unresolvable references are left untouched.
pub fn resolve_attachment_refs(value: &mut Value, attachments: &HashMap<String, String>) {
    match value {
        Value::String(text) => {
            if let Some(hash) = text.strip_prefix(ATTACHMENT_PROTOCOL) {
                match attachments.get(hash) {
                    Some(content) => *text = content.clone(),
                    None => debug!(hash, "attachment reference with no table entry"),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                resolve_attachment_refs(item, attachments);
            }
        }
        Value::Object(map) => {
            for item in map.values_mut() {
                resolve_attachment_refs(item, attachments);
            }
        }
        _ => {}
    }
}

/// Resolve one event's payload against the side table.
///
/// Runs through the wire representation so references buried anywhere in the
/// payload (including embedded sub-transcripts) are covered.
pub fn resolve_event(event: Event, attachments: &HashMap<String, String>) -> Event {
    if attachments.is_empty() {
        return event;
    }
    let mut value = event.to_value();
    resolve_attachment_refs(&mut value, attachments);
    Event::from_value(value)
}

/// Resolve every event in a transcript in place.
pub fn resolve_transcript(transcript: &mut Transcript) {
    if transcript.attachments.is_empty() {
        return;
    }
    let attachments = std::mem::take(&mut transcript.attachments);
    transcript.events = transcript
        .events
        .drain(..)
        .map(|event| resolve_event(event, &attachments))
        .collect();
    transcript.attachments = attachments;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("abc123".to_string(), "the full prompt text".to_string());
        map
    }

    #[test]
    fn test_resolve_nested_reference() {
        let mut value = json!({
            "input": [{"role": "system", "content": "attachment://abc123"}],
            "count": 3
        });
        resolve_attachment_refs(&mut value, &table());

        assert_eq!(
            value["input"][0]["content"],
            json!("the full prompt text")
        );
        assert_eq!(value["count"], json!(3));
    }

    #[test]
    fn test_unresolvable_reference_left_verbatim() {
        let mut value = json!({"content": "attachment://missing"});
        resolve_attachment_refs(&mut value, &table());
        assert_eq!(value["content"], json!("attachment://missing"));
    }

    #[test]
    fn test_plain_strings_untouched() {
        let mut value = json!({"content": "no reference here"});
        resolve_attachment_refs(&mut value, &table());
        assert_eq!(value["content"], json!("no reference here"));
    }

    #[test]
    fn test_resolve_event_payload() {
        let event = Event::from_value(json!({
            "event": "model",
            "model": "mockllm",
            "timestamp": "t",
            "input": [{"role": "system", "content": "attachment://abc123"}]
        }));

        let resolved = resolve_event(event, &table());
        match resolved {
            Event::Model(model) => {
                assert_eq!(model.input[0]["content"], json!("the full prompt text"));
            }
            other => panic!("Expected model event, got: {:?}", other),
        }
    }

    #[test]
    fn test_resolve_transcript_in_place() {
        let mut transcript: Transcript = serde_json::from_value(json!({
            "events": [
                {"event":"info","data":"attachment://abc123","timestamp":"t"}
            ],
            "attachments": {"abc123": "the full prompt text"}
        }))
        .unwrap();

        resolve_transcript(&mut transcript);

        match &transcript.events[0] {
            Event::Info(info) => assert_eq!(info.data, json!("the full prompt text")),
            other => panic!("Expected info event, got: {:?}", other),
        }
        // Side table itself is kept for later lookups.
        assert!(!transcript.attachments.is_empty());
    }

    #[test]
    fn test_empty_table_short_circuits() {
        let event = Event::from_value(json!({"event":"info","data":"attachment://x","timestamp":"t"}));
        let resolved = resolve_event(event.clone(), &HashMap::new());
        assert_eq!(resolved, event);
    }
}
