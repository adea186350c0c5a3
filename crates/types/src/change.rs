// crates/types/src/change.rs
//! Structural diff records.
//!
//! `state` and `store` events carry an ordered list of these; they are the
//! only mechanism for deriving state (there is no full-snapshot event kind).
//! The wire shape is the standard `{op, path, value?, from?}` pointer-diff
//! format and must not be altered.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use ts_rs::TS;

/// One structural diff operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../src/types/generated/"))]
#[serde(rename_all = "lowercase")]
pub enum ChangeOp {
    Add,
    Remove,
    Replace,
    Move,
    Copy,
    Test,
}

impl ChangeOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeOp::Add => "add",
            ChangeOp::Remove => "remove",
            ChangeOp::Replace => "replace",
            ChangeOp::Move => "move",
            ChangeOp::Copy => "copy",
            ChangeOp::Test => "test",
        }
    }
}

impl fmt::Display for ChangeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structural diff record attached to a state-mutating event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../src/types/generated/"))]
pub struct ChangeRecord {
    pub op: ChangeOp,
    /// `/`-delimited pointer path with `~0`/`~1` escapes.
    pub path: String,
    /// Payload for `add`/`replace`/`test`. Older logs omit this on `add`;
    /// replay coerces the absence to `null` rather than rejecting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Source path for `move`/`copy`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Value displaced by a `replace`/`remove`, when the producer recorded it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaced: Option<Value>,
}

impl ChangeRecord {
    pub fn add(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: ChangeOp::Add,
            path: path.into(),
            value: Some(value),
            from: None,
            replaced: None,
        }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self {
            op: ChangeOp::Remove,
            path: path.into(),
            value: None,
            from: None,
            replaced: None,
        }
    }

    pub fn replace(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: ChangeOp::Replace,
            path: path.into(),
            value: Some(value),
            from: None,
            replaced: None,
        }
    }

    pub fn move_from(from: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            op: ChangeOp::Move,
            path: path.into(),
            value: None,
            from: Some(from.into()),
            replaced: None,
        }
    }

    pub fn copy_from(from: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            op: ChangeOp::Copy,
            path: path.into(),
            value: None,
            from: Some(from.into()),
            replaced: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_change_op_display() {
        assert_eq!(ChangeOp::Add.to_string(), "add");
        assert_eq!(ChangeOp::Remove.to_string(), "remove");
        assert_eq!(ChangeOp::Replace.to_string(), "replace");
    }

    #[test]
    fn test_wire_shape_round_trip() {
        let json = r#"{"op":"add","path":"/messages/0","value":{"role":"system"}}"#;
        let record: ChangeRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.op, ChangeOp::Add);
        assert_eq!(record.path, "/messages/0");
        assert_eq!(record.value, Some(json!({"role":"system"})));

        let back = serde_json::to_string(&record).unwrap();
        assert!(back.contains("\"op\":\"add\""));
        assert!(!back.contains("\"from\""));
        assert!(!back.contains("\"replaced\""));
    }

    #[test]
    fn test_add_without_value_decodes() {
        // Legacy shape: older logs omit value on add.
        let record: ChangeRecord =
            serde_json::from_str(r#"{"op":"add","path":"/output"}"#).unwrap();
        assert_eq!(record.value, None);
    }

    #[test]
    fn test_move_carries_from() {
        let record: ChangeRecord =
            serde_json::from_str(r#"{"op":"move","path":"/b","from":"/a"}"#).unwrap();
        assert_eq!(record.op, ChangeOp::Move);
        assert_eq!(record.from.as_deref(), Some("/a"));
    }

    #[test]
    fn test_builders() {
        let record = ChangeRecord::replace("/tools", json!([]));
        assert_eq!(record.op, ChangeOp::Replace);
        assert_eq!(record.path, "/tools");

        let record = ChangeRecord::copy_from("/a", "/b");
        assert_eq!(record.from.as_deref(), Some("/a"));
        assert_eq!(record.path, "/b");
    }
}
