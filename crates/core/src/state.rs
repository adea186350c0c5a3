// crates/core/src/state.rs
//! State replay from structural diff records.
//!
//! Resolved state exists only as the result of folding an ordered change
//! sequence over a baseline; there is no snapshot event kind. Replay is
//! deliberately lenient: transcripts are display data, so a malformed record
//! degrades (logged at debug) instead of failing the view.

use serde_json::{Map, Value};
use tracing::debug;
use trace_view_types::{ChangeOp, ChangeRecord, Event};

/// Apply an ordered change list against a deep copy of `base`.
///
/// The caller's value is never mutated. Per-op semantics:
/// - `add` / `replace` write at `path`, creating missing intermediate
///   containers (array when the next segment is numeric or `-`, object
///   otherwise). Array `add` inserts and shifts right, `-` appends; object
///   `add` sets the key. An `add` with no `value` writes `null` — older logs
///   omit the field, so absence is coerced rather than rejected.
/// - `remove` deletes at `path`; a missing target is a no-op.
/// - `move` / `copy` read `from` and write `path`.
/// - `test` is informational only and never enforced; a producer's malformed
///   diff must not take down the display.
pub fn apply_changes(base: &Value, changes: &[ChangeRecord]) -> Value {
    let mut state = base.clone();
    for change in changes {
        apply_change(&mut state, change);
    }
    state
}

fn apply_change(state: &mut Value, change: &ChangeRecord) {
    match change.op {
        ChangeOp::Add => {
            if change.value.is_none() {
                debug!(path = %change.path, "add with no value; writing null");
            }
            let value = change.value.clone().unwrap_or(Value::Null);
            write_value(state, &change.path, value, WriteMode::Insert);
        }
        ChangeOp::Replace => {
            let value = change.value.clone().unwrap_or(Value::Null);
            write_value(state, &change.path, value, WriteMode::Set);
        }
        ChangeOp::Remove => remove_value(state, &change.path),
        ChangeOp::Move => match &change.from {
            Some(from) => {
                if let Some(value) = state.pointer(from).cloned() {
                    remove_value(state, from);
                    write_value(state, &change.path, value, WriteMode::Insert);
                } else {
                    debug!(from = %from, "move source missing; skipping");
                }
            }
            None => debug!(path = %change.path, "move with no from; skipping"),
        },
        ChangeOp::Copy => match &change.from {
            Some(from) => {
                if let Some(value) = state.pointer(from).cloned() {
                    write_value(state, &change.path, value, WriteMode::Insert);
                } else {
                    debug!(from = %from, "copy source missing; skipping");
                }
            }
            None => debug!(path = %change.path, "copy with no from; skipping"),
        },
        // Not enforced: a failed assertion is the producer's problem, not the
        // viewer's.
        ChangeOp::Test => {}
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    /// Array targets insert and shift right (`-` appends).
    Insert,
    /// Array targets overwrite in place, extending with nulls as needed.
    Set,
}

fn write_value(state: &mut Value, path: &str, value: Value, mode: WriteMode) {
    if path.is_empty() {
        *state = value;
        return;
    }
    if !path.starts_with('/') {
        debug!(path = %path, "pointer path without leading slash; skipping");
        return;
    }

    let segments = pointer_segments(path);
    let Some((last, parents)) = segments.split_last() else {
        *state = value;
        return;
    };

    let mut cursor = state;
    for segment in parents {
        cursor = descend_mut(cursor, segment);
    }
    write_into(cursor, last, value, mode);
}

/// Step one segment down, creating the container a missing or scalar slot
/// needs to hold it.
fn descend_mut<'a>(cursor: &'a mut Value, segment: &str) -> &'a mut Value {
    match cursor {
        Value::Object(map) => map.entry(segment.to_string()).or_insert(Value::Null),
        Value::Array(items) => {
            let index = array_index(segment, items.len());
            if index >= items.len() {
                items.resize(index + 1, Value::Null);
            }
            &mut items[index]
        }
        other => {
            *other = empty_container(segment);
            descend_mut(other, segment)
        }
    }
}

fn write_into(container: &mut Value, segment: &str, value: Value, mode: WriteMode) {
    match container {
        Value::Object(map) => {
            map.insert(segment.to_string(), value);
        }
        Value::Array(items) => {
            if segment == "-" {
                items.push(value);
                return;
            }
            match segment.parse::<usize>() {
                Ok(index) if mode == WriteMode::Insert => {
                    items.insert(index.min(items.len()), value);
                }
                Ok(index) => {
                    if index >= items.len() {
                        items.resize(index + 1, Value::Null);
                    }
                    items[index] = value;
                }
                Err(_) => {
                    debug!(segment = %segment, "non-numeric index into array; appending");
                    items.push(value);
                }
            }
        }
        other => {
            *other = empty_container(segment);
            write_into(other, segment, value, mode);
        }
    }
}

fn remove_value(state: &mut Value, path: &str) {
    if path.is_empty() {
        *state = Value::Null;
        return;
    }
    let Some((parent_path, last_raw)) = path.rsplit_once('/') else {
        debug!(path = %path, "pointer path without leading slash; skipping");
        return;
    };
    let Some(parent) = state.pointer_mut(parent_path) else {
        debug!(path = %path, "remove target missing; skipping");
        return;
    };

    let key = unescape(last_raw);
    match parent {
        Value::Object(map) => {
            if map.remove(&key).is_none() {
                debug!(path = %path, "remove target missing; skipping");
            }
        }
        Value::Array(items) => match key.parse::<usize>() {
            Ok(index) if index < items.len() => {
                items.remove(index);
            }
            _ => debug!(path = %path, "remove index out of range; skipping"),
        },
        _ => debug!(path = %path, "remove parent is not a container; skipping"),
    }
}

fn pointer_segments(path: &str) -> Vec<String> {
    path.split('/').skip(1).map(unescape).collect()
}

fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

fn is_index_segment(segment: &str) -> bool {
    segment == "-" || segment.parse::<usize>().is_ok()
}

fn array_index(segment: &str, len: usize) -> usize {
    if segment == "-" {
        len
    } else {
        segment.parse::<usize>().unwrap_or(len)
    }
}

fn empty_container(segment: &str) -> Value {
    if is_index_segment(segment) {
        Value::Array(Vec::new())
    } else {
        Value::Object(Map::new())
    }
}

/// A before/after pair from one replay step, ready for diffing or preview
/// matching.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StateTransition {
    pub before: Value,
    pub after: Value,
}

/// Incremental replay over a transcript's change batches.
///
/// Holds the running resolved value so walking a long transcript costs one
/// apply per batch instead of replaying from the baseline every time.
#[derive(Debug, Clone)]
pub struct StateAccumulator {
    state: Value,
}

impl StateAccumulator {
    pub fn new(baseline: Value) -> Self {
        Self { state: baseline }
    }

    pub fn current(&self) -> &Value {
        &self.state
    }

    /// Apply one batch and return the surrounding before/after pair.
    pub fn advance(&mut self, changes: &[ChangeRecord]) -> StateTransition {
        let before = self.state.clone();
        self.state = apply_changes(&self.state, changes);
        StateTransition {
            before,
            after: self.state.clone(),
        }
    }
}

/// Resolve the final task state of a transcript: baseline from the
/// `sample_init` event, then every `state` batch folded in order.
///
/// Returns `None` when the transcript has no `sample_init` (there is no
/// baseline to replay against).
pub fn resolve_sample_state(events: &[Event]) -> Option<Value> {
    let baseline = events.iter().find_map(|event| match event {
        Event::SampleInit(init) => Some(init.state.clone()),
        _ => None,
    })?;

    let mut accumulator = StateAccumulator::new(baseline);
    for event in events {
        if let Event::State(state) = event {
            accumulator.advance(&state.changes);
        }
    }
    Some(accumulator.state)
}

/// Reconstruct the shared store by replaying every `store` batch over an
/// empty object.
pub fn store_from_events(events: &[Event]) -> Value {
    let mut accumulator = StateAccumulator::new(Value::Object(Map::new()));
    for event in events {
        if let Event::Store(store) = event {
            accumulator.advance(&store.changes);
        }
    }
    accumulator.state
}

/// Unified text diff of two resolved states, for the generic "what changed"
/// rendering when no pattern preview applies.
pub fn render_state_diff(before: &Value, after: &Value) -> String {
    let before_text = to_pretty(before);
    let after_text = to_pretty(after);
    similar::TextDiff::from_lines(&before_text, &after_text)
        .unified_diff()
        .header("before", "after")
        .to_string()
}

fn to_pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}
