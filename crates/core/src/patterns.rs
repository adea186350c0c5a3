// crates/core/src/patterns.rs
//! Change summarization and recognized change shapes.
//!
//! Raw structural diffs are unreadable for the producer's high-frequency
//! mutations ("a system prompt was installed"), so a small ordered registry
//! of declarative signatures maps known batch shapes to a higher-level
//! preview. Everything else falls back to the generic [`summarize`] line.

use serde_json::Value;
use trace_view_types::{ChangeOp, ChangeRecord};

/// Op-count threshold above which [`summarize`] collapses to group counts.
const SUMMARY_PATH_LIMIT: usize = 2;

/// Compact one-line synopsis of a change batch.
///
/// Small batches stay literal (`"add /a, remove /b"`); anything over
/// [`SUMMARY_PATH_LIMIT`] ops collapses each op group to a count
/// (`"add 3, remove 1"`). Groups appear in first-occurrence order.
pub fn summarize(changes: &[ChangeRecord]) -> String {
    if changes.is_empty() {
        return String::new();
    }

    let mut groups: Vec<(ChangeOp, Vec<&str>)> = Vec::new();
    for change in changes {
        match groups.iter_mut().find(|(op, _)| *op == change.op) {
            Some((_, paths)) => paths.push(&change.path),
            None => groups.push((change.op, vec![&change.path])),
        }
    }

    let parts: Vec<String> = if changes.len() > SUMMARY_PATH_LIMIT {
        groups
            .iter()
            .map(|(op, paths)| format!("{} {}", op, paths.len()))
            .collect()
    } else {
        groups
            .iter()
            .map(|(op, paths)| format!("{} {}", op, paths.join(", ")))
            .collect()
    };

    parts.join(", ")
}

/// The exact set of paths a recognized shape expects a batch to touch,
/// per op.
pub struct ChangeSignature {
    pub add: &'static [&'static str],
    pub replace: &'static [&'static str],
    pub remove: &'static [&'static str],
}

impl ChangeSignature {
    fn total(&self) -> usize {
        self.add.len() + self.replace.len() + self.remove.len()
    }

    fn matches(&self, change: &ChangeRecord) -> bool {
        let paths = match change.op {
            ChangeOp::Add => self.add,
            ChangeOp::Replace => self.replace,
            ChangeOp::Remove => self.remove,
            _ => return false,
        };
        paths.contains(&change.path.as_str())
    }
}

type RenderFn = fn(&[ChangeRecord]) -> String;

/// One registered shape: a name, the signature it requires, and its preview
/// renderer.
pub struct ChangePattern {
    pub name: &'static str,
    pub signature: ChangeSignature,
    render: RenderFn,
}

/// A matched preview, rendered from the batch.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PatternPreview {
    pub pattern: &'static str,
    pub text: String,
}

/// Registry consulted in order; the first signature whose matching-op count
/// equals its required total wins. Extra ops in the batch beyond the
/// signature do not disqualify a match.
static PATTERNS: &[ChangePattern] = &[
    ChangePattern {
        name: "system_message",
        signature: ChangeSignature {
            add: &["/messages/0", "/tools", "/tool_choice"],
            replace: &[],
            remove: &[],
        },
        render: render_system_message,
    },
    ChangePattern {
        name: "tool_config",
        signature: ChangeSignature {
            add: &[],
            replace: &["/tools", "/tool_choice"],
            remove: &[],
        },
        render: render_tool_config,
    },
    ChangePattern {
        name: "message_appended",
        signature: ChangeSignature {
            add: &["/messages/-"],
            replace: &[],
            remove: &[],
        },
        render: render_message_appended,
    },
];

/// Match a batch against the registry. At most one pattern applies per batch;
/// `None` means only the generic diff/summary should be shown.
pub fn preview_changes(changes: &[ChangeRecord]) -> Option<PatternPreview> {
    PATTERNS.iter().find_map(|pattern| {
        let matched = changes
            .iter()
            .filter(|change| pattern.signature.matches(change))
            .count();
        (matched == pattern.signature.total()).then(|| PatternPreview {
            pattern: pattern.name,
            text: (pattern.render)(changes),
        })
    })
}

/// Preview line for a batch: the matched pattern's rendering when one
/// applies, otherwise the generic [`summarize`] line.
pub fn change_preview_text(changes: &[ChangeRecord]) -> String {
    match preview_changes(changes) {
        Some(preview) => preview.text,
        None => summarize(changes),
    }
}

fn render_system_message(changes: &[ChangeRecord]) -> String {
    let content = find_value(changes, ChangeOp::Add, "/messages/0")
        .map(message_text)
        .unwrap_or_default();
    let tools = find_value(changes, ChangeOp::Add, "/tools")
        .and_then(Value::as_array)
        .map(|tools| tools.len())
        .unwrap_or(0);

    if content.is_empty() {
        format!("System message installed with {} tool(s)", tools)
    } else {
        format!(
            "System message installed with {} tool(s): {}",
            tools,
            truncate(&content, 80)
        )
    }
}

fn render_tool_config(changes: &[ChangeRecord]) -> String {
    let tools = find_value(changes, ChangeOp::Replace, "/tools")
        .and_then(Value::as_array)
        .map(|tools| tools.len())
        .unwrap_or(0);
    let choice = find_value(changes, ChangeOp::Replace, "/tool_choice")
        .map(choice_text)
        .unwrap_or_else(|| "auto".to_string());
    format!("Tool configuration updated: {} tool(s), choice {}", tools, choice)
}

fn render_message_appended(changes: &[ChangeRecord]) -> String {
    let role = find_value(changes, ChangeOp::Add, "/messages/-")
        .and_then(|value| value.get("role"))
        .and_then(Value::as_str)
        .unwrap_or("message");
    format!("Appended {} message", role)
}

fn find_value<'a>(changes: &'a [ChangeRecord], op: ChangeOp, path: &str) -> Option<&'a Value> {
    changes
        .iter()
        .find(|change| change.op == op && change.path == path)
        .and_then(|change| change.value.as_ref())
}

/// Message content can be a plain string or a list of content blocks.
fn message_text(message: &Value) -> String {
    match message.get("content") {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(blocks)) => blocks
            .iter()
            .filter_map(|block| block.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

fn choice_text(choice: &Value) -> String {
    match choice {
        Value::String(name) => name.clone(),
        Value::Object(map) => map
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("function")
            .to_string(),
        _ => "auto".to_string(),
    }
}

fn truncate(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    // Back off to a char boundary before cutting.
    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}
