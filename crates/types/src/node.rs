// crates/types/src/node.rs
//! Forest nodes, run status, and caller-owned view state.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::event::Event;

/// One node in the reconstructed event forest.
///
/// Ownership is strictly top-down: a node owns its `children` and nodes are
/// never shared between parents. `id` is positional
/// (`"<view_id>-event<index>"`) and stable across refreshes of an append-only
/// stream; it is what per-node UI state is keyed by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../src/types/generated/"))]
pub struct EventNode {
    pub id: String,
    #[ts(type = "Record<string, unknown>")]
    pub event: Event,
    pub children: Vec<EventNode>,
    pub depth: usize,
}

impl EventNode {
    pub fn new(id: impl Into<String>, event: Event, depth: usize) -> Self {
        Self {
            id: id.into(),
            event,
            children: Vec::new(),
            depth,
        }
    }

    /// Total node count of this subtree (including self).
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(EventNode::subtree_len).sum::<usize>()
    }

    /// Depth-first pre-order visit of this subtree.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a EventNode)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }
}

/// Caller-owned UI state for one node (expand/collapse, selected sub-view).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct NodeUiState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_nav: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapsed: Option<bool>,
}

/// Per-node UI state, keyed by stable node id. Owned by the view layer; the
/// engine only re-keys it against a freshly built forest.
pub type UiStateMap = HashMap<String, NodeUiState>;

/// Top-level status of the log being viewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../src/types/generated/"))]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[serde(alias = "running")]
    Started,
    Success,
    Cancelled,
    Error,
}

impl RunStatus {
    /// Whether the log is still growing and worth polling.
    pub fn is_running(&self) -> bool {
        matches!(self, RunStatus::Started)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_running()
    }
}

/// A fetched transcript: the full event list plus the producer's side table
/// of de-duplicated large content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../src/types/generated/"))]
pub struct Transcript {
    #[serde(default)]
    #[ts(type = "Array<Record<string, unknown>>")]
    pub events: Vec<Event>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attachments: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RunStatus>,
}

impl Transcript {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
