// crates/core/src/live.rs
//! Live-stream reconciliation.
//!
//! For a running log the caller re-fetches the full event list on a timer and
//! invokes [`refresh_view`] each poll. The pipeline below is the only piece
//! aware that "this ran before": it re-runs normalization and treeification
//! from scratch, then re-keys the caller-owned UI-state map against the new
//! forest. Identifiers are positional, so append-only growth keeps every
//! previously issued id pointing at the same logical event and expand/collapse
//! state survives the refresh untouched.

use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;
use trace_view_types::{Event, EventNode, RunStatus, UiStateMap};

use crate::normalize::normalize;
use crate::tree::treeify;

/// Result of one live refresh, ready to publish to the view layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveRefresh {
    pub nodes: Vec<EventNode>,
    /// The previous map re-keyed against the new forest.
    pub ui_state: UiStateMap,
    /// False once the log's status left "running"; the poll loop must stop.
    pub continue_polling: bool,
}

/// Build the forest for a finished log.
///
/// Static logs never carry pending events, so the normalizer drops any that
/// do appear.
pub fn build_view(view_id: &str, events: &[Event], base_depth: usize) -> Vec<EventNode> {
    treeify(view_id, &normalize(events, false), base_depth)
}

/// Rebuild the forest for a running log and carry the UI-state map across.
pub fn refresh_view(
    view_id: &str,
    events: &[Event],
    status: RunStatus,
    prev_ui_state: &UiStateMap,
    base_depth: usize,
) -> LiveRefresh {
    // The live path is the one place pending events are wanted: a provisional
    // model call should render while it is in flight.
    let nodes = treeify(view_id, &normalize(events, true), base_depth);
    let ui_state = reconcile_ui_state(prev_ui_state, &nodes);

    if status.is_terminal() {
        debug!(view_id, ?status, "log reached terminal status; signalling poll stop");
    }

    LiveRefresh {
        nodes,
        ui_state,
        continue_polling: status.is_running(),
    }
}

/// Re-key a UI-state map against a freshly built forest: entries whose node
/// id still exists are kept untouched, everything else is dropped.
pub fn reconcile_ui_state(prev: &UiStateMap, nodes: &[EventNode]) -> UiStateMap {
    let mut ids: HashSet<&str> = HashSet::new();
    for node in nodes {
        node.visit(&mut |n| {
            ids.insert(n.id.as_str());
        });
    }

    prev.iter()
        .filter(|(id, _)| ids.contains(id.as_str()))
        .map(|(id, state)| (id.clone(), state.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use trace_view_types::NodeUiState;

    fn info(data: i64) -> Event {
        Event::from_value(json!({"event":"info","data":data,"timestamp":format!("t{data}")}))
    }

    fn collapsed() -> NodeUiState {
        NodeUiState {
            selected_nav: Some("transcript".to_string()),
            collapsed: Some(true),
        }
    }

    #[test]
    fn test_build_view_drops_pending() {
        let events = vec![
            info(1),
            Event::from_value(json!({"event":"model","model":"m","pending":true,"timestamp":"t"})),
        ];
        let nodes = build_view("v", &events, 0);
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn test_build_view_wraps_bare_init() {
        // An old log with a bare sample_init gets the synthesized step, so
        // the forest has a single root with the init event as its child.
        let events = vec![Event::from_value(
            json!({"event":"sample_init","sample":{},"state":{},"timestamp":"t"}),
        )];
        let nodes = build_view("v", &events, 0);

        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].event.kind(), "step");
        assert_eq!(nodes[0].children.len(), 1);
        assert_eq!(nodes[0].children[0].event.kind(), "sample_init");
    }

    #[test]
    fn test_refresh_view_keeps_pending() {
        let events = vec![
            info(1),
            Event::from_value(json!({"event":"model","model":"m","pending":true,"timestamp":"t"})),
        ];
        let refresh = refresh_view("v", &events, RunStatus::Started, &UiStateMap::new(), 0);
        assert_eq!(refresh.nodes.len(), 2);
        assert!(refresh.continue_polling);
    }

    #[test]
    fn test_ui_state_survives_append() {
        let mut events = vec![info(1), info(2)];
        let first = refresh_view("v", &events, RunStatus::Started, &UiStateMap::new(), 0);

        let mut ui_state = first.ui_state;
        ui_state.insert(first.nodes[1].id.clone(), collapsed());

        events.push(info(3));
        let second = refresh_view("v", &events, RunStatus::Started, &ui_state, 0);

        assert_eq!(second.nodes.len(), 3);
        assert_eq!(second.ui_state.len(), 1);
        assert_eq!(second.ui_state.get("v-event1"), Some(&collapsed()));
    }

    #[test]
    fn test_stale_ids_dropped() {
        let mut ui_state = UiStateMap::new();
        ui_state.insert("v-event0".to_string(), collapsed());
        ui_state.insert("other-view-event9".to_string(), collapsed());

        let refresh = refresh_view("v", &[info(1)], RunStatus::Started, &ui_state, 0);
        assert_eq!(refresh.ui_state.len(), 1);
        assert!(refresh.ui_state.contains_key("v-event0"));
    }

    #[test]
    fn test_terminal_status_stops_polling() {
        for status in [RunStatus::Success, RunStatus::Cancelled, RunStatus::Error] {
            let refresh = refresh_view("v", &[info(1)], status, &UiStateMap::new(), 0);
            assert!(!refresh.continue_polling, "{:?} must stop polling", status);
        }
    }

    #[test]
    fn test_reconcile_reaches_nested_nodes() {
        let events = vec![
            Event::from_value(json!({"event":"step","action":"begin","name":"s","timestamp":"t"})),
            info(1),
            Event::from_value(json!({"event":"step","action":"end","name":"s","timestamp":"t"})),
        ];
        let nodes = build_view("v", &events, 0);

        let mut prev = UiStateMap::new();
        prev.insert("v-event1".to_string(), collapsed());

        let reconciled = reconcile_ui_state(&prev, &nodes);
        assert!(reconciled.contains_key("v-event1"));
    }
}
