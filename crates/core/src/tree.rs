// crates/core/src/tree.rs
//! Hierarchy construction ("treeification").
//!
//! Converts the normalized flat event sequence into a forest of
//! [`EventNode`]s using the explicit begin/end markers: a single
//! left-to-right pass over the stream with a stack of open nodes. The source
//! has only implicit nesting cues, so a stack machine — not recursive
//! descent — is the natural shape.

use trace_view_types::{Event, EventNode, StepAction};

/// Build the event forest for one view.
///
/// Every event consumes one index; node ids are `"<view_id>-event<index>"`,
/// derived from position rather than content so that append-only growth never
/// re-keys a previously issued node. `step(end)` / `span_end` markers consume
/// an index but emit no node.
///
/// An `end` with no open node is a no-op, and nodes still open at end of
/// input stay attached where they were opened — both are expected shapes for
/// a truncated or still-running log, not errors.
///
/// `base_depth` offsets every depth in the result; sub-task transcripts are
/// built with `base_depth = parent_depth + 1` so an embedded sub-tree lines
/// up inside its parent viewer.
pub fn treeify(view_id: &str, events: &[Event], base_depth: usize) -> Vec<EventNode> {
    let mut roots: Vec<EventNode> = Vec::new();
    let mut stack: Vec<EventNode> = Vec::new();

    for (index, event) in events.iter().enumerate() {
        let id = format!("{}-event{}", view_id, index);
        let depth = base_depth + stack.len();

        match event {
            Event::Step(step) => match step.action {
                StepAction::Begin => stack.push(EventNode::new(id, event.clone(), depth)),
                StepAction::End => close_top(&mut roots, &mut stack),
            },
            Event::SpanBegin(_) => stack.push(EventNode::new(id, event.clone(), depth)),
            Event::SpanEnd(_) => close_top(&mut roots, &mut stack),
            _ => {
                let mut node = EventNode::new(id, event.clone(), depth);
                if let Some(embedded) = event.embedded_events() {
                    if !embedded.is_empty() {
                        node.children = treeify(&node.id, embedded, depth + 1);
                    }
                }
                attach(&mut roots, &mut stack, node);
            }
        }
    }

    // A truncated live log can leave steps open; attach them as-is.
    while !stack.is_empty() {
        close_top(&mut roots, &mut stack);
    }

    roots
}

/// Collect every node id in the forest, depth-first.
pub fn collect_node_ids(nodes: &[EventNode]) -> Vec<String> {
    let mut ids = Vec::new();
    for node in nodes {
        node.visit(&mut |n| ids.push(n.id.clone()));
    }
    ids
}

fn attach(roots: &mut Vec<EventNode>, stack: &mut [EventNode], node: EventNode) {
    match stack.last_mut() {
        Some(top) => top.children.push(node),
        None => roots.push(node),
    }
}

fn close_top(roots: &mut Vec<EventNode>, stack: &mut Vec<EventNode>) {
    // Unmatched end: nothing to close, nothing to report.
    if let Some(node) = stack.pop() {
        attach(roots, stack, node);
    }
}
