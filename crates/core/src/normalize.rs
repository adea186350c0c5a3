// crates/core/src/normalize.rs
//! Event-stream normalization.
//!
//! Runs before any structural interpretation: drops provisional records
//! (unless the live path asks for them) and patches older logs that predate
//! explicit init-step wrapping so the hierarchy builder always finds a step
//! around sample initialization.

use tracing::debug;
use trace_view_types::{Event, StepAction, StepEvent};

/// Step name used when synthesizing a wrapper around `sample_init`.
pub const SYNTHESIZED_INIT_STEP: &str = "sample_init";

/// Clean and patch the raw event sequence.
///
/// - Events flagged `pending` are dropped unless `include_pending` is set.
///   Only the live-refresh path passes `true`; finished logs never carry
///   pending records.
/// - If the stream contains a `sample_init` event with no `step(begin,
///   name="init")` before it, a `step(begin)` / `step(end)` pair named
///   [`SYNTHESIZED_INIT_STEP`] is inserted around it, stamped with the init
///   event's timestamp. The init event itself is never altered.
///
/// Output ordering matches input ordering; nothing else is de-duplicated.
pub fn normalize(events: &[Event], include_pending: bool) -> Vec<Event> {
    let mut out: Vec<Event> = if include_pending {
        events.to_vec()
    } else {
        events
            .iter()
            .filter(|event| {
                let keep = !event.is_pending();
                if !keep {
                    debug!(kind = event.kind(), "Dropping pending event");
                }
                keep
            })
            .cloned()
            .collect()
    };

    if let Some(init_index) = out.iter().position(|e| matches!(e, Event::SampleInit(_))) {
        if !has_init_step(&out[..init_index]) {
            let (begin, end) = synthesized_wrapper(&out[init_index]);
            debug!("Synthesizing init step wrapper around sample_init");
            out.insert(init_index, begin);
            out.insert(init_index + 2, end);
        }
    }

    out
}

fn has_init_step(events: &[Event]) -> bool {
    events.iter().any(|event| {
        matches!(
            event,
            Event::Step(step) if step.action == StepAction::Begin && step.name == "init"
        )
    })
}

fn synthesized_wrapper(init: &Event) -> (Event, Event) {
    // Timestamp (and working_start) mirror the init event so the wrapper
    // sorts with it; the pair is committed by construction.
    let mut common = init.common().cloned().unwrap_or_default();
    common.pending = None;
    common.span_id = None;

    let step = |action: StepAction| {
        Event::Step(StepEvent {
            common: common.clone(),
            action,
            step_type: None,
            name: SYNTHESIZED_INIT_STEP.to_string(),
        })
    };

    (step(StepAction::Begin), step(StepAction::End))
}
