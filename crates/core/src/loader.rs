// crates/core/src/loader.rs
//! Transcript file ingestion.
//!
//! The reconstruction pipeline itself performs no I/O; these readers are the
//! seam to the log source. Both are lenient in the same way the pipeline is:
//! a malformed line or record degrades (logged at debug level) instead of
//! failing the whole transcript. Only file-level problems — missing file,
//! permissions, a document that is not JSON at all — surface as errors.

use memchr::memmem;
use serde_json::Value;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use trace_view_types::{Event, Transcript};

use crate::attachments::resolve_transcript;
use crate::error::ParseError;

/// Read a line-delimited event stream (one event object per line).
///
/// Lines are screened with a substring pre-filter before deserializing: a
/// line with no `"event"` key cannot be an event record, so it is skipped
/// without paying for a JSON parse. Blank and malformed lines are skipped
/// with a debug log; unknown kinds come back as `Event::Unknown` and still
/// count toward positions.
///
/// # Errors
/// - `ParseError::NotFound` if the file doesn't exist
/// - `ParseError::PermissionDenied` if the file can't be read
/// - `ParseError::Io` for other I/O errors
pub async fn read_event_lines(path: &Path) -> Result<Vec<Event>, ParseError> {
    let file = File::open(path)
        .await
        .map_err(|e| ParseError::io(path, e))?;

    let reader = BufReader::new(file);
    let mut lines = reader.lines();

    let event_key = memmem::Finder::new(b"\"event\"");

    let mut events: Vec<Event> = Vec::new();
    let mut line_number: usize = 0;

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| ParseError::io(path, e))?
    {
        line_number += 1;
        let line = line.trim();

        if line.is_empty() {
            continue;
        }
        if event_key.find(line.as_bytes()).is_none() {
            debug!(line_number, "Skipping line without event key");
            continue;
        }

        match serde_json::from_str::<Value>(line) {
            Ok(value) => events.push(Event::from_value(value)),
            Err(e) => {
                debug!(
                    "Skipping malformed JSON at line {} in {:?}: {}",
                    line_number, path, e
                );
            }
        }
    }

    Ok(events)
}

/// Read a whole-transcript document: either a bare JSON array of events or
/// the producer's `{events, attachments, status}` object. Attachment
/// references are resolved against the side table before returning.
///
/// # Errors
/// File-level errors as in [`read_event_lines`], plus
/// `ParseError::MalformedJson` when the document is not valid JSON.
pub async fn read_transcript(path: &Path) -> Result<Transcript, ParseError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ParseError::io(path, e))?;

    let value: Value =
        serde_json::from_str(&raw).map_err(|e| ParseError::malformed_json(path, e))?;

    let mut transcript = match value {
        Value::Array(items) => Transcript {
            events: items.into_iter().map(Event::from_value).collect(),
            ..Transcript::default()
        },
        other => serde_json::from_value::<Transcript>(other)
            .map_err(|e| ParseError::malformed_json(path, e))?,
    };

    resolve_transcript(&mut transcript);
    Ok(transcript)
}
