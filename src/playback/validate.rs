//! # Recording Validation
//!
//! Two passes:
//! 1. [`validate_recording_value`] checks presence and type of every required
//!    field on the raw JSON, so a bad import reports e.g. `events[3].note`
//! 2. [`validate_recording`] checks the invariants of a typed [`Recording`]:
//!    - every event in range (note/velocity 0..=127, channel 0..=15)
//!    - timestamps finite, non-negative and non-decreasing
//!    - the first event at 0 ms
//!    - `duration == max(timestamp)`, or 0 when there are no events

use super::types::Recording;
use crate::document::{check_name, check_uuid, DocKind, Fields};
use crate::error::{ChordlabError, Result};
use serde_json::Value;

pub fn validate_recording_value(value: &Value) -> Result<()> {
    let fields = Fields::new(value, "", DocKind::Recording)?;
    let version = fields.str("version")?;
    if !version.starts_with("1.") {
        return Err(fields.fail("version", format!("unsupported version {}", version)));
    }
    fields.uuid_v4("id")?;
    fields.name("name")?;
    fields.positive_u64("createdAt")?;
    fields.non_negative("duration")?;
    if let Some(metadata) = fields.optional("metadata") {
        if !metadata.is_object() {
            return Err(fields.fail("metadata", "expected an object"));
        }
    }

    for (i, event) in fields.array("events")?.iter().enumerate() {
        let event = Fields::new(event, &format!("events[{}]", i), DocKind::Recording)?;
        match event.str("type")? {
            "noteOn" | "noteOff" => {}
            other => {
                return Err(event.fail("type", format!("expected noteOn or noteOff, got {}", other)))
            }
        }
        event.int_at_most("note", 127)?;
        event.int_at_most("velocity", 127)?;
        event.non_negative("timestamp")?;
        event.int_at_most("channel", 15)?;
    }
    Ok(())
}

pub fn validate_recording(recording: &Recording) -> Result<()> {
    let fail = |field: String, message: &str| Err(ChordlabError::recording(field, message));

    if !recording.version.starts_with("1.") {
        return fail("version".into(), "unsupported version");
    }
    if let Err(message) = check_uuid(recording.id) {
        return fail("id".into(), message);
    }
    if let Err(message) = check_name(&recording.name) {
        return fail("name".into(), message);
    }
    if recording.created_at == 0 {
        return fail("createdAt".into(), "expected a positive integer");
    }

    let mut previous = 0.0;
    for (i, event) in recording.events.iter().enumerate() {
        if event.note > 127 {
            return fail(format!("events[{}].note", i), "expected an integer in 0..=127");
        }
        if event.velocity > 127 {
            return fail(format!("events[{}].velocity", i), "expected an integer in 0..=127");
        }
        if event.channel > 15 {
            return fail(format!("events[{}].channel", i), "expected an integer in 0..=15");
        }
        let ts = event.timestamp_ms;
        if !ts.is_finite() || ts < 0.0 {
            return fail(format!("events[{}].timestamp", i), "expected a non-negative number");
        }
        if i == 0 && ts != 0.0 {
            return fail("events[0].timestamp".into(), "first event must be at 0 ms");
        }
        if ts < previous {
            return fail(
                format!("events[{}].timestamp", i),
                "timestamps must be non-decreasing",
            );
        }
        previous = ts;
    }

    // `previous` now holds the largest timestamp.
    if !recording.duration_ms.is_finite() || recording.duration_ms != previous {
        return fail("duration".into(), "must equal the last event timestamp");
    }
    Ok(())
}
