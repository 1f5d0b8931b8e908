//! # MIDI Recorder
//!
//! Captures note events against a monotonic clock.
//!
//! ## State Machine
//! ```text
//! idle --start--> recording --pause--> paused --resume--> recording
//!   ^                 |                   |
//!   +---stop/cancel---+-------------------+
//! ```
//!
//! ## Timestamps
//! `timestamp = now - start - total_pause`, so time spent paused never shows
//! up in the recording. On `stop` every timestamp is shifted so the first
//! event sits at 0 ms.

use super::clock::Clock;
use super::types::{EventType, Recording, RecordingEvent, RECORDING_VERSION};
use crate::document::{check_name, epoch_ms};
use crate::error::{ChordlabError, Result};
use log::debug;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Name given to recordings stopped with an empty name.
pub const DEFAULT_RECORDING_NAME: &str = "Untitled Recording";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Paused,
}

impl RecorderState {
    pub fn as_str(self) -> &'static str {
        match self {
            RecorderState::Idle => "idle",
            RecorderState::Recording => "recording",
            RecorderState::Paused => "paused",
        }
    }
}

pub struct Recorder<C: Clock> {
    clock: C,
    state: RecorderState,
    started_at: f64,
    pause_started_at: f64,
    total_pause_ms: f64,
    events: Vec<RecordingEvent>,
}

impl<C: Clock> Recorder<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            state: RecorderState::Idle,
            started_at: 0.0,
            pause_started_at: 0.0,
            total_pause_ms: 0.0,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn events(&self) -> &[RecordingEvent] {
        &self.events
    }

    fn require(&self, operation: &'static str, allowed: &[RecorderState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(ChordlabError::InvalidState {
                operation,
                state: self.state.as_str(),
            })
        }
    }

    pub fn start(&mut self) -> Result<()> {
        self.require("start recording", &[RecorderState::Idle])?;
        self.started_at = self.clock.now_ms();
        self.total_pause_ms = 0.0;
        self.events.clear();
        self.state = RecorderState::Recording;
        debug!("recorder started at {:.1} ms", self.started_at);
        Ok(())
    }

    /// Recording time excluding pauses.
    pub fn elapsed_ms(&self) -> f64 {
        let now = match self.state {
            RecorderState::Idle => return 0.0,
            RecorderState::Recording => self.clock.now_ms(),
            RecorderState::Paused => self.pause_started_at,
        };
        (now - self.started_at - self.total_pause_ms).max(0.0)
    }

    /// Append an event stamped with the current recording time.
    ///
    /// `velocity` defaults to 100 for note-on and 0 for note-off.
    pub fn record_event(
        &mut self,
        kind: EventType,
        note: u8,
        velocity: Option<u8>,
        channel: u8,
    ) -> Result<&RecordingEvent> {
        self.require("record an event", &[RecorderState::Recording])?;
        let velocity = velocity.unwrap_or_else(|| kind.default_velocity());
        if note > 127 {
            return Err(ChordlabError::recording("note", "expected an integer in 0..=127"));
        }
        if velocity > 127 {
            return Err(ChordlabError::recording("velocity", "expected an integer in 0..=127"));
        }
        if channel > 15 {
            return Err(ChordlabError::recording("channel", "expected an integer in 0..=15"));
        }

        let timestamp_ms = self.elapsed_ms();
        self.events.push(RecordingEvent {
            kind,
            note,
            velocity,
            timestamp_ms,
            channel,
        });
        Ok(&self.events[self.events.len() - 1])
    }

    pub fn note_on(&mut self, note: u8, velocity: u8) -> Result<&RecordingEvent> {
        self.record_event(EventType::NoteOn, note, Some(velocity), 0)
    }

    pub fn note_off(&mut self, note: u8) -> Result<&RecordingEvent> {
        self.record_event(EventType::NoteOff, note, None, 0)
    }

    /// Record a raw MIDI message. Anything other than note-on/note-off is
    /// ignored and yields `Ok(None)`. Note-on with velocity 0 is a note-off.
    pub fn record_midi(&mut self, bytes: &[u8]) -> Result<Option<&RecordingEvent>> {
        let &[status, note, velocity, ..] = bytes else {
            return Ok(None);
        };
        let channel = status & 0x0F;
        let (kind, velocity) = match status & 0xF0 {
            0x90 if velocity > 0 => (EventType::NoteOn, velocity),
            0x90 => (EventType::NoteOff, 0),
            0x80 => (EventType::NoteOff, velocity),
            _ => return Ok(None),
        };
        self.record_event(kind, note & 0x7F, Some(velocity & 0x7F), channel)
            .map(Some)
    }

    pub fn pause(&mut self) -> Result<()> {
        self.require("pause recording", &[RecorderState::Recording])?;
        self.pause_started_at = self.clock.now_ms();
        self.state = RecorderState::Paused;
        debug!("recorder paused after {:.1} ms", self.elapsed_ms());
        Ok(())
    }

    pub fn resume(&mut self) -> Result<()> {
        self.require("resume recording", &[RecorderState::Paused])?;
        self.total_pause_ms += (self.clock.now_ms() - self.pause_started_at).max(0.0);
        self.state = RecorderState::Recording;
        debug!("recorder resumed, {:.1} ms paused in total", self.total_pause_ms);
        Ok(())
    }

    /// Finish the take and return it as a recording document.
    ///
    /// An empty `name` becomes [`DEFAULT_RECORDING_NAME`]. The recorder is
    /// left idle only when the recording is produced.
    pub fn stop(&mut self, name: &str, metadata: Option<Map<String, Value>>) -> Result<Recording> {
        self.require(
            "stop recording",
            &[RecorderState::Recording, RecorderState::Paused],
        )?;
        let name = match name.trim() {
            "" => DEFAULT_RECORDING_NAME,
            trimmed => trimmed,
        };
        check_name(name).map_err(|message| ChordlabError::recording("name", message))?;

        let mut events = std::mem::take(&mut self.events);
        let offset = events
            .iter()
            .map(|e| e.timestamp_ms)
            .fold(f64::INFINITY, f64::min);
        for event in &mut events {
            event.timestamp_ms -= offset;
        }
        let duration_ms = events.iter().map(|e| e.timestamp_ms).fold(0.0, f64::max);

        self.state = RecorderState::Idle;
        debug!(
            "recorder stopped: {} events over {:.1} ms",
            events.len(),
            duration_ms
        );
        Ok(Recording {
            version: RECORDING_VERSION.to_string(),
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: epoch_ms(),
            duration_ms,
            metadata,
            events,
            extra: Map::new(),
        })
    }

    /// Drop the take without producing a recording.
    pub fn cancel(&mut self) {
        self.events.clear();
        self.state = RecorderState::Idle;
        debug!("recorder cancelled");
    }
}
