//! Recording and playback type definitions
//!
//! This module defines the recording document produced by the recorder and
//! consumed by the player, and the notifications the player emits.

use super::validate::{validate_recording, validate_recording_value};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

pub const RECORDING_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventType {
    NoteOn,
    NoteOff,
}

impl EventType {
    /// Velocity used when the caller does not supply one.
    pub fn default_velocity(self) -> u8 {
        match self {
            EventType::NoteOn => 100,
            EventType::NoteOff => 0,
        }
    }
}

/// A single captured MIDI note event.
///
/// # Fields
/// - `kind`: note-on or note-off (`"type"` in the document)
/// - `note`: MIDI number, 0..=127
/// - `velocity`: 0..=127
/// - `timestamp_ms`: milliseconds from the first event of the recording
/// - `channel`: MIDI channel, 0..=15
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingEvent {
    #[serde(rename = "type")]
    pub kind: EventType,
    pub note: u8,
    pub velocity: u8,
    #[serde(rename = "timestamp")]
    pub timestamp_ms: f64,
    pub channel: u8,
}

/// A finished recording, in its portable document form.
///
/// Unknown top-level keys are kept in `extra` and written back on export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    pub version: String,
    pub id: Uuid,
    pub name: String,
    pub created_at: u64,
    #[serde(rename = "duration")]
    pub duration_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    pub events: Vec<RecordingEvent>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Recording {
    /// Parse and strictly validate the portable text encoding.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        validate_recording_value(value)?;
        let recording: Recording = serde_json::from_value(value.clone())?;
        recording.validate()?;
        Ok(recording)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the document invariants (ranges, ordering, duration).
    pub fn validate(&self) -> Result<()> {
        validate_recording(self)
    }

    pub fn note_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| e.kind == EventType::NoteOn)
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
}

impl PlaybackState {
    pub fn as_str(self) -> &'static str {
        match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
        }
    }
}

/// Listener channels. Each notification belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Event,
    Progress,
    Stop,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteNotification {
    #[serde(rename = "type")]
    pub kind: EventType,
    pub note: u8,
    pub velocity: u8,
    pub channel: u8,
}

impl From<&RecordingEvent> for NoteNotification {
    fn from(event: &RecordingEvent) -> Self {
        NoteNotification {
            kind: event.kind,
            note: event.note,
            velocity: event.velocity,
            channel: event.channel,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressNotification {
    /// Percentage in `0..=100`.
    pub progress: f64,
    pub current_time_ms: f64,
    pub duration_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StopReason {
    /// `stop()` was called.
    Requested,
    /// A new recording replaced the one that was playing.
    Reloaded,
    /// Scheduling failed; playback was abandoned.
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteNotification {
    pub duration_ms: f64,
    pub total_events: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "notification", rename_all = "camelCase")]
pub enum PlaybackNotification {
    Event(NoteNotification),
    Progress(ProgressNotification),
    Stop { reason: StopReason },
    Complete(CompleteNotification),
}

impl PlaybackNotification {
    pub fn channel(&self) -> Channel {
        match self {
            PlaybackNotification::Event(_) => Channel::Event,
            PlaybackNotification::Progress(_) => Channel::Progress,
            PlaybackNotification::Stop { .. } => Channel::Stop,
            PlaybackNotification::Complete(_) => Channel::Complete,
        }
    }
}
