//! # Playback Module
//!
//! Capture MIDI performances and replay them with exact timing.
//!
//! ## Sub-modules
//! - `types` - Recording, RecordingEvent and notification type definitions
//! - `validate` - Strict recording document validation
//! - `clock` - Injectable monotonic time source
//! - `timer` - Injectable deferred-execution primitive
//! - `recorder` - Captures note events into a Recording
//! - `engine` - Replays a Recording to listeners
//!
//! ## Key Types
//! - [`Recorder`] - `idle -> recording <-> paused -> idle`
//! - [`Player`] - `idle -> playing <-> paused -> idle`
//! - [`Recording`] - The portable recording document
//!
//! ## Example
//! ```rust
//! use chordlab::playback::{Channel, ManualClock, Player, PlaybackNotification, Recorder};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let clock = ManualClock::new(0.0);
//! let mut recorder = Recorder::new(clock.clone());
//! recorder.start().unwrap();
//! recorder.note_on(60, 100).unwrap();
//! clock.advance(500.0);
//! recorder.note_off(60).unwrap();
//! let recording = recorder.stop("Middle C", None).unwrap();
//!
//! let notes = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&notes);
//! let mut player = Player::new(clock.clone());
//! player.on(Channel::Event, move |n| {
//!     if let PlaybackNotification::Event(note) = n {
//!         sink.borrow_mut().push(note.note);
//!     }
//! });
//! player.load_recording(recording).unwrap();
//! player.play().unwrap();
//! player.run(|ms| clock.advance(ms));
//!
//! assert_eq!(*notes.borrow(), vec![60, 60]);
//! ```
//!
//! ## Timing
//!
//! Neither component sleeps or spawns threads. Both read time from a
//! [`Clock`]; the player arms timers on a [`Scheduler`] and the host fires
//! them with [`Player::poll`] or [`Player::run`]. Under [`ManualClock`] the
//! whole pipeline runs in virtual time.

mod clock;
mod engine;
mod recorder;
mod timer;
mod types;
mod validate;

#[cfg(test)]
mod tests;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use engine::{ListenerId, Player, StopHandle};
pub use recorder::{Recorder, RecorderState, DEFAULT_RECORDING_NAME};
pub use timer::{Due, Scheduler, TimerHandle, TimerQueue};
pub use types::{
    Channel, CompleteNotification, EventType, NoteNotification, PlaybackNotification,
    PlaybackState, ProgressNotification, Recording, RecordingEvent, StopReason,
    RECORDING_VERSION,
};
pub use validate::{validate_recording, validate_recording_value};
