//! # Error Types
//!
//! This module defines all error types for the chordlab engine.
//!
//! Errors are values. The music-theory primitives never return them (unknown
//! inputs produce empty results instead); they come from the strict
//! normaliser, the Roman-numeral resolver, document validation, the
//! recorder/player state machines and the document store.
//!
//! ## Usage
//! ```rust
//! use chordlab::{normalize_note_strict, ChordlabError};
//!
//! match normalize_note_strict("H") {
//!     Ok(note) => println!("note {}", note),
//!     Err(ChordlabError::InvalidNote(token)) => eprintln!("not a note: {}", token),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChordlabError {
    /// The leading letter is not `A`..`G` after normalisation (strict mode only).
    ///
    /// # Example
    /// ```
    /// # use chordlab::ChordlabError;
    /// let err = ChordlabError::InvalidNote("H#".to_string());
    /// assert_eq!(err.to_string(), "Invalid note: H#");
    /// ```
    #[error("Invalid note: {0}")]
    InvalidNote(String),

    /// A lead-sheet token is neither a Roman numeral nor an absolute chord symbol.
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// A Roman numeral was resolved without any scale notes to anchor it.
    #[error("Missing scale context for Roman numeral: {0}")]
    MissingScaleContext(String),

    /// A recording or progression document failed validation.
    ///
    /// `field` is the path of the offending field, e.g. `events[3].velocity`.
    ///
    /// # Example
    /// ```
    /// # use chordlab::ChordlabError;
    /// let err = ChordlabError::InvalidRecording {
    ///     field: "events[0].note".to_string(),
    ///     message: "expected an integer in 0..=127".to_string(),
    /// };
    /// assert_eq!(
    ///     err.to_string(),
    ///     "Invalid recording field 'events[0].note': expected an integer in 0..=127"
    /// );
    /// ```
    #[error("Invalid recording field '{field}': {message}")]
    InvalidRecording { field: String, message: String },

    /// A progression document failed validation.
    #[error("Invalid progression field '{field}': {message}")]
    InvalidProgression { field: String, message: String },

    /// The operation is not permitted by the recorder or player state machine.
    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    /// Playback rate must be a finite number greater than zero.
    #[error("Invalid playback rate: {0}")]
    InvalidRate(f64),

    /// No stored document has the requested id.
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Invalid YAML configuration or lead-sheet front-matter.
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ChordlabError {
    pub(crate) fn recording(field: impl Into<String>, message: impl Into<String>) -> Self {
        ChordlabError::InvalidRecording {
            field: field.into(),
            message: message.into(),
        }
    }

    pub(crate) fn progression(field: impl Into<String>, message: impl Into<String>) -> Self {
        ChordlabError::InvalidProgression {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ChordlabError>;
