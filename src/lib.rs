pub mod chord;
pub mod config;
pub mod document;
pub mod error;
pub mod identify;
pub mod note;
pub mod playback;
pub mod practice;
pub mod progression;
pub mod roman;
pub mod scale;
pub mod sheet;
pub mod storage;

pub use chord::{chord_notes, chord_notes_as_midi, Chord, ChordKind, PitchClassSet, CHORD_KINDS};
pub use config::PracticeConfig;
pub use document::{ProgressionDocument, ProgressionMetadata};
pub use error::*;
pub use identify::{identify, identify_all, suggest, ChordId, ChordSuggestion, Inversion};
pub use note::{
    midi_octave, midi_to_name, midi_to_pitch_class, normalize_note_strict, normalize_token,
    PitchClass,
};
pub use practice::{PracticeOutcome, ProgressionTracker};
pub use progression::{parse_progression, ParseResult, ProgressionStep, StepKind};
pub use roman::{is_roman, resolve_roman, resolve_roman_chord};
pub use scale::{scale_note_count, scale_notes, ScaleKind, SCALE_KINDS};
pub use sheet::LeadSheet;
pub use storage::{Document, DocumentStore};

/// Root-position MIDI voicing of a progression step at `base_octave`.
/// Empty when the step has no typed chord.
pub fn voice_step(step: &ProgressionStep, base_octave: i32) -> Vec<u8> {
    step.chord()
        .map(|chord| chord.midi(0, base_octave))
        .unwrap_or_default()
}
