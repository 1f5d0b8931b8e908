//! Scale registry and scale construction.
//!
//! A scale kind is pure data: an id, a display name and the semitone steps
//! between successive degrees. Adding a mode means adding a row to
//! [`SCALE_KINDS`].

use crate::note::PitchClass;
use serde::Serialize;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ScaleKind {
    pub id: &'static str,
    pub display: &'static str,
    /// Semitone steps from each degree to the next; they sum to 12.
    pub steps: &'static [u8],
}

pub static SCALE_KINDS: &[ScaleKind] = &[
    ScaleKind { id: "major", display: "Major", steps: &[2, 2, 1, 2, 2, 2, 1] },
    ScaleKind { id: "natural_minor", display: "Natural Minor", steps: &[2, 1, 2, 2, 1, 2, 2] },
    ScaleKind { id: "harmonic_minor", display: "Harmonic Minor", steps: &[2, 1, 2, 2, 1, 3, 1] },
    ScaleKind { id: "melodic_minor", display: "Melodic Minor", steps: &[2, 1, 2, 2, 2, 2, 1] },
    ScaleKind { id: "major_pentatonic", display: "Major Pentatonic", steps: &[2, 2, 3, 2, 3] },
    ScaleKind { id: "minor_pentatonic", display: "Minor Pentatonic", steps: &[3, 2, 2, 3, 2] },
    ScaleKind { id: "blues", display: "Blues", steps: &[3, 2, 1, 1, 3, 2] },
    ScaleKind { id: "lydian", display: "Lydian", steps: &[2, 2, 2, 1, 2, 2, 1] },
    ScaleKind { id: "dorian", display: "Dorian", steps: &[2, 1, 2, 2, 2, 1, 2] },
    ScaleKind { id: "phrygian", display: "Phrygian", steps: &[1, 2, 2, 2, 1, 2, 2] },
    ScaleKind { id: "mixolydian", display: "Mixolydian", steps: &[2, 2, 1, 2, 2, 1, 2] },
    ScaleKind { id: "locrian", display: "Locrian", steps: &[1, 2, 2, 1, 2, 2, 2] },
];

/// Canonical registry key: lowercase, with `-` and spaces folded to `_`.
pub(crate) fn registry_key(id: &str) -> String {
    id.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

impl ScaleKind {
    /// The major scale, used when no scale is named.
    pub fn major() -> &'static ScaleKind {
        &SCALE_KINDS[0]
    }

    /// Look up a scale kind by id. `minor` is accepted for `natural_minor`.
    pub fn from_id(id: &str) -> Option<&'static ScaleKind> {
        let key = registry_key(id);
        let key = match key.as_str() {
            "minor" | "aeolian" => "natural_minor",
            "ionian" => "major",
            other => other,
        };
        SCALE_KINDS.iter().find(|kind| kind.id == key)
    }

    /// Pitch classes of this scale starting at `root`.
    pub fn notes(&self, root: PitchClass) -> Vec<PitchClass> {
        let mut notes = Vec::with_capacity(self.steps.len());
        let mut current = root;
        notes.push(current);
        // The last step returns to the root and is not emitted.
        for &step in &self.steps[..self.steps.len().saturating_sub(1)] {
            current = current.transpose(step as i32);
            notes.push(current);
        }
        notes
    }
}

/// Scale note names for `(root, kind)`; empty when either is unknown.
///
/// ```
/// use chordlab::scale_notes;
///
/// assert_eq!(scale_notes("D", "major"), vec!["D", "E", "F#", "G", "A", "B", "C#"]);
/// assert!(scale_notes("H", "major").is_empty());
/// ```
pub fn scale_notes(root: &str, kind: &str) -> Vec<&'static str> {
    match (PitchClass::from_name(root), ScaleKind::from_id(kind)) {
        (Some(root), Some(kind)) => kind.notes(root).into_iter().map(PitchClass::name).collect(),
        _ => vec![],
    }
}

/// Number of notes in one octave of the scale; `0` when unknown.
pub fn scale_note_count(kind: &str) -> usize {
    ScaleKind::from_id(kind).map_or(0, |kind| kind.steps.len())
}
