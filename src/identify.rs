//! Chord identification and partial-chord suggestion.
//!
//! Both scan the full `alphabet × CHORD_KINDS` product in registry order, so
//! results are deterministic: roots in sharp-canonical order, then kinds in
//! registry order. Pitch-class-equivalent readings are all kept
//! (`A C E G` is both `A Minor 7` and `C Major 6`).

use crate::chord::{Chord, ChordKind, PitchClassSet, CHORD_KINDS};
use crate::note::PitchClass;
use serde::Serialize;
use std::fmt;

/// How many completion candidates [`suggest`] returns at most.
pub const MAX_SUGGESTIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Inversion {
    #[serde(rename = "Root Position")]
    Root,
    #[serde(rename = "1st Inversion")]
    First,
    #[serde(rename = "2nd Inversion")]
    Second,
    #[serde(rename = "3rd Inversion")]
    Third,
}

impl Inversion {
    /// Inversion whose bass is the `n`-th chord tone (0 = root).
    fn from_tone(n: usize) -> Option<Self> {
        match n {
            0 => Some(Inversion::Root),
            1 => Some(Inversion::First),
            2 => Some(Inversion::Second),
            3 => Some(Inversion::Third),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Inversion::Root => "Root Position",
            Inversion::First => "1st Inversion",
            Inversion::Second => "2nd Inversion",
            Inversion::Third => "3rd Inversion",
        }
    }
}

impl fmt::Display for Inversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChordId {
    pub root: PitchClass,
    pub kind: &'static ChordKind,
    pub display_name: String,
    pub inversion: Inversion,
}

impl ChordId {
    pub fn chord(&self) -> Chord {
        Chord::new(self.root, self.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChordSuggestion {
    pub root: PitchClass,
    pub kind: &'static ChordKind,
    pub display_name: String,
    /// Chord tones not currently sounding, in chord-tone order.
    pub missing: Vec<PitchClass>,
    /// Number of intervals above the root; lower is simpler.
    pub complexity: usize,
}

fn all_chords() -> impl Iterator<Item = Chord> {
    PitchClass::all().flat_map(|root| CHORD_KINDS.iter().map(move |kind| Chord::new(root, kind)))
}

/// Every chord whose pitch-class set equals the sounding pitch classes.
///
/// `active_midi` may be unsorted and contain duplicates. Fewer than three
/// distinct pitch classes never identify a chord.
pub fn identify_all(active_midi: &[u8]) -> Vec<ChordId> {
    let active = PitchClassSet::from_midi(active_midi);
    if active.len() < 3 {
        return vec![];
    }
    let Some(&lowest) = active_midi.iter().min() else {
        return vec![];
    };
    let bass = PitchClass::new(lowest as i32);

    all_chords()
        .filter(|chord| chord.pitch_classes() == active)
        .filter_map(|chord| {
            let bass_interval = bass.interval_from(chord.root);
            let tone = if bass_interval == 0 {
                0
            } else {
                chord
                    .kind
                    .intervals
                    .iter()
                    .position(|&i| i % 12 == bass_interval)?
                    + 1
            };
            Some(ChordId {
                root: chord.root,
                kind: chord.kind,
                display_name: chord.display_name(),
                inversion: Inversion::from_tone(tone)?,
            })
        })
        .collect()
}

/// First reading from [`identify_all`], following its tie-break order.
pub fn identify(active_midi: &[u8]) -> Option<ChordId> {
    identify_all(active_midi).into_iter().next()
}

/// Chords that the sounding notes partially spell, missing one or two tones.
///
/// Ranked by `(complexity, root)`; registry order decides remaining ties.
pub fn suggest(active_midi: &[u8]) -> Vec<ChordSuggestion> {
    let active = PitchClassSet::from_midi(active_midi);
    if active.len() < 2 {
        return vec![];
    }

    let mut candidates: Vec<ChordSuggestion> = all_chords()
        .filter_map(|chord| {
            let full = chord.pitch_classes();
            if !active.is_subset_of(full) {
                return None;
            }
            let missing_count = full.difference(active).len();
            if !(1..=2).contains(&missing_count) {
                return None;
            }
            let missing = chord
                .notes()
                .into_iter()
                .filter(|&pc| !active.contains(pc))
                .collect();
            Some(ChordSuggestion {
                root: chord.root,
                kind: chord.kind,
                display_name: chord.display_name(),
                missing,
                complexity: chord.kind.intervals.len(),
            })
        })
        .collect();

    candidates.sort_by_key(|s| (s.complexity, s.root.index()));
    candidates.truncate(MAX_SUGGESTIONS);
    candidates
}
