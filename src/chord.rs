//! # Chord Engine
//!
//! Chord kinds live in a data-driven registry ([`CHORD_KINDS`]): id, display
//! name and intervals above the root. Registry order is part of the public
//! contract, because the identifier breaks ties by it.
//!
//! ## Voicing
//! [`Chord::midi`] realises a chord in a given inversion:
//! 1. Rotate `[0, i1, i2, ...]` left by `inversion`
//! 2. Place the first rotated tone in `base_octave`
//! 3. Raise the octave whenever a tone's pitch class drops below the previous one
//!
//! So the bass note of inversion `n` is always the `n`-th chord tone.
//!
//! ## Symbols
//! [`Chord::from_symbol`] types absolute lead-sheet symbols (`Em7`, `G/B`,
//! `F#dim`) against the registry. Slash bass notes are ignored.

use crate::note::{normalize_token, split_root, PitchClass};
use crate::scale::registry_key;
use serde::Serialize;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ChordKind {
    pub id: &'static str,
    pub display: &'static str,
    /// Semitones above the root, root excluded. May exceed 11 (`add9`).
    pub intervals: &'static [u8],
}

pub static CHORD_KINDS: &[ChordKind] = &[
    ChordKind { id: "major", display: "Major", intervals: &[4, 7] },
    ChordKind { id: "minor", display: "Minor", intervals: &[3, 7] },
    ChordKind { id: "diminished", display: "Diminished", intervals: &[3, 6] },
    ChordKind { id: "augmented", display: "Augmented", intervals: &[4, 8] },
    ChordKind { id: "major7", display: "Major 7", intervals: &[4, 7, 11] },
    ChordKind { id: "minor7", display: "Minor 7", intervals: &[3, 7, 10] },
    ChordKind { id: "dominant7", display: "Dominant 7", intervals: &[4, 7, 10] },
    ChordKind { id: "diminished7", display: "Diminished 7", intervals: &[3, 6, 9] },
    ChordKind { id: "half_diminished7", display: "Half Diminished 7", intervals: &[3, 6, 10] },
    ChordKind { id: "major6", display: "Major 6", intervals: &[4, 7, 9] },
    ChordKind { id: "add9", display: "Add9", intervals: &[4, 7, 14] },
    ChordKind { id: "sus2", display: "Sus2", intervals: &[2, 7] },
    ChordKind { id: "sus4", display: "Sus4", intervals: &[5, 7] },
];

impl ChordKind {
    pub fn from_id(id: &str) -> Option<&'static ChordKind> {
        let key = registry_key(id);
        CHORD_KINDS.iter().find(|kind| kind.id == key)
    }

    /// Number of chord tones, root included.
    pub fn size(&self) -> usize {
        self.intervals.len() + 1
    }
}

/// A set of pitch classes packed into the low 12 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PitchClassSet(u16);

impl PitchClassSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_midi(notes: &[u8]) -> Self {
        notes
            .iter()
            .fold(Self::new(), |set, &n| set.with(PitchClass::new(n as i32)))
    }

    pub fn with(self, pc: PitchClass) -> Self {
        PitchClassSet(self.0 | (1 << pc.index()))
    }

    pub fn contains(self, pc: PitchClass) -> bool {
        self.0 & (1 << pc.index()) != 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn is_subset_of(self, other: PitchClassSet) -> bool {
        self.0 & !other.0 == 0
    }

    /// Members of `self` not in `other`.
    pub fn difference(self, other: PitchClassSet) -> PitchClassSet {
        PitchClassSet(self.0 & !other.0)
    }

    pub fn iter(self) -> impl Iterator<Item = PitchClass> {
        PitchClass::all().filter(move |&pc| self.contains(pc))
    }
}

impl FromIterator<PitchClass> for PitchClassSet {
    fn from_iter<I: IntoIterator<Item = PitchClass>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), PitchClassSet::with)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Chord {
    pub root: PitchClass,
    pub kind: &'static ChordKind,
}

impl Chord {
    pub fn new(root: PitchClass, kind: &'static ChordKind) -> Self {
        Self { root, kind }
    }

    /// Build from a root name and kind id; `None` if either is unknown.
    pub fn from_names(root: &str, kind: &str) -> Option<Self> {
        Some(Self::new(PitchClass::from_name(root)?, ChordKind::from_id(kind)?))
    }

    /// Type an absolute chord symbol such as `Am7`, `Bb`, `G/B` or `F#dim`.
    ///
    /// ```
    /// use chordlab::Chord;
    ///
    /// assert_eq!(Chord::from_symbol("Em7").unwrap().display_name(), "E Minor 7");
    /// assert_eq!(Chord::from_symbol("G/B").unwrap().display_name(), "G Major");
    /// assert_eq!(Chord::from_symbol("Bbmaj7").unwrap().display_name(), "A# Major 7");
    /// assert!(Chord::from_symbol("Cm11").is_none());
    /// ```
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let normalized = normalize_token(symbol);
        let head = normalized.split('/').next().unwrap_or("");
        let (root, suffix) = split_root(head)?;
        let kind_id = match suffix {
            "" | "M" | "maj" => "major",
            "m" | "min" | "-" => "minor",
            "dim" | "°" => "diminished",
            "aug" | "+" => "augmented",
            "7" | "dom7" => "dominant7",
            "maj7" | "M7" => "major7",
            "m7" | "min7" | "-7" => "minor7",
            "dim7" | "°7" => "diminished7",
            "m7b5" | "min7b5" | "ø" | "ø7" => "half_diminished7",
            "6" | "M6" | "maj6" => "major6",
            "add9" => "add9",
            "sus2" => "sus2",
            "sus4" | "sus" => "sus4",
            _ => return None,
        };
        Some(Self::new(root, ChordKind::from_id(kind_id)?))
    }

    /// Inverse of [`Chord::display_name`].
    pub fn from_display_name(name: &str) -> Option<Self> {
        let (root, display) = name.split_once(' ')?;
        let kind = CHORD_KINDS.iter().find(|kind| kind.display == display)?;
        Some(Self::new(PitchClass::from_name(root)?, kind))
    }

    /// Root followed by each interval, as pitch classes.
    pub fn notes(&self) -> Vec<PitchClass> {
        std::iter::once(self.root)
            .chain(self.kind.intervals.iter().map(|&i| self.root.transpose(i as i32)))
            .collect()
    }

    pub fn pitch_classes(&self) -> PitchClassSet {
        self.notes().into_iter().collect()
    }

    /// `"{root} {kind}"`, the display format shared with the identifier.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.root.name(), self.kind.display)
    }

    /// Realise the chord as ascending MIDI numbers.
    ///
    /// `inversion` wraps modulo the chord size; negative values clamp to root
    /// position. Returns an empty vector if any tone falls outside `0..=127`.
    pub fn midi(&self, inversion: i32, base_octave: i32) -> Vec<u8> {
        let intervals: Vec<i32> = std::iter::once(0)
            .chain(self.kind.intervals.iter().map(|&i| i as i32))
            .collect();
        let shift = inversion.max(0) as usize % intervals.len();

        let mut octave = base_octave;
        let mut previous: Option<usize> = None;
        let mut midi = Vec::with_capacity(intervals.len());
        for &interval in intervals[shift..].iter().chain(&intervals[..shift]) {
            let pc = self.root.transpose(interval).index();
            if previous.is_some_and(|prev| pc < prev) {
                octave += 1;
            }
            previous = Some(pc);
            midi.push(octave * 12 + pc as i32);
        }
        midi.sort_unstable();

        if midi.iter().any(|&n| !(0..=127).contains(&n)) {
            return vec![];
        }
        midi.into_iter().map(|n| n as u8).collect()
    }
}

/// Chord note names for `(root, kind)`; empty when either is unknown.
///
/// ```
/// use chordlab::chord_notes;
///
/// assert_eq!(chord_notes("A", "minor7"), vec!["A", "C", "E", "G"]);
/// ```
pub fn chord_notes(root: &str, kind: &str) -> Vec<&'static str> {
    Chord::from_names(root, kind)
        .map(|chord| chord.notes().into_iter().map(PitchClass::name).collect())
        .unwrap_or_default()
}

/// MIDI realisation of `(root, kind)` in the given inversion and octave.
pub fn chord_notes_as_midi(root: &str, kind: &str, inversion: i32, base_octave: i32) -> Vec<u8> {
    Chord::from_names(root, kind)
        .map(|chord| chord.midi(inversion, base_octave))
        .unwrap_or_default()
}
