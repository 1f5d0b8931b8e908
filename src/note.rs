//! # Note Normaliser and Pitch Classes
//!
//! Every symbolic input (note names, chord roots, lead-sheet tokens) passes
//! through this module before the theory engines look at it.
//!
//! ## Canonical Alphabet
//! Names are always sharp-canonical: `C C# D D# E F F# G G# A A# B`.
//! Any other spelling of a root (`Db`, `Cb`, `Cbb`, `E#`, `B#`, `F##`) and
//! Unicode `♭`/`♯` are rewritten on input; output never contains a flat.
//!
//! ## Cleanup Pipeline
//! 1. Strip zero-width characters and soft hyphens
//! 2. Map Unicode spaces and line/paragraph separators to ASCII space
//! 3. Map `♭`/`♯`, subscript and superscript glyphs to ASCII
//! 4. Uppercase a leading `a`..`g` (Roman numerals keep their case)
//! 5. Fold a leading `[A-G]` and its whole run of `#`/`b` onto the alphabet
//!
//! ## MIDI Numbers
//! `pitch_class = midi % 12` and `octave = midi / 12`, so MIDI 60 is `C` in
//! octave 5 under this numbering.

use crate::error::{ChordlabError, Result};
use crate::roman::is_roman;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// The closed 12-element sharp-canonical alphabet, indexed by pitch class.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// A pitch class in `0..12`, where `0` is C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PitchClass(u8);

impl PitchClass {
    pub const C: PitchClass = PitchClass(0);

    /// Wrap any integer onto the 12-tone circle.
    pub fn new(value: i32) -> Self {
        PitchClass(value.rem_euclid(12) as u8)
    }

    /// Parse a note name after normalisation.
    ///
    /// Accepts any number of trailing `#`/`b` accidentals (`E#` is F, `Cb` is B)
    /// and ignores nothing else: `"C#m"` is not a note name.
    ///
    /// ```
    /// use chordlab::PitchClass;
    ///
    /// assert_eq!(PitchClass::from_name("Bb").unwrap().name(), "A#");
    /// assert_eq!(PitchClass::from_name("f♯").unwrap().name(), "F#");
    /// assert!(PitchClass::from_name("H").is_none());
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        let cleaned = clean_text(name);
        let mut chars = cleaned.trim().chars();
        let base = letter_value(chars.next()?.to_ascii_uppercase())?;
        let mut offset = 0;
        for c in chars {
            match c {
                '#' => offset += 1,
                'b' => offset -= 1,
                _ => return None,
            }
        }
        Some(PitchClass::new(base + offset))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn name(self) -> &'static str {
        NOTE_NAMES[self.index()]
    }

    pub fn transpose(self, semitones: i32) -> Self {
        PitchClass::new(self.0 as i32 + semitones)
    }

    /// Semitones from `other` up to `self`, in `0..12`.
    pub fn interval_from(self, other: PitchClass) -> u8 {
        (self.0 + 12 - other.0) % 12
    }

    /// All twelve pitch classes in alphabet order.
    pub fn all() -> impl Iterator<Item = PitchClass> {
        (0..12).map(PitchClass)
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for PitchClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for PitchClass {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        PitchClass::from_name(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid pitch class: {}", name)))
    }
}

/// Split a leading `[A-G]` and its run of accidentals off `token`.
///
/// `"Cbbmaj7"` gives `(A#, "maj7")`. The remainder never starts with `#`
/// or `b`.
pub(crate) fn split_root(token: &str) -> Option<(PitchClass, &str)> {
    let base = letter_value(token.chars().next()?)?;
    let rest = &token[1..];
    let tail = rest.trim_start_matches(['#', 'b']);
    let offset: i32 = rest[..rest.len() - tail.len()]
        .chars()
        .map(|c| if c == '#' { 1 } else { -1 })
        .sum();
    Some((PitchClass::new(base + offset), tail))
}

fn letter_value(letter: char) -> Option<i32> {
    match letter {
        'C' => Some(0),
        'D' => Some(2),
        'E' => Some(4),
        'F' => Some(5),
        'G' => Some(7),
        'A' => Some(9),
        'B' => Some(11),
        _ => None,
    }
}

/// Map a single Unicode glyph onto its ASCII replacement.
///
/// `None` means the character is dropped.
fn map_glyph(c: char) -> Option<&'static str> {
    let mapped = match c {
        '\u{200B}'..='\u{200D}' | '\u{FEFF}' | '\u{00AD}' => return None,
        '\u{2000}'..='\u{200A}' | '\u{2028}' | '\u{2029}' | '\u{00A0}' | '\u{202F}'
        | '\u{205F}' | '\u{3000}' => " ",
        '♭' => "b",
        '♯' => "#",
        // Superscript digits
        '⁰' => "0",
        '¹' => "1",
        '²' => "2",
        '³' => "3",
        '⁴' => "4",
        '⁵' => "5",
        '⁶' => "6",
        '⁷' => "7",
        '⁸' => "8",
        '⁹' => "9",
        '⁺' => "+",
        // Subscript digits
        '₀' => "0",
        '₁' => "1",
        '₂' => "2",
        '₃' => "3",
        '₄' => "4",
        '₅' => "5",
        '₆' => "6",
        '₇' => "7",
        '₈' => "8",
        '₉' => "9",
        '₊' => "+",
        // Superscript letters, enough to spell maj/min/dim/sus/add
        'ᵐ' => "m",
        'ᵃ' => "a",
        'ʲ' => "j",
        'ⁱ' => "i",
        'ⁿ' => "n",
        'ᵈ' => "d",
        'ᵘ' => "u",
        'ˢ' => "s",
        'ᵍ' => "g",
        'ᴹ' => "M",
        'ᵒ' | 'º' | '˚' => "°",
        // Subscript letters
        'ₐ' => "a",
        'ₑ' => "e",
        'ₒ' => "o",
        'ₓ' => "x",
        'ₕ' => "h",
        'ₖ' => "k",
        'ₗ' => "l",
        'ₘ' => "m",
        'ₙ' => "n",
        'ₚ' => "p",
        'ₛ' => "s",
        'ₜ' => "t",
        'ᵢ' => "i",
        'ⱼ' => "j",
        'ᵣ' => "r",
        'ᵤ' => "u",
        'ᵥ' => "v",
        _ => return Some(""),
    };
    Some(mapped)
}

/// Apply the Unicode cleanup steps to arbitrary text.
///
/// Unlike [`normalize_token`] this does not trim or touch letter case, so it
/// is safe to run over a whole lead-sheet line before splitting.
pub fn clean_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match map_glyph(c) {
            None => {}
            Some("") => out.push(c),
            Some(replacement) => out.push_str(replacement),
        }
    }
    out
}

/// Normalise a note or chord token.
///
/// Idempotent and total: the result is trimmed, cleaned and sharp-canonical.
/// Tokens the normaliser cannot classify come back cleaned but otherwise
/// unchanged, so downstream classifiers can decide what they are.
///
/// ```
/// use chordlab::normalize_token;
///
/// assert_eq!(normalize_token("bb"), "A#");
/// assert_eq!(normalize_token("E♭m⁷"), "D#m7");
/// assert_eq!(normalize_token("Cbb"), "A#");
/// assert_eq!(normalize_token("\u{200B}vii°"), "vii°");
/// ```
pub fn normalize_token(token: &str) -> String {
    let cleaned = clean_text(token);
    let trimmed = cleaned.trim();
    if trimmed.is_empty() || is_roman(trimmed) {
        return trimmed.to_string();
    }

    let mut chars = trimmed.chars();
    let first = match chars.next() {
        Some(c) if ('a'..='g').contains(&c) => c.to_ascii_uppercase(),
        Some(c) => c,
        None => return String::new(),
    };
    let rest = chars.as_str();
    let mut token = String::with_capacity(trimmed.len());
    token.push(first);
    token.push_str(rest);

    match split_root(&token) {
        Some((root, tail)) => format!("{}{}", root.name(), tail),
        None => token,
    }
}

/// Strict variant of [`normalize_token`]: the result must start with `A`..`G`.
pub fn normalize_note_strict(token: &str) -> Result<String> {
    let normalized = normalize_token(token);
    match normalized.chars().next() {
        Some(c) if letter_value(c).is_some() => Ok(normalized),
        _ => Err(ChordlabError::InvalidNote(token.to_string())),
    }
}

pub fn midi_to_pitch_class(midi: u8) -> PitchClass {
    PitchClass::new(midi as i32)
}

pub fn midi_octave(midi: u8) -> i32 {
    midi as i32 / 12
}

/// Name a MIDI number as pitch class plus octave, e.g. `60` → `"C5"`.
pub fn midi_to_name(midi: u8) -> String {
    format!("{}{}", midi_to_pitch_class(midi).name(), midi_octave(midi))
}
