//! Roman-numeral chord resolution.
//!
//! Grammar (after normalisation):
//!
//! ```text
//! [b|#]? (VII|III|IV|VI|II|V|I|vii|iii|iv|vi|ii|v|i) (°|+|dim|aug|7|maj7|min7|M7|dim7)?
//! ```
//!
//! Case selects the default quality (upper = major, lower = minor) and the
//! meaning of a bare `7` (upper = dominant, lower = minor seventh).
//! A lower-case numeral with `maj7`/`M7` resolves to a minor seventh.

use crate::chord::{Chord, ChordKind};
use crate::error::{ChordlabError, Result};
use crate::note::{normalize_token, PitchClass};

/// Numeral cores in match order, with their 0-based scale degree.
const CORES: [(&str, usize); 14] = [
    ("VII", 6),
    ("III", 2),
    ("IV", 3),
    ("VI", 5),
    ("II", 1),
    ("V", 4),
    ("I", 0),
    ("vii", 6),
    ("iii", 2),
    ("iv", 3),
    ("vi", 5),
    ("ii", 1),
    ("v", 4),
    ("i", 0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RomanSuffix {
    None,
    Diminished,
    Augmented,
    Seventh,
    Major7,
    Minor7,
    Diminished7,
}

impl RomanSuffix {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "" => Some(RomanSuffix::None),
            "°" | "dim" => Some(RomanSuffix::Diminished),
            "+" | "aug" => Some(RomanSuffix::Augmented),
            "7" => Some(RomanSuffix::Seventh),
            "maj7" | "M7" => Some(RomanSuffix::Major7),
            "min7" => Some(RomanSuffix::Minor7),
            "dim7" => Some(RomanSuffix::Diminished7),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RomanNumeral {
    /// `-1` for a leading `b`, `+1` for `#`.
    pub accidental: i32,
    pub degree: usize,
    pub upper: bool,
    pub suffix: RomanSuffix,
}

impl RomanNumeral {
    /// Match an already-normalised token against the numeral grammar.
    pub fn parse(token: &str) -> Option<Self> {
        let (accidental, rest) = match token.as_bytes().first() {
            Some(b'b') => (-1, &token[1..]),
            Some(b'#') => (1, &token[1..]),
            _ => (0, token),
        };
        CORES.iter().find_map(|&(core, degree)| {
            let suffix = RomanSuffix::parse(rest.strip_prefix(core)?)?;
            Some(RomanNumeral {
                accidental,
                degree,
                upper: core.starts_with(|c: char| c.is_ascii_uppercase()),
                suffix,
            })
        })
    }

    pub fn kind(&self) -> &'static ChordKind {
        let id = match (self.suffix, self.upper) {
            (RomanSuffix::None, true) => "major",
            (RomanSuffix::None, false) => "minor",
            (RomanSuffix::Diminished, _) => "diminished",
            (RomanSuffix::Augmented, _) => "augmented",
            (RomanSuffix::Seventh, true) => "dominant7",
            (RomanSuffix::Seventh, false) => "minor7",
            (RomanSuffix::Major7, true) => "major7",
            (RomanSuffix::Major7, false) => "minor7",
            (RomanSuffix::Minor7, _) => "minor7",
            (RomanSuffix::Diminished7, _) => "diminished7",
        };
        // Every id above is a registry entry.
        ChordKind::from_id(id).unwrap_or(&crate::chord::CHORD_KINDS[0])
    }

    /// Resolve against the notes of a scale.
    pub fn chord(&self, scale_notes: &[PitchClass]) -> Option<Chord> {
        let degree_root = scale_notes.get(self.degree)?;
        Some(Chord::new(degree_root.transpose(self.accidental), self.kind()))
    }
}

pub fn is_roman(token: &str) -> bool {
    RomanNumeral::parse(token).is_some()
}

/// Resolve a numeral token to a chord in the given scale.
pub fn resolve_roman_chord(token: &str, scale_notes: &[PitchClass]) -> Result<Chord> {
    let normalized = normalize_token(token);
    let numeral = RomanNumeral::parse(&normalized)
        .ok_or_else(|| ChordlabError::InvalidSymbol(token.to_string()))?;
    if scale_notes.is_empty() {
        return Err(ChordlabError::MissingScaleContext(token.to_string()));
    }
    numeral
        .chord(scale_notes)
        .ok_or_else(|| ChordlabError::InvalidSymbol(token.to_string()))
}

/// Resolve a numeral token to the identifier's display name, e.g. `"F Major"`.
///
/// ```
/// use chordlab::{resolve_roman, ScaleKind, PitchClass};
///
/// let c_major = ScaleKind::from_id("major").unwrap().notes(PitchClass::C);
/// assert_eq!(resolve_roman("IV", &c_major).unwrap(), "F Major");
/// assert_eq!(resolve_roman("ii7", &c_major).unwrap(), "D Minor 7");
/// assert_eq!(resolve_roman("bVII", &c_major).unwrap(), "A# Major");
/// ```
pub fn resolve_roman(token: &str, scale_notes: &[PitchClass]) -> Result<String> {
    resolve_roman_chord(token, scale_notes).map(|chord| chord.display_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::ScaleKind;

    fn scale(root: &str, kind: &str) -> Vec<PitchClass> {
        ScaleKind::from_id(kind)
            .unwrap()
            .notes(PitchClass::from_name(root).unwrap())
    }

    #[test]
    fn test_grammar() {
        for token in ["I", "vii°", "bVII", "#iv", "V7", "IVmaj7", "iimin7", "viidim7", "III+", "vaug"] {
            assert!(is_roman(token), "{} should be roman", token);
        }
        for token in ["", "b", "IIII", "Vi", "C", "IV9", "iim7", "VIIsus4", "bb"] {
            assert!(!is_roman(token), "{} should not be roman", token);
        }
    }

    #[test]
    fn test_degrees_in_c_major() {
        let c = scale("C", "major");
        let resolved: Vec<String> = ["I", "ii", "iii", "IV", "V", "vi", "vii°"]
            .iter()
            .map(|t| resolve_roman(t, &c).unwrap())
            .collect();
        assert_eq!(
            resolved,
            vec![
                "C Major",
                "D Minor",
                "E Minor",
                "F Major",
                "G Major",
                "A Minor",
                "B Diminished"
            ]
        );
    }

    #[test]
    fn test_suffix_table() {
        let c = scale("C", "major");
        assert_eq!(resolve_roman("V7", &c).unwrap(), "G Dominant 7");
        assert_eq!(resolve_roman("ii7", &c).unwrap(), "D Minor 7");
        assert_eq!(resolve_roman("IM7", &c).unwrap(), "C Major 7");
        assert_eq!(resolve_roman("IVmaj7", &c).unwrap(), "F Major 7");
        assert_eq!(resolve_roman("vimaj7", &c).unwrap(), "A Minor 7");
        assert_eq!(resolve_roman("Vmin7", &c).unwrap(), "G Minor 7");
        assert_eq!(resolve_roman("viidim7", &c).unwrap(), "B Diminished 7");
        assert_eq!(resolve_roman("III+", &c).unwrap(), "E Augmented");
        assert_eq!(resolve_roman("Idim", &c).unwrap(), "C Diminished");
    }

    #[test]
    fn test_accidentals() {
        let c = scale("C", "major");
        assert_eq!(resolve_roman("bIII", &c).unwrap(), "D# Major");
        assert_eq!(resolve_roman("♭VI", &c).unwrap(), "G# Major");
        assert_eq!(resolve_roman("#iv°", &c).unwrap(), "F# Diminished");
    }

    #[test]
    fn test_minor_key() {
        let a = scale("A", "natural_minor");
        assert_eq!(resolve_roman("i", &a).unwrap(), "A Minor");
        assert_eq!(resolve_roman("III", &a).unwrap(), "C Major");
        assert_eq!(resolve_roman("V7", &a).unwrap(), "E Dominant 7");
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            resolve_roman("IV", &[]),
            Err(ChordlabError::MissingScaleContext(_))
        ));
        assert!(matches!(
            resolve_roman("Cmaj7", &scale("C", "major")),
            Err(ChordlabError::InvalidSymbol(_))
        ));
        // Pentatonic scales have no seventh degree
        assert!(matches!(
            resolve_roman("vii", &scale("C", "major_pentatonic")),
            Err(ChordlabError::InvalidSymbol(_))
        ));
    }
}
