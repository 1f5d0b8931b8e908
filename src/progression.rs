//! # Lead-Sheet Progression Parser
//!
//! Turns a free-form lead-sheet string into an ordered list of chord steps.
//!
//! ## Input
//! - Separators: whitespace, `|` and `-`
//! - Roman numerals (`I`, `vii°`, `bVII`, `V7`) when a scale is supplied
//! - Absolute symbols (`C`, `Em7`, `G/B`, `Bbmaj7`), kept verbatim apart from
//!   normalisation
//! - Unicode accidentals, super- and subscripts (`E♭`, `Am⁷`)
//!
//! ## Output
//! [`ParseResult`] pairs the chords parsed so far with an optional error, so
//! a caller can show partial progress. The first invalid token stops parsing
//! and empties the chord list.
//!
//! ## Example
//! ```rust
//! use chordlab::parse_progression;
//!
//! let result = parse_progression("C | Em⁷ | G/B", None);
//! assert!(result.error.is_none());
//! let names: Vec<_> = result.chords.iter().map(|c| c.name.as_str()).collect();
//! assert_eq!(names, vec!["C", "Em7", "G/B"]);
//! ```

use crate::chord::Chord;
use crate::note::{clean_text, normalize_token, split_root, PitchClass};
use crate::roman::{is_roman, resolve_roman_chord};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Roman,
    Absolute,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionStep {
    /// Token as written (after Unicode cleanup).
    pub symbol: String,
    /// Resolved chord name: display name for Roman steps, normalised symbol
    /// for absolute steps.
    pub name: String,
    pub kind: StepKind,
}

impl ProgressionStep {
    /// The typed chord, when the step can be mapped onto the registry.
    pub fn chord(&self) -> Option<Chord> {
        match self.kind {
            StepKind::Roman => Chord::from_display_name(&self.name),
            StepKind::Absolute => Chord::from_symbol(&self.name),
        }
    }

    /// Name in the identifier's `"{root} {kind}"` format, when typeable.
    pub fn display_name(&self) -> Option<String> {
        self.chord().map(|chord| chord.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ParseResult {
    pub chords: Vec<ProgressionStep>,
    pub error: Option<String>,
}

impl ParseResult {
    fn failed(raw: &str) -> Self {
        ParseResult {
            chords: vec![],
            error: Some(format!("Invalid symbol: {}", raw)),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn names(&self) -> Vec<&str> {
        self.chords.iter().map(|step| step.name.as_str()).collect()
    }
}

fn is_suffix_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '#' | '°' | '+' | 'ø' | '(' | ')')
}

/// Validate and canonicalise an absolute chord symbol.
///
/// Root and slash bass are both folded onto the sharp-canonical alphabet,
/// so `B#` becomes `C` and `G/Bbb` becomes `G/A`.
fn absolute_symbol(token: &str) -> Option<String> {
    let (head, bass) = match token.split_once('/') {
        Some((head, bass)) => (head, Some(bass)),
        None => (token, None),
    };
    let (root, suffix) = split_root(head)?;
    if !suffix.chars().all(is_suffix_char) {
        return None;
    }
    match bass {
        None => Some(format!("{}{}", root.name(), suffix)),
        Some(bass) => {
            let bass = normalize_token(bass);
            let (bass, rest) = split_root(&bass)?;
            if !rest.is_empty() {
                return None;
            }
            Some(format!("{}{}/{}", root.name(), suffix, bass.name()))
        }
    }
}

/// Parse a lead-sheet string.
///
/// `scale_notes` supplies the key for Roman numerals. Without it, numerals
/// are rejected rather than guessed.
pub fn parse_progression(input: &str, scale_notes: Option<&[PitchClass]>) -> ParseResult {
    let cleaned = clean_text(input).replace(['|', '-'], " ");
    let mut chords = Vec::new();

    for raw in cleaned.split_whitespace() {
        let token = normalize_token(raw);

        if is_roman(&token) {
            let Some(scale) = scale_notes else {
                return ParseResult::failed(raw);
            };
            match resolve_roman_chord(&token, scale) {
                Ok(chord) => chords.push(ProgressionStep {
                    symbol: raw.to_string(),
                    name: chord.display_name(),
                    kind: StepKind::Roman,
                }),
                Err(_) => return ParseResult::failed(raw),
            }
            continue;
        }

        match absolute_symbol(&token) {
            Some(name) => chords.push(ProgressionStep {
                symbol: raw.to_string(),
                name,
                kind: StepKind::Absolute,
            }),
            None => return ParseResult::failed(raw),
        }
    }

    ParseResult {
        chords,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::ScaleKind;

    fn c_major() -> Vec<PitchClass> {
        ScaleKind::from_id("major").unwrap().notes(PitchClass::C)
    }

    #[test]
    fn test_lead_sheet_without_key() {
        let result = parse_progression("C | Em⁷ | G/B | Am⁷ | D | G", None);
        assert_eq!(result.error, None);
        assert_eq!(result.names(), vec!["C", "Em7", "G/B", "Am7", "D", "G"]);
        assert!(result.chords.iter().all(|c| c.kind == StepKind::Absolute));
        assert_eq!(result.chords[1].symbol, "Em7");
    }

    #[test]
    fn test_roman_resolution() {
        let scale = c_major();
        let result = parse_progression("I IV V I", Some(&scale));
        assert!(result.is_ok());
        assert_eq!(result.names(), vec!["C Major", "F Major", "G Major", "C Major"]);
        assert!(result.chords.iter().all(|c| c.kind == StepKind::Roman));
    }

    #[test]
    fn test_mixed_roman_and_absolute() {
        let scale = c_major();
        let result = parse_progression("ii7-V7 | Cmaj7 - bVII", Some(&scale));
        assert!(result.is_ok());
        assert_eq!(
            result.names(),
            vec!["D Minor 7", "G Dominant 7", "Cmaj7", "A# Major"]
        );
    }

    #[test]
    fn test_flats_and_slash_bass_are_canonicalised() {
        let result = parse_progression("Bb Ebm7 G/Bb db", None);
        assert_eq!(result.names(), vec!["A#", "D#m7", "G/A#", "C#"]);
    }

    #[test]
    fn test_enharmonic_roots_use_the_alphabet() {
        let result = parse_progression("B# E#m Cb Fb Cbb Fbb cbb7 F##/E#", None);
        assert!(result.is_ok(), "{:?}", result.error);
        assert_eq!(
            result.names(),
            vec!["C", "Fm", "B", "E", "A#", "D#", "A#7", "G/F"]
        );
        let display: Vec<_> = result
            .chords
            .iter()
            .map(|s| s.display_name().unwrap())
            .collect();
        assert_eq!(
            display,
            vec![
                "C Major", "F Minor", "B Major", "E Major", "A# Major", "D# Major",
                "A# Dominant 7", "G Major"
            ]
        );
        for step in &result.chords {
            assert!(!step.name.contains('b'), "{}", step.name);
        }
    }

    #[test]
    fn test_empty_input() {
        let result = parse_progression("   |  - ", None);
        assert_eq!(result, ParseResult::default());
        assert_eq!(parse_progression("", None).error, None);
    }

    #[test]
    fn test_invalid_symbol_stops_parsing() {
        let result = parse_progression("C G H7 F", None);
        assert!(result.chords.is_empty());
        assert_eq!(result.error.as_deref(), Some("Invalid symbol: H7"));

        let result = parse_progression("C G/Xb", None);
        assert_eq!(result.error.as_deref(), Some("Invalid symbol: G/Xb"));
    }

    #[test]
    fn test_roman_without_key_is_rejected() {
        let result = parse_progression("C IV", None);
        assert_eq!(result.error.as_deref(), Some("Invalid symbol: IV"));
        let result = parse_progression("bVII", None);
        assert_eq!(result.error.as_deref(), Some("Invalid symbol: bVII"));
    }

    #[test]
    fn test_zero_width_characters_are_ignored() {
        let result = parse_progression("C\u{200B} |\u{2009}F\u{FEFF}", None);
        assert_eq!(result.names(), vec!["C", "F"]);
    }

    #[test]
    fn test_absolute_round_trip() {
        let inputs = [
            "C | Em⁷ | G/B | Am⁷",
            "Bb - Ebmaj7 - F7sus4 - Gm",
            "c e♭ f#dim a+",
            "Cbb Fbb cbb7",
            "B# E#m G/Cbb",
        ];
        for input in inputs {
            let first = parse_progression(input, None);
            assert!(first.is_ok(), "{}: {:?}", input, first.error);
            let rejoined = first.names().join(" ");
            let second = parse_progression(&rejoined, None);
            assert_eq!(second.names(), first.names());
        }
    }

    #[test]
    fn test_step_display_names() {
        let scale = c_major();
        let result = parse_progression("Am7 G/B vi Csus9", Some(&scale));
        let names: Vec<_> = result.chords.iter().map(|s| s.display_name()).collect();
        assert_eq!(
            names,
            vec![
                Some("A Minor 7".to_string()),
                Some("G Major".to_string()),
                Some("A Minor".to_string()),
                None
            ]
        );
    }
}
