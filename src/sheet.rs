//! Lead-sheet files: optional YAML front-matter followed by a progression body.
//!
//! ```text
//! ---
//! title: Autumn Leaves (A section)
//! key: G
//! scale: natural_minor
//! ---
//! iv | VII | III | VI
//! ```
//!
//! The front-matter key and scale become the Roman-numeral context for the
//! body. A sheet without a `key` still parses; its Roman steps are reported
//! as invalid symbols the way an unanchored progression is.

use crate::document::ProgressionDocument;
use crate::error::{ChordlabError, Result};
use crate::note::PitchClass;
use crate::progression::{parse_progression, ParseResult};
use crate::scale::ScaleKind;
use serde::Deserialize;

/// Name used for documents made from sheets without a title.
pub const DEFAULT_PROGRESSION_NAME: &str = "Untitled Progression";

/// Raw front-matter for YAML deserialization
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case")]
struct RawSheetMetadata {
    title: Option<String>,
    key: Option<String>,
    scale: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeadSheet {
    pub title: Option<String>,
    pub key: Option<PitchClass>,
    pub scale: &'static ScaleKind,
    pub body: String,
}

impl LeadSheet {
    pub fn parse(source: &str) -> Result<Self> {
        let (front_matter, body) = split_front_matter(source);
        let raw = match front_matter {
            Some(content) if !content.trim().is_empty() => {
                serde_yaml::from_str::<RawSheetMetadata>(&content)
                    .map_err(|e| ChordlabError::Config(e.to_string()))?
            }
            _ => RawSheetMetadata::default(),
        };

        let key = match &raw.key {
            Some(k) => Some(
                PitchClass::from_name(k)
                    .ok_or_else(|| ChordlabError::Config(format!("Invalid key: {}", k)))?,
            ),
            None => None,
        };
        let scale = match &raw.scale {
            Some(s) => ScaleKind::from_id(s)
                .ok_or_else(|| ChordlabError::Config(format!("Invalid scale: {}", s)))?,
            None => ScaleKind::major(),
        };

        Ok(LeadSheet {
            title: raw.title,
            key,
            scale,
            body: body.trim().to_string(),
        })
    }

    pub fn scale_context(&self) -> Option<Vec<PitchClass>> {
        self.key.map(|root| self.scale.notes(root))
    }

    /// Parse the body against the front-matter key and scale.
    pub fn resolve(&self) -> ParseResult {
        let context = self.scale_context();
        parse_progression(&self.body, context.as_deref())
    }

    pub fn to_document(&self) -> Result<ProgressionDocument> {
        let name = self
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_PROGRESSION_NAME);
        ProgressionDocument::new(name, &self.body, self.scale, self.key)
    }
}

/// Split the first `---` delimited block from the rest of the source.
fn split_front_matter(source: &str) -> (Option<String>, String) {
    let lines: Vec<&str> = source.lines().collect();
    let mut markers = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.trim() == "---")
        .map(|(i, _)| i);

    match (markers.next(), markers.next()) {
        (Some(start), Some(end)) => {
            let front_matter = lines[start + 1..end].join("\n");
            let body: Vec<&str> = lines[..start]
                .iter()
                .chain(lines[end + 1..].iter())
                .copied()
                .collect();
            (Some(front_matter), body.join("\n"))
        }
        _ => (None, source.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_with_front_matter() {
        let source = r#"---
title: Minor Turnaround
key: A
scale: natural_minor
---
i | iv | v | i
"#;
        let sheet = LeadSheet::parse(source).unwrap();
        assert_eq!(sheet.title.as_deref(), Some("Minor Turnaround"));
        assert_eq!(sheet.key, PitchClass::from_name("A"));
        assert_eq!(sheet.scale.id, "natural_minor");

        let result = sheet.resolve();
        assert!(result.is_ok());
        assert_eq!(result.names(), vec!["A Minor", "D Minor", "E Minor", "A Minor"]);
    }

    #[test]
    fn test_sheet_without_front_matter() {
        let sheet = LeadSheet::parse("C | Am | F | G").unwrap();
        assert_eq!(sheet.title, None);
        assert_eq!(sheet.key, None);
        assert_eq!(sheet.scale.id, "major");
        assert_eq!(sheet.resolve().names(), vec!["C", "Am", "F", "G"]);
    }

    #[test]
    fn test_flat_key_is_canonicalised() {
        let sheet = LeadSheet::parse("---\nkey: Bb\n---\nI IV V").unwrap();
        assert_eq!(sheet.key.map(|k| k.name()), Some("A#"));
        assert_eq!(
            sheet.resolve().names(),
            vec!["A# Major", "D# Major", "F Major"]
        );
    }

    #[test]
    fn test_roman_body_without_key() {
        let sheet = LeadSheet::parse("---\ntitle: No key\n---\nI V").unwrap();
        let result = sheet.resolve();
        assert!(result.chords.is_empty());
        assert_eq!(result.error.as_deref(), Some("Invalid symbol: I"));
    }

    #[test]
    fn test_invalid_front_matter() {
        assert!(matches!(
            LeadSheet::parse("---\nkey: H\n---\nC"),
            Err(ChordlabError::Config(_))
        ));
        assert!(matches!(
            LeadSheet::parse("---\nscale: bebop\n---\nC"),
            Err(ChordlabError::Config(_))
        ));
        assert!(matches!(
            LeadSheet::parse("---\ntitle: [unclosed\n---\nC"),
            Err(ChordlabError::Config(_))
        ));
    }

    #[test]
    fn test_to_document() {
        let sheet = LeadSheet::parse("---\nkey: D\nscale: dorian\n---\ni IV").unwrap();
        let doc = sheet.to_document().unwrap();
        assert_eq!(doc.name, DEFAULT_PROGRESSION_NAME);
        assert_eq!(doc.progression, "i IV");
        assert_eq!(doc.metadata.scale_type, "dorian");
        assert_eq!(doc.parse().names(), vec!["D Minor", "G Major"]);
    }
}
