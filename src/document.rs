//! # Portable Documents
//!
//! Schema and strict validation for the two documents the persistence layer
//! stores: recordings (see [`crate::playback::Recording`]) and progressions
//! ([`ProgressionDocument`]).
//!
//! Validation happens on the untyped JSON value before deserialisation, so
//! every error names the exact field that failed (`metadata.scaleType`,
//! `events[2].velocity`).
//!
//! ## Progression Document
//! ```json
//! { "version": "1.0.0",
//!   "id": "<UUIDv4>",
//!   "name": "<string ≤100>",
//!   "progression": "<lead-sheet string>",
//!   "createdAt": 1700000000000,
//!   "metadata": { "scaleType": "major", "key": "C" } }
//! ```

use crate::error::{ChordlabError, Result};
use crate::note::PitchClass;
use crate::progression::{parse_progression, ParseResult};
use crate::scale::ScaleKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

pub const PROGRESSION_VERSION: &str = "1.0.0";

/// Longest accepted document name, in characters.
pub const MAX_NAME_CHARS: usize = 100;

#[derive(Debug, Clone, Copy)]
pub(crate) enum DocKind {
    Recording,
    Progression,
}

impl DocKind {
    pub(crate) fn error(self, field: impl Into<String>, message: impl Into<String>) -> ChordlabError {
        match self {
            DocKind::Recording => ChordlabError::recording(field, message),
            DocKind::Progression => ChordlabError::progression(field, message),
        }
    }
}

/// Typed accessors over one JSON object, reporting errors by field path.
pub(crate) struct Fields<'a> {
    obj: &'a Map<String, Value>,
    prefix: String,
    kind: DocKind,
}

impl<'a> Fields<'a> {
    pub(crate) fn new(value: &'a Value, prefix: &str, kind: DocKind) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            let field = if prefix.is_empty() { "<root>" } else { prefix };
            kind.error(field, "expected an object")
        })?;
        Ok(Fields {
            obj,
            prefix: prefix.to_string(),
            kind,
        })
    }

    pub(crate) fn path(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.prefix, key)
        }
    }

    pub(crate) fn fail(&self, key: &str, message: impl Into<String>) -> ChordlabError {
        self.kind.error(self.path(key), message)
    }

    fn required(&self, key: &str) -> Result<&'a Value> {
        self.obj
            .get(key)
            .ok_or_else(|| self.fail(key, "missing required field"))
    }

    pub(crate) fn optional(&self, key: &str) -> Option<&'a Value> {
        self.obj.get(key).filter(|v| !v.is_null())
    }

    pub(crate) fn str(&self, key: &str) -> Result<&'a str> {
        self.required(key)?
            .as_str()
            .ok_or_else(|| self.fail(key, "expected a string"))
    }

    pub(crate) fn positive_u64(&self, key: &str) -> Result<u64> {
        match self.required(key)?.as_u64() {
            Some(n) if n > 0 => Ok(n),
            _ => Err(self.fail(key, "expected a positive integer")),
        }
    }

    pub(crate) fn non_negative(&self, key: &str) -> Result<f64> {
        match self.required(key)?.as_f64() {
            Some(n) if n.is_finite() && n >= 0.0 => Ok(n),
            _ => Err(self.fail(key, "expected a non-negative number")),
        }
    }

    pub(crate) fn int_at_most(&self, key: &str, max: u64) -> Result<u8> {
        match self.required(key)?.as_u64() {
            Some(n) if n <= max => Ok(n as u8),
            _ => Err(self.fail(key, format!("expected an integer in 0..={}", max))),
        }
    }

    pub(crate) fn array(&self, key: &str) -> Result<&'a Vec<Value>> {
        self.required(key)?
            .as_array()
            .ok_or_else(|| self.fail(key, "expected an array"))
    }

    pub(crate) fn object(&self, key: &str) -> Result<Fields<'a>> {
        Fields::new(self.required(key)?, &self.path(key), self.kind)
    }

    pub(crate) fn name(&self, key: &str) -> Result<&'a str> {
        let name = self.str(key)?;
        check_name(name).map_err(|message| self.fail(key, message))?;
        Ok(name)
    }

    pub(crate) fn uuid_v4(&self, key: &str) -> Result<Uuid> {
        let id = Uuid::parse_str(self.str(key)?)
            .map_err(|_| self.fail(key, "expected a UUID"))?;
        check_uuid(id).map_err(|message| self.fail(key, message))?;
        Ok(id)
    }
}

pub(crate) fn check_name(name: &str) -> std::result::Result<(), &'static str> {
    if name.trim().is_empty() {
        Err("must not be empty")
    } else if name.chars().count() > MAX_NAME_CHARS {
        Err("must be at most 100 characters")
    } else {
        Ok(())
    }
}

pub(crate) fn check_uuid(id: Uuid) -> std::result::Result<(), &'static str> {
    if id.get_version_num() == 4 {
        Ok(())
    } else {
        Err("expected a version 4 UUID")
    }
}

/// Milliseconds since the Unix epoch, for `createdAt` stamps.
pub fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(1)
        .max(1)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionMetadata {
    pub scale_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<PitchClass>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Unknown keys, at the top level and inside `metadata`, are kept in the
/// `extra` maps and written back on export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionDocument {
    pub version: String,
    pub id: Uuid,
    pub name: String,
    pub progression: String,
    pub created_at: u64,
    pub metadata: ProgressionMetadata,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProgressionDocument {
    pub fn new(
        name: &str,
        progression: &str,
        scale: &'static ScaleKind,
        key: Option<PitchClass>,
    ) -> Result<Self> {
        let doc = ProgressionDocument {
            version: PROGRESSION_VERSION.to_string(),
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            progression: progression.to_string(),
            created_at: epoch_ms(),
            metadata: ProgressionMetadata {
                scale_type: scale.id.to_string(),
                key,
                extra: Map::new(),
            },
            extra: Map::new(),
        };
        doc.validate()?;
        Ok(doc)
    }

    /// Parse and strictly validate the portable text encoding.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        let fields = Fields::new(value, "", DocKind::Progression)?;
        let version = fields.str("version")?;
        if !version.starts_with("1.") {
            return Err(fields.fail("version", format!("unsupported version {}", version)));
        }
        fields.uuid_v4("id")?;
        fields.name("name")?;
        fields.str("progression")?;
        fields.positive_u64("createdAt")?;

        let metadata = fields.object("metadata")?;
        let scale = metadata.str("scaleType")?;
        if ScaleKind::from_id(scale).is_none() {
            return Err(metadata.fail("scaleType", format!("unknown scale type {}", scale)));
        }
        if let Some(key) = metadata.optional("key") {
            let key = key
                .as_str()
                .ok_or_else(|| metadata.fail("key", "expected a string"))?;
            if PitchClass::from_name(key).is_none() {
                return Err(metadata.fail("key", format!("unknown pitch class {}", key)));
            }
        }

        Ok(serde_json::from_value(value.clone())?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the invariants of an already-typed document.
    pub fn validate(&self) -> Result<()> {
        let fail = |field: &str, message: &str| Err(ChordlabError::progression(field, message));
        if !self.version.starts_with("1.") {
            return fail("version", "unsupported version");
        }
        if let Err(message) = check_uuid(self.id) {
            return fail("id", message);
        }
        if let Err(message) = check_name(&self.name) {
            return fail("name", message);
        }
        if self.created_at == 0 {
            return fail("createdAt", "expected a positive integer");
        }
        if ScaleKind::from_id(&self.metadata.scale_type).is_none() {
            return fail("metadata.scaleType", "unknown scale type");
        }
        Ok(())
    }

    pub fn scale(&self) -> Option<&'static ScaleKind> {
        ScaleKind::from_id(&self.metadata.scale_type)
    }

    /// Scale notes for Roman numerals, when the document names a key.
    pub fn scale_context(&self) -> Option<Vec<PitchClass>> {
        Some(self.scale()?.notes(self.metadata.key?))
    }

    pub fn parse(&self) -> ParseResult {
        let context = self.scale_context();
        parse_progression(&self.progression, context.as_deref())
    }
}
