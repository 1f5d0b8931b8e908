//! Directory-backed document store.
//!
//! One `<id>.json` file per document, written in the portable text
//! encoding, so a store directory can be copied between machines or edited
//! by hand. Files that fail validation, or whose name does not match the id
//! inside, are skipped by [`DocumentStore::list`] and rejected by
//! [`DocumentStore::load`].
//!
//! Writes go to `<id>.json.tmp` first and are renamed into place, so a
//! crash never leaves a half-written document under its real name.

use crate::document::ProgressionDocument;
use crate::error::{ChordlabError, Result};
use crate::playback::Recording;
use log::{debug, warn};
use std::fs;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A document with an id and a strict JSON encoding.
pub trait Document: Sized {
    fn id(&self) -> Uuid;
    fn created_at(&self) -> u64;
    fn validate(&self) -> Result<()>;
    fn from_json(text: &str) -> Result<Self>;
    fn to_json(&self) -> Result<String>;
}

impl Document for Recording {
    fn id(&self) -> Uuid {
        self.id
    }
    fn created_at(&self) -> u64 {
        self.created_at
    }
    fn validate(&self) -> Result<()> {
        Recording::validate(self)
    }
    fn from_json(text: &str) -> Result<Self> {
        Recording::from_json(text)
    }
    fn to_json(&self) -> Result<String> {
        Recording::to_json(self)
    }
}

impl Document for ProgressionDocument {
    fn id(&self) -> Uuid {
        self.id
    }
    fn created_at(&self) -> u64 {
        self.created_at
    }
    fn validate(&self) -> Result<()> {
        ProgressionDocument::validate(self)
    }
    fn from_json(text: &str) -> Result<Self> {
        ProgressionDocument::from_json(text)
    }
    fn to_json(&self) -> Result<String> {
        ProgressionDocument::to_json(self)
    }
}

pub struct DocumentStore<D: Document> {
    dir: PathBuf,
    _doc: PhantomData<D>,
}

impl<D: Document> DocumentStore<D> {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            _doc: PhantomData,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Validate and write a document, replacing any with the same id.
    pub fn save(&self, doc: &D) -> Result<PathBuf> {
        doc.validate()?;
        let path = self.path(doc.id());
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, doc.to_json()?)?;
        if let Err(e) = fs::rename(&staging, &path) {
            let _ = fs::remove_file(&staging);
            return Err(e.into());
        }
        debug!("saved {}", path.display());
        Ok(path)
    }

    /// Load the document stored under `id`.
    ///
    /// A file holding a different id (renamed or copied by hand) counts as
    /// missing.
    pub fn load(&self, id: Uuid) -> Result<D> {
        let text = self.read(id)?;
        let doc = D::from_json(&text)?;
        if doc.id() != id {
            warn!("{} holds document {}", self.path(id).display(), doc.id());
            return Err(ChordlabError::NotFound(id.to_string()));
        }
        Ok(doc)
    }

    fn read(&self, id: Uuid) -> Result<String> {
        let path = self.path(id);
        match fs::read_to_string(&path) {
            Ok(text) => {
                debug!("read {}", path.display());
                Ok(text)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(ChordlabError::NotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Every valid document, newest first.
    pub fn list(&self) -> Result<Vec<D>> {
        let mut docs = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let parsed = fs::read_to_string(&path)
                .map_err(ChordlabError::from)
                .and_then(|text| D::from_json(&text));
            match parsed {
                Ok(doc) if path == self.path(doc.id()) => docs.push(doc),
                Ok(doc) => warn!("skipping {}: holds document {}", path.display(), doc.id()),
                Err(e) => warn!("skipping {}: {}", path.display(), e),
            }
        }
        docs.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| a.id().cmp(&b.id()))
        });
        Ok(docs)
    }

    pub fn delete(&self, id: Uuid) -> Result<()> {
        let path = self.path(id);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("deleted {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(ChordlabError::NotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Portable text of a stored document.
    pub fn export(&self, id: Uuid) -> Result<String> {
        self.load(id)?.to_json()
    }

    /// Strictly validate portable text, then store it.
    pub fn import(&self, text: &str) -> Result<D> {
        let doc = D::from_json(text)?;
        self.save(&doc)?;
        Ok(doc)
    }
}
