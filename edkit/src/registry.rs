//! Keyed ownership of open documents.
//!
//! One document per file path, with an explicit lifecycle: registered when a
//! path is first opened, removed exactly when its tab closes. Paths are
//! unified ([`unify_path`]) before keying so two spellings of the same file
//! cannot produce two documents.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::buffer::{ActiveDocumentProvider, TextBuffer};
use crate::errors::{unify_path, EditResult};

/// A file currently open in an editor tab.
#[derive(Debug)]
pub struct OpenDocument<B> {
    path: PathBuf,
    pub buffer: B,
    pub dirty: bool,
}

impl<B> OpenDocument<B> {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Outcome of asking the registry about a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The path is open; focus the existing tab instead of creating one.
    Open,
    /// Not open; the caller should read the file and register it.
    NeedsOpen,
}

/// Path-to-document table with at-most-one document per unified path.
#[derive(Debug, Default)]
pub struct OpenDocumentRegistry<B> {
    documents: HashMap<PathBuf, OpenDocument<B>>,
    focused: Option<PathBuf>,
}

impl<B: TextBuffer> OpenDocumentRegistry<B> {
    pub fn new() -> Self {
        Self {
            documents: HashMap::new(),
            focused: None,
        }
    }

    pub fn resolve(&self, path: &Path) -> Resolution {
        if self.documents.contains_key(&unify_path(path)) {
            Resolution::Open
        } else {
            Resolution::NeedsOpen
        }
    }

    pub fn get(&self, path: &Path) -> Option<&OpenDocument<B>> {
        self.documents.get(&unify_path(path))
    }

    pub fn get_mut(&mut self, path: &Path) -> Option<&mut OpenDocument<B>> {
        self.documents.get_mut(&unify_path(path))
    }

    /// Returns the already-open document for `path`, or reads and registers
    /// it via the file-I/O collaborator `read`. The document gains focus on
    /// success; a failed read registers nothing and leaves focus where it
    /// was. `read` runs at most once, and only for a path that is not open.
    pub fn open_or_focus<F>(&mut self, path: &Path, read: F) -> EditResult<&mut OpenDocument<B>>
    where
        F: FnOnce(&Path) -> EditResult<B>,
    {
        let key = unify_path(path);
        match self.documents.entry(key) {
            Entry::Occupied(entry) => {
                self.focused = Some(entry.key().clone());
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                let buffer = read(path)?;
                debug!("opened {}", entry.key().display());
                let document = OpenDocument {
                    path: entry.key().clone(),
                    buffer,
                    dirty: false,
                };
                self.focused = Some(entry.key().clone());
                Ok(entry.insert(document))
            }
        }
    }

    /// Removes the document when its tab closes. Removing a path that is not
    /// registered is a no-op.
    pub fn remove(&mut self, path: &Path) -> Option<OpenDocument<B>> {
        let key = unify_path(path);
        if self.focused.as_deref() == Some(key.as_path()) {
            self.focused = None;
        }
        let removed = self.documents.remove(&key);
        if removed.is_some() {
            debug!("closed {}", key.display());
        }
        removed
    }

    /// Marks an open path as the active tab; no-op for unknown paths.
    pub fn focus(&mut self, path: &Path) {
        let key = unify_path(path);
        if self.documents.contains_key(&key) {
            self.focused = Some(key);
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl<B: TextBuffer> ActiveDocumentProvider for OpenDocumentRegistry<B> {
    type Buffer = B;

    fn active_buffer(&mut self) -> Option<&mut B> {
        let focused = self.focused.clone()?;
        self.documents.get_mut(&focused).map(|doc| &mut doc.buffer)
    }
}
