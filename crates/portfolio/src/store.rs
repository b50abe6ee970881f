//! JSON document store backing the portfolio.
//!
//! The whole state lives in a single JSON file. Reads never fail: a missing
//! or unparseable backing store yields the default empty document. Writes
//! fully overwrite the file and are treated as durable once they return.
//!
//! Every mutation is a read-modify-write over the whole document. To keep two
//! concurrent mutations from losing an update, a cycle is expressed as a
//! [`DocumentTxn`]: an async mutex guard held from the read until the write,
//! serializing writers within the process.

use crate::types::Document;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};

/// Errors raised when persisting the document.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file could not be written.
    #[error("failed to write document store: {0}")]
    Io(#[from] std::io::Error),

    /// The document could not be encoded.
    #[error("failed to encode document: {0}")]
    Encode(#[from] serde_json::Error),
}

/// File-backed JSON document store.
pub struct JsonStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for JsonStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonStore").field("path", &self.path).finish()
    }
}

impl JsonStore {
    /// Creates a store over the given file path. The file does not need to
    /// exist yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the current document.
    ///
    /// A missing or corrupt backing store yields the default empty document
    /// rather than an error.
    pub async fn read(&self) -> Document {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(doc) => doc,
                Err(err) => {
                    tracing::warn!(
                        "document store at {} is unreadable, starting from empty: {}",
                        self.path.display(),
                        err
                    );
                    Document::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Document::default(),
            Err(err) => {
                tracing::warn!(
                    "failed to read document store at {}, starting from empty: {}",
                    self.path.display(),
                    err
                );
                Document::default()
            }
        }
    }

    /// Overwrites the backing store with the given document.
    ///
    /// # Errors
    /// Returns an error if encoding or the file write fails.
    pub async fn write(&self, doc: &Document) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.write_unlocked(doc).await
    }

    /// Begins a read-modify-write cycle. The returned transaction holds the
    /// writer lock until it is committed or dropped; dropping without commit
    /// discards the changes.
    pub async fn begin(&self) -> DocumentTxn<'_> {
        let guard = self.write_lock.lock().await;
        let doc = self.read().await;
        DocumentTxn {
            store: self,
            doc,
            _guard: guard,
        }
    }

    async fn write_unlocked(&self, doc: &Document) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(doc)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

/// An in-flight read-modify-write cycle over the document.
pub struct DocumentTxn<'a> {
    store: &'a JsonStore,
    /// The mutable snapshot; mutate freely, nothing is persisted until commit.
    pub doc: Document,
    _guard: MutexGuard<'a, ()>,
}

impl DocumentTxn<'_> {
    /// Persists the snapshot in a single write.
    ///
    /// # Errors
    /// Returns an error if encoding or the file write fails.
    pub async fn commit(self) -> Result<(), StoreError> {
        self.store.write_unlocked(&self.doc).await
    }
}
