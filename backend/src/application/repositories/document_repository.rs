use crate::domain::{
    aggregates::PersistedDocument,
    value_objects::{DocumentKey, PageId},
};
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Document IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Document serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type DocumentResult<T> = Result<T, DocumentError>;

/// Which page ids have documents on disk, and under which keys.
/// A page normally has one key; several mean a stale copy survived a slug change.
pub type DocumentIndex = HashMap<PageId, Vec<DocumentKey>>;

/// Repository trait for persisted documents.
///
/// Documents are addressed by their key (the slug-derived file stem).
/// Implementations may be backed by a directory of JSON files or by memory.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Writes a document under `key`, replacing any existing one.
    ///
    /// The write must be atomic: readers see either the old or the new document.
    async fn save(&self, key: &DocumentKey, document: &PersistedDocument) -> DocumentResult<()>;

    /// Finds a document by key.
    ///
    /// Returns `Ok(None)` if there is no document under that key.
    async fn find_by_key(&self, key: &DocumentKey) -> DocumentResult<Option<PersistedDocument>>;

    /// Returns every readable document with its key.
    ///
    /// Unreadable documents are skipped with a warning rather than failing the call.
    async fn find_all(&self) -> DocumentResult<Vec<(DocumentKey, PersistedDocument)>>;

    /// Maps page ids to the keys of the documents that store them.
    async fn index(&self) -> DocumentResult<DocumentIndex>;

    /// Deletes the document under `key`.
    ///
    /// Returns `Ok(true)` if it was deleted, `Ok(false)` if there was none.
    async fn delete(&self, key: &DocumentKey) -> DocumentResult<bool>;
}
