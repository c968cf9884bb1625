pub mod content_source;
pub mod document_repository;

pub use content_source::{ContentSource, SourceError, SourceResult};
pub use document_repository::{DocumentError, DocumentIndex, DocumentRepository, DocumentResult};
