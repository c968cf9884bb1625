use crate::application::dto::DatabaseQuery;
use crate::domain::{aggregates::RemotePage, entities::Block, value_objects::PageId, DomainError};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Content source unavailable during {operation}: {message}")]
    RemoteUnavailable {
        operation: &'static str,
        message: String,
    },

    #[error("Unexpected response from content source: {0}")]
    InvalidResponse(String),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Read-only access to the remote content database.
///
/// Implementations re-fetch on every call; nothing is cached at this layer.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Lists the pages matching `query`, in the order the source returns them.
    /// Returned pages carry metadata only; their blocks are empty.
    async fn list_pages(&self, query: &DatabaseQuery) -> SourceResult<Vec<RemotePage>>;

    /// Fetches the ordered top-level blocks of one page.
    async fn fetch_blocks(&self, page_id: &PageId) -> SourceResult<Vec<Block>>;
}

#[async_trait]
impl<T: ContentSource + ?Sized> ContentSource for Arc<T> {
    async fn list_pages(&self, query: &DatabaseQuery) -> SourceResult<Vec<RemotePage>> {
        (**self).list_pages(query).await
    }

    async fn fetch_blocks(&self, page_id: &PageId) -> SourceResult<Vec<Block>> {
        (**self).fetch_blocks(page_id).await
    }
}
