pub mod dto;
pub mod repositories;
pub mod services;
pub mod use_cases;

pub use dto::{DatabaseFilter, DatabaseQuery, FilterCondition, SortDirection, SortSpec};
pub use repositories::{
    ContentSource, DocumentError, DocumentIndex, DocumentRepository, DocumentResult, SourceError,
    SourceResult,
};
pub use services::{
    CycleSummary, Poller, PollerHandle, SyncCallback, SyncError, SyncEvent, SyncResult,
    SyncService, WebhookError, WebhookEvent, WebhookRequest, WebhookService,
};
pub use use_cases::{GetPostBySlug, GetPostsByCategory, ListCategories, QueryError};
