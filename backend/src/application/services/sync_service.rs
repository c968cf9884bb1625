/// Sync service that mirrors the published pages of the content source into documents
use crate::application::dto::DatabaseQuery;
use crate::application::repositories::{
    ContentSource, DocumentError, DocumentRepository, SourceError,
};
use crate::domain::aggregates::{PersistedDocument, RemotePage};
use crate::domain::base::{DomainError, Entity};
use crate::domain::sync_state::{assign_document_keys, ChangeKind, SyncState};
use crate::domain::value_objects::{DocumentKey, PageId};
use crate::infrastructure::renderers::HtmlRenderer;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Default tolerance for minute-granularity edit timestamps
pub const DEFAULT_STALENESS_WINDOW: Duration = Duration::from_secs(60);

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Content source error: {0}")]
    Source(#[from] SourceError),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Sync cycle did not finish within {0:?}")]
    Timeout(Duration),
}

pub type SyncResult<T> = Result<T, SyncError>;

/// Callback type for sync events
pub type SyncCallback = Arc<dyn Fn(SyncEvent) + Send + Sync>;

/// Sync event types
#[derive(Debug, Clone)]
pub enum SyncEvent {
    CycleStarted,
    DocumentWritten {
        page_id: PageId,
        key: DocumentKey,
        change: ChangeKind,
    },
    DocumentUnchanged {
        page_id: PageId,
        key: DocumentKey,
    },
    DocumentDeleted {
        page_id: PageId,
        key: DocumentKey,
    },
    DocumentFailed {
        page_id: PageId,
        error: String,
    },
    CycleCompleted(CycleSummary),
    CycleFailed {
        error: String,
    },
}

/// Counters for one completed cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub pages_listed: usize,
    pub documents_written: usize,
    pub documents_unchanged: usize,
    pub pages_skipped: usize,
    pub documents_deleted: usize,
    pub failures: usize,
    pub duration_ms: u64,
}

/// What happened to one changed page
struct PageOutcome {
    written: bool,
    stale_removed: usize,
}

fn emit(callback: Option<&SyncCallback>, event: SyncEvent) {
    if let Some(cb) = callback {
        cb(event);
    }
}

/// Service for syncing the content source into a document repository
pub struct SyncService<S: ContentSource, R: DocumentRepository> {
    source: S,
    repository: R,
    query: DatabaseQuery,
    staleness_window: chrono::Duration,
    state: SyncState,
}

impl<S: ContentSource, R: DocumentRepository> SyncService<S, R> {
    pub fn new(source: S, repository: R, query: DatabaseQuery) -> Self {
        SyncService {
            source,
            repository,
            query,
            staleness_window: chrono::Duration::seconds(DEFAULT_STALENESS_WINDOW.as_secs() as i64),
            state: SyncState::new(),
        }
    }

    pub fn with_staleness_window(mut self, window: Duration) -> Self {
        self.staleness_window = chrono::Duration::from_std(window).unwrap_or_else(|_| {
            tracing::warn!("Staleness window {:?} is out of range; using none", window);
            chrono::Duration::zero()
        });
        self
    }

    /// Resume from a previously captured state
    pub fn with_state(mut self, state: SyncState) -> Self {
        self.state = state;
        self
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Run one full sync cycle.
    ///
    /// Listing or indexing failures abort the cycle and leave the state untouched.
    /// Failures for a single page are reported and queued for the next cycle.
    pub async fn run_cycle(
        &mut self,
        callback: Option<&SyncCallback>,
    ) -> SyncResult<CycleSummary> {
        let started_at = Utc::now();
        let start_time = Instant::now();

        tracing::info!("Starting sync cycle");
        emit(callback, SyncEvent::CycleStarted);

        let listing = self.source.list_pages(&self.query).await?;
        let index = self.repository.index().await?;

        let mut state = self.state.clone();
        state.seed_known_ids(index.keys().cloned());
        let keys = assign_document_keys(&listing, &index);
        let mut plan = state.plan(&listing, self.staleness_window);
        plan.require_documents(&listing, &keys, &index);

        let mut summary = CycleSummary {
            pages_listed: plan.current_ids.len(),
            pages_skipped: plan.unchanged.len(),
            ..CycleSummary::default()
        };
        for id in &plan.unchanged {
            tracing::debug!("Page {} not edited since last sync", id);
        }

        let mut failed_writes = HashSet::new();
        for change in plan.changed {
            let page_id = change.page.id().clone();
            let label = change.page.label().to_string();
            let key = keys
                .get(&page_id)
                .cloned()
                .unwrap_or_else(|| change.page.document_key());
            let indexed_keys = index.get(&page_id).map(Vec::as_slice).unwrap_or(&[]);

            match self
                .write_page(change.page, &key, indexed_keys, callback)
                .await
            {
                Ok(outcome) => {
                    summary.documents_deleted += outcome.stale_removed;
                    if outcome.written {
                        tracing::info!("Wrote document {} for page {}", key, page_id);
                        summary.documents_written += 1;
                        emit(
                            callback,
                            SyncEvent::DocumentWritten {
                                page_id,
                                key,
                                change: change.kind,
                            },
                        );
                    } else {
                        tracing::debug!("Document {} is already up to date", key);
                        summary.documents_unchanged += 1;
                        emit(callback, SyncEvent::DocumentUnchanged { page_id, key });
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to sync page {} ({}): {}", page_id, label, e);
                    summary.failures += 1;
                    emit(
                        callback,
                        SyncEvent::DocumentFailed {
                            page_id: page_id.clone(),
                            error: e.to_string(),
                        },
                    );
                    failed_writes.insert(page_id);
                }
            }
        }

        let mut failed_removals = HashSet::new();
        for page_id in plan.removed {
            let indexed_keys = index.get(&page_id).map(Vec::as_slice).unwrap_or(&[]);
            match self.delete_documents(&page_id, indexed_keys, callback).await {
                Ok(deleted) => {
                    tracing::info!("Removed page {} ({} documents)", page_id, deleted);
                    summary.documents_deleted += deleted;
                }
                Err(e) => {
                    tracing::error!("Failed to remove page {}: {}", page_id, e);
                    summary.failures += 1;
                    emit(
                        callback,
                        SyncEvent::DocumentFailed {
                            page_id: page_id.clone(),
                            error: e.to_string(),
                        },
                    );
                    failed_removals.insert(page_id);
                }
            }
        }

        self.state =
            SyncState::after_cycle(started_at, plan.current_ids, failed_writes, failed_removals);

        summary.duration_ms = start_time.elapsed().as_millis() as u64;
        tracing::info!(
            "Sync cycle completed: {} listed, {} written, {} unchanged, {} skipped, {} deleted, {} failed in {}ms",
            summary.pages_listed,
            summary.documents_written,
            summary.documents_unchanged,
            summary.pages_skipped,
            summary.documents_deleted,
            summary.failures,
            summary.duration_ms
        );
        emit(callback, SyncEvent::CycleCompleted(summary.clone()));

        Ok(summary)
    }

    /// Re-render a single page outside of a cycle.
    ///
    /// The page is looked up in the filtered listing, so a page that is no
    /// longer published is removed instead. Returns the key it was stored
    /// under, or `None` when it was removed.
    pub async fn sync_page(&mut self, page_id: &PageId) -> SyncResult<Option<DocumentKey>> {
        let listing = self.source.list_pages(&self.query).await?;

        let Some(page) = listing.iter().find(|page| page.id() == page_id).cloned() else {
            tracing::info!("Page {} is not in the published listing; removing it", page_id);
            self.remove_page(page_id).await?;
            return Ok(None);
        };

        let index = self.repository.index().await?;
        let key = assign_document_keys(&listing, &index)
            .remove(page_id)
            .unwrap_or_else(|| page.document_key());
        let indexed_keys = index.get(page_id).map(Vec::as_slice).unwrap_or(&[]);

        let outcome = self.write_page(page, &key, indexed_keys, None).await?;
        if outcome.written {
            tracing::info!("Wrote document {} for page {}", key, page_id);
        }

        self.state.mark_synced(page_id.clone());
        Ok(Some(key))
    }

    /// Delete every document of a page outside of a cycle. Returns how many were deleted.
    pub async fn remove_page(&mut self, page_id: &PageId) -> SyncResult<usize> {
        let index = self.repository.index().await?;
        let indexed_keys = index.get(page_id).map(Vec::as_slice).unwrap_or(&[]);

        let deleted = self.delete_documents(page_id, indexed_keys, None).await?;
        self.state.mark_removed(page_id);

        tracing::info!("Removed page {} ({} documents)", page_id, deleted);
        Ok(deleted)
    }

    /// Fetch, render and store one page, then drop documents left under its old keys
    async fn write_page(
        &self,
        page: RemotePage,
        key: &DocumentKey,
        indexed_keys: &[DocumentKey],
        callback: Option<&SyncCallback>,
    ) -> SyncResult<PageOutcome> {
        let blocks = self.source.fetch_blocks(page.id()).await?;
        let page = page.with_blocks(blocks);
        let content = HtmlRenderer::render(page.blocks());
        let document = PersistedDocument::from_page(&page, content, Utc::now());

        let existing = match self.repository.find_by_key(key).await {
            Ok(existing) => existing,
            Err(e) => {
                tracing::warn!("Replacing unreadable document {}: {}", key, e);
                None
            }
        };

        let written = match existing {
            Some(existing) if existing.has_same_content(&document) => false,
            _ => {
                self.repository.save(key, &document).await?;
                true
            }
        };

        let mut stale_removed = 0;
        for stale in indexed_keys.iter().filter(|stale| *stale != key) {
            if self.delete_owned(page.id(), stale).await? {
                tracing::info!("Deleted stale document {} of page {}", stale, page.id());
                stale_removed += 1;
                emit(
                    callback,
                    SyncEvent::DocumentDeleted {
                        page_id: page.id().clone(),
                        key: stale.clone(),
                    },
                );
            }
        }

        Ok(PageOutcome {
            written,
            stale_removed,
        })
    }

    async fn delete_documents(
        &self,
        page_id: &PageId,
        keys: &[DocumentKey],
        callback: Option<&SyncCallback>,
    ) -> SyncResult<usize> {
        let mut deleted = 0;
        for key in keys {
            if self.delete_owned(page_id, key).await? {
                deleted += 1;
                emit(
                    callback,
                    SyncEvent::DocumentDeleted {
                        page_id: page_id.clone(),
                        key: key.clone(),
                    },
                );
            }
        }
        Ok(deleted)
    }

    /// Delete the document under `key` only if it still stores `page_id`.
    /// Another page may have taken the key over earlier in the same cycle.
    async fn delete_owned(&self, page_id: &PageId, key: &DocumentKey) -> SyncResult<bool> {
        match self.repository.find_by_key(key).await? {
            Some(document) if document.id == page_id.as_str() => {
                Ok(self.repository.delete(key).await?)
            }
            Some(document) => {
                tracing::debug!(
                    "Document {} now belongs to page {}; leaving it",
                    key,
                    document.id
                );
                Ok(false)
            }
            None => Ok(false),
        }
    }
}
