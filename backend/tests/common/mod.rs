//! Shared fixtures for the sync integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use portfolio_sync::application::dto::DatabaseQuery;
use portfolio_sync::application::repositories::{ContentSource, SourceError, SourceResult};
use portfolio_sync::application::services::SyncService;
use portfolio_sync::domain::aggregates::{PageMetadata, RemotePage};
use portfolio_sync::domain::base::Entity;
use portfolio_sync::domain::entities::{Block, BlockContent, RichText};
use portfolio_sync::domain::value_objects::{BlockId, ContentDirectoryPath, PageId, Slug};
use portfolio_sync::infrastructure::persistence::JsonDocumentRepository;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// In-memory content source whose listing and failures can be changed between cycles
#[derive(Default)]
pub struct InMemoryContentSource {
    pages: Mutex<Vec<RemotePage>>,
    blocks: Mutex<HashMap<PageId, Vec<Block>>>,
    failing_blocks: Mutex<HashSet<PageId>>,
    fail_listing: AtomicBool,
    listing_delay: Mutex<Option<Duration>>,
    listings: AtomicUsize,
}

impl InMemoryContentSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Add or replace a page with a single paragraph of `text`
    pub fn publish(&self, id: &str, slug: &str, edited_at: DateTime<Utc>, text: &str) {
        self.publish_blocks(
            id,
            slug,
            edited_at,
            vec![paragraph(&format!("{}-b1", id), text)],
        );
    }

    pub fn publish_blocks(&self, id: &str, slug: &str, edited_at: DateTime<Utc>, blocks: Vec<Block>) {
        let page_id = PageId::new(id).unwrap();
        let page = RemotePage::new(
            page_id.clone(),
            Slug::parse(slug),
            edited_at,
            PageMetadata {
                title: format!("Title {}", id),
                description: format!("About {}", id),
                categories: vec!["UX".to_string()],
                cover_image: String::new(),
                publish_date: "2024-03-01".to_string(),
            },
        );

        let mut pages = self.pages.lock().unwrap();
        match pages.iter_mut().find(|p| p.id() == &page_id) {
            Some(existing) => *existing = page,
            None => pages.push(page),
        }
        self.blocks.lock().unwrap().insert(page_id, blocks);
    }

    pub fn unpublish(&self, id: &str) {
        self.pages.lock().unwrap().retain(|p| p.id().as_str() != id);
    }

    pub fn fail_blocks_for(&self, id: &str) {
        self.failing_blocks
            .lock()
            .unwrap()
            .insert(PageId::new(id).unwrap());
    }

    pub fn set_listing_failure(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    pub fn set_listing_delay(&self, delay: Option<Duration>) {
        *self.listing_delay.lock().unwrap() = delay;
    }

    /// How many times the listing has been requested
    pub fn listings(&self) -> usize {
        self.listings.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentSource for InMemoryContentSource {
    async fn list_pages(&self, _query: &DatabaseQuery) -> SourceResult<Vec<RemotePage>> {
        self.listings.fetch_add(1, Ordering::SeqCst);

        let delay = *self.listing_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(SourceError::RemoteUnavailable {
                operation: "list pages",
                message: "connection refused".to_string(),
            });
        }
        Ok(self.pages.lock().unwrap().clone())
    }

    async fn fetch_blocks(&self, page_id: &PageId) -> SourceResult<Vec<Block>> {
        if self.failing_blocks.lock().unwrap().contains(page_id) {
            return Err(SourceError::RemoteUnavailable {
                operation: "fetch blocks",
                message: "rate limited".to_string(),
            });
        }
        Ok(self
            .blocks
            .lock()
            .unwrap()
            .get(page_id)
            .cloned()
            .unwrap_or_default())
    }
}

pub type TestSyncService = SyncService<Arc<InMemoryContentSource>, JsonDocumentRepository>;

pub fn posts_dir(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("content/posts")
}

pub fn sync_service(temp_dir: &TempDir, source: &Arc<InMemoryContentSource>) -> TestSyncService {
    let directory = ContentDirectoryPath::new(posts_dir(temp_dir)).unwrap();
    SyncService::new(
        Arc::clone(source),
        JsonDocumentRepository::new(directory),
        DatabaseQuery::published("Status", "Published", "PublishDate"),
    )
}

pub fn paragraph(id: &str, text: &str) -> Block {
    Block::new(
        BlockId::new(id).unwrap(),
        BlockContent::Paragraph(RichText::plain(text)),
    )
}

pub fn unsupported(id: &str, kind: &str) -> Block {
    Block::new(
        BlockId::new(id).unwrap(),
        BlockContent::Unsupported {
            kind: kind.to_string(),
        },
    )
}

/// Document file names present in the posts directory, sorted
pub fn document_files(temp_dir: &TempDir) -> Vec<String> {
    let mut names: Vec<String> = match std::fs::read_dir(posts_dir(temp_dir)) {
        Ok(entries) => entries
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}

pub fn read_document(temp_dir: &TempDir, key: &str) -> serde_json::Value {
    let json = std::fs::read_to_string(posts_dir(temp_dir).join(format!("{}.json", key))).unwrap();
    serde_json::from_str(&json).unwrap()
}
