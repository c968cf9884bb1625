/// Sync state and the differ that classifies a listing against it
use super::aggregates::RemotePage;
use super::base::Entity;
use super::value_objects::{DocumentKey, PageId};
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};

/// Why a page needs to be rendered again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Not seen by the previous cycle
    New,
    /// Edited after the previous cycle, or retried after a failure
    Updated,
}

#[derive(Debug, Clone)]
pub struct PageChange {
    pub page: RemotePage,
    pub kind: ChangeKind,
}

/// Output of the differ for one listing
#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    pub changed: Vec<PageChange>,
    pub unchanged: Vec<PageId>,
    pub removed: Vec<PageId>,
    pub current_ids: HashSet<PageId>,
}

impl SyncPlan {
    pub fn is_noop(&self) -> bool {
        self.changed.is_empty() && self.removed.is_empty()
    }

    /// Move unchanged pages into `changed` when no document of theirs is stored
    /// under the key assigned to them.
    pub fn require_documents(
        &mut self,
        listing: &[RemotePage],
        keys: &HashMap<PageId, DocumentKey>,
        owned: &HashMap<PageId, Vec<DocumentKey>>,
    ) {
        let unchanged = std::mem::take(&mut self.unchanged);
        for id in unchanged {
            let stored = match (keys.get(&id), owned.get(&id)) {
                (Some(key), Some(held)) => held.contains(key),
                _ => false,
            };
            match listing.iter().find(|page| page.id() == &id) {
                Some(page) if !stored => {
                    tracing::info!("Page {} has no document under its key; rewriting it", id);
                    self.changed.push(PageChange {
                        page: page.clone(),
                        kind: ChangeKind::Updated,
                    });
                }
                _ => self.unchanged.push(id),
            }
        }
    }
}

/// State carried between sync cycles. Replaced as a whole when a cycle completes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncState {
    last_sync_at: Option<DateTime<Utc>>,
    known_page_ids: HashSet<PageId>,
    retry_page_ids: HashSet<PageId>,
    pending_removals: HashSet<PageId>,
    seeded: bool,
}

impl SyncState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_sync_at(&self) -> Option<DateTime<Utc>> {
        self.last_sync_at
    }

    pub fn known_page_ids(&self) -> &HashSet<PageId> {
        &self.known_page_ids
    }

    pub fn retry_page_ids(&self) -> &HashSet<PageId> {
        &self.retry_page_ids
    }

    pub fn pending_removals(&self) -> &HashSet<PageId> {
        &self.pending_removals
    }

    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    /// Merge ids found on disk into the known set. Only the first call has an effect.
    pub fn seed_known_ids(&mut self, ids: impl IntoIterator<Item = PageId>) {
        if self.seeded {
            return;
        }
        self.known_page_ids.extend(ids);
        self.seeded = true;
    }

    /// Classify every listed page as changed or unchanged and compute removed ids.
    ///
    /// A page is changed when there has been no completed sync yet, when it is
    /// new to the known set, when its previous write failed, or when it was
    /// edited after `last_sync_at - staleness_window`.
    pub fn plan(&self, listing: &[RemotePage], staleness_window: Duration) -> SyncPlan {
        let mut plan = SyncPlan::default();
        let threshold = self.last_sync_at.map(|at| at - staleness_window);

        for page in listing {
            let id = page.id();
            if !plan.current_ids.insert(id.clone()) {
                tracing::warn!("Page {} listed more than once; keeping the first entry", id);
                continue;
            }

            let is_new = !self.known_page_ids.contains(id);
            let is_stale = match threshold {
                None => true,
                Some(threshold) => page.last_edited_at() > threshold,
            };
            let needs_retry = self.retry_page_ids.contains(id);

            if is_new {
                plan.changed.push(PageChange {
                    page: page.clone(),
                    kind: ChangeKind::New,
                });
            } else if is_stale || needs_retry {
                plan.changed.push(PageChange {
                    page: page.clone(),
                    kind: ChangeKind::Updated,
                });
            } else {
                plan.unchanged.push(id.clone());
            }
        }

        let mut removed: Vec<PageId> = self
            .known_page_ids
            .iter()
            .chain(self.pending_removals.iter())
            .filter(|id| !plan.current_ids.contains(*id))
            .cloned()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        removed.sort();
        plan.removed = removed;

        plan
    }

    /// State after a completed cycle
    pub fn after_cycle(
        synced_at: DateTime<Utc>,
        current_ids: HashSet<PageId>,
        failed_writes: HashSet<PageId>,
        failed_removals: HashSet<PageId>,
    ) -> SyncState {
        SyncState {
            last_sync_at: Some(synced_at),
            known_page_ids: current_ids,
            retry_page_ids: failed_writes,
            pending_removals: failed_removals,
            seeded: true,
        }
    }

    /// Record a page synced outside of a cycle
    pub fn mark_synced(&mut self, id: PageId) {
        self.retry_page_ids.remove(&id);
        self.pending_removals.remove(&id);
        self.known_page_ids.insert(id);
    }

    /// Record a page removed outside of a cycle
    pub fn mark_removed(&mut self, id: &PageId) {
        self.known_page_ids.remove(id);
        self.retry_page_ids.remove(id);
        self.pending_removals.remove(id);
    }
}

/// Give every listed page a distinct document key.
///
/// A page whose preferred key (slug, else id) already holds its document keeps
/// it. Other pages take their preferred key if it is free, else the key with
/// the id appended, else that key with a counter.
pub fn assign_document_keys(
    listing: &[RemotePage],
    owned: &HashMap<PageId, Vec<DocumentKey>>,
) -> HashMap<PageId, DocumentKey> {
    let mut keys: HashMap<PageId, DocumentKey> = HashMap::with_capacity(listing.len());
    let mut taken: HashSet<DocumentKey> = HashSet::with_capacity(listing.len());

    for page in listing {
        let preferred = page.document_key();
        let owns_preferred = owned
            .get(page.id())
            .is_some_and(|held| held.contains(&preferred));
        if owns_preferred && !keys.contains_key(page.id()) && taken.insert(preferred.clone()) {
            keys.insert(page.id().clone(), preferred);
        }
    }

    for page in listing {
        if keys.contains_key(page.id()) {
            continue;
        }

        let preferred = page.document_key();
        let key = if taken.contains(&preferred) {
            let disambiguated = preferred.disambiguated(page.id());
            let mut fallback = disambiguated.clone();
            let mut n = 2;
            while taken.contains(&fallback) {
                fallback = disambiguated.numbered(n);
                n += 1;
            }
            tracing::warn!(
                "Slug '{}' is used by more than one page; page {} is stored as '{}'",
                preferred,
                page.id(),
                fallback
            );
            fallback
        } else {
            preferred
        };

        taken.insert(key.clone());
        keys.insert(page.id().clone(), key);
    }

    keys
}
