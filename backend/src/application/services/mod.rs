pub mod poller;
pub mod sync_service;
pub mod webhook_service;

pub use poller::{Poller, PollerHandle, DEFAULT_CYCLE_TIMEOUT, DEFAULT_POLL_INTERVAL};
pub use sync_service::{
    CycleSummary, SyncCallback, SyncError, SyncEvent, SyncResult, SyncService,
    DEFAULT_STALENESS_WINDOW,
};
pub use webhook_service::{
    WebhookError, WebhookEvent, WebhookRequest, WebhookResult, WebhookService, SIGNATURE_HEADER,
    TIMESTAMP_HEADER,
};
