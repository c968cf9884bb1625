/// Fixed-interval driver for the sync service
use super::sync_service::{CycleSummary, SyncCallback, SyncError, SyncEvent, SyncResult, SyncService};
use crate::application::repositories::{ContentSource, DocumentRepository};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{interval, timeout, MissedTickBehavior};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_CYCLE_TIMEOUT: Duration = Duration::from_secs(120);

/// Runs sync cycles on a fixed interval. Owns the sync service, and with it the sync state.
pub struct Poller<S: ContentSource, R: DocumentRepository> {
    service: SyncService<S, R>,
    interval: Duration,
    cycle_timeout: Option<Duration>,
    callback: Option<SyncCallback>,
}

impl<S, R> Poller<S, R>
where
    S: ContentSource + 'static,
    R: DocumentRepository + 'static,
{
    pub fn new(service: SyncService<S, R>, interval: Duration) -> Self {
        Poller {
            service,
            interval,
            cycle_timeout: Some(DEFAULT_CYCLE_TIMEOUT),
            callback: None,
        }
    }

    /// Deadline for a single cycle; `None` lets cycles run as long as they need
    pub fn with_cycle_timeout(mut self, cycle_timeout: Option<Duration>) -> Self {
        self.cycle_timeout = cycle_timeout;
        self
    }

    pub fn with_callback(mut self, callback: SyncCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn service(&self) -> &SyncService<S, R> {
        &self.service
    }

    /// Run exactly one cycle, bounded by the cycle timeout.
    ///
    /// A timed-out cycle is dropped before it swaps in new state.
    pub async fn run_once(&mut self) -> SyncResult<CycleSummary> {
        let cycle = self.service.run_cycle(self.callback.as_ref());

        let result = match self.cycle_timeout {
            Some(limit) => match timeout(limit, cycle).await {
                Ok(result) => result,
                Err(_) => Err(SyncError::Timeout(limit)),
            },
            None => cycle.await,
        };

        if let Err(ref e) = result {
            tracing::error!("Sync cycle failed: {}", e);
            if let Some(ref cb) = self.callback {
                cb(SyncEvent::CycleFailed {
                    error: e.to_string(),
                });
            }
        }

        result
    }

    /// Run one cycle now, then keep polling in a background task until stopped.
    ///
    /// Cycles never overlap; a cycle that overruns the interval delays the next tick.
    pub async fn start(mut self) -> PollerHandle<S, R> {
        tracing::info!("Starting poller with a {:?} interval", self.interval);
        let _ = self.run_once().await;

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let _ = self.run_once().await;
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }

            tracing::info!("Poller stopped");
            self.service
        });

        PollerHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Owned cancellation handle for a running poller
pub struct PollerHandle<S: ContentSource, R: DocumentRepository> {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<SyncService<S, R>>,
}

impl<S: ContentSource, R: DocumentRepository> PollerHandle<S, R> {
    /// Stop polling and hand back the sync service.
    /// A cycle in progress is allowed to finish first.
    pub async fn stop(self) -> Result<SyncService<S, R>, JoinError> {
        self.shutdown.send(true).ok();
        self.task.await
    }
}
