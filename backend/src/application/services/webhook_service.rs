/// Webhook receiver that turns signed change notifications into targeted syncs
use super::sync_service::{SyncError, SyncService};
use crate::application::repositories::{ContentSource, DocumentRepository};
use crate::domain::value_objects::PageId;
use crate::infrastructure::webhooks;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

pub const SIGNATURE_HEADER: &str = "x-notion-signature";
pub const TIMESTAMP_HEADER: &str = "x-notion-timestamp";

#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("Webhook signing secret is not configured")]
    MissingSecret,

    #[error("Invalid request signature")]
    InvalidSignature,

    #[error("Malformed webhook payload: {0}")]
    MalformedPayload(String),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),
}

pub type WebhookResult<T> = Result<T, WebhookError>;

/// A change notification from the content source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    PageCreated(PageId),
    PageUpdated(PageId),
    PageDeleted(PageId),
    /// Any other notification type, by name
    Unhandled(String),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
}

impl WebhookEvent {
    /// Parse a `{ "type": ..., "payload": { "page": { "id": ... } } }` body
    pub fn parse(body: &[u8]) -> WebhookResult<Self> {
        let envelope: Envelope = serde_json::from_slice(body)
            .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;

        let page_id = || -> WebhookResult<PageId> {
            let id = envelope
                .payload
                .pointer("/page/id")
                .and_then(Value::as_str)
                .ok_or_else(|| WebhookError::MalformedPayload("missing payload.page.id".to_string()))?;
            PageId::new(id).map_err(|e| WebhookError::MalformedPayload(e.to_string()))
        };

        Ok(match envelope.kind.as_str() {
            "page.create" => WebhookEvent::PageCreated(page_id()?),
            "page.update" => WebhookEvent::PageUpdated(page_id()?),
            "page.delete" => WebhookEvent::PageDeleted(page_id()?),
            other => WebhookEvent::Unhandled(other.to_string()),
        })
    }
}

/// The parts of an incoming webhook request needed to authenticate it
#[derive(Debug, Clone, Copy)]
pub struct WebhookRequest<'a> {
    pub timestamp: Option<&'a str>,
    pub signature: Option<&'a str>,
    pub body: &'a [u8],
}

/// Authenticates webhook requests and applies them to a sync service
pub struct WebhookService {
    signing_secret: Option<String>,
}

impl WebhookService {
    pub fn new(signing_secret: Option<String>) -> Self {
        WebhookService {
            signing_secret: signing_secret.filter(|secret| !secret.is_empty()),
        }
    }

    /// Check the request signature. Requests are refused while no secret is configured.
    pub fn verify(&self, request: &WebhookRequest<'_>) -> WebhookResult<()> {
        let secret = self
            .signing_secret
            .as_deref()
            .ok_or(WebhookError::MissingSecret)?;

        match (request.timestamp, request.signature) {
            (Some(timestamp), Some(signature))
                if webhooks::verify(secret, timestamp, request.body, signature) =>
            {
                Ok(())
            }
            _ => Err(WebhookError::InvalidSignature),
        }
    }

    /// Verify and parse a request
    pub fn receive(&self, request: &WebhookRequest<'_>) -> WebhookResult<WebhookEvent> {
        if let Err(e) = self.verify(request) {
            tracing::error!("Rejected webhook request: {}", e);
            return Err(e);
        }
        WebhookEvent::parse(request.body)
    }

    /// Bring the documents of the page named by `event` up to date
    pub async fn apply<S, R>(
        &self,
        event: &WebhookEvent,
        service: &mut SyncService<S, R>,
    ) -> WebhookResult<()>
    where
        S: ContentSource,
        R: DocumentRepository,
    {
        match event {
            WebhookEvent::PageCreated(page_id) | WebhookEvent::PageUpdated(page_id) => {
                tracing::info!("Webhook: page {} changed", page_id);
                service.sync_page(page_id).await?;
            }
            WebhookEvent::PageDeleted(page_id) => {
                tracing::info!("Webhook: page {} deleted", page_id);
                service.remove_page(page_id).await?;
            }
            WebhookEvent::Unhandled(kind) => {
                tracing::info!("Unhandled webhook type: {}", kind);
            }
        }
        Ok(())
    }

    /// Verify, parse and apply a request in one step
    pub async fn handle<S, R>(
        &self,
        request: &WebhookRequest<'_>,
        service: &mut SyncService<S, R>,
    ) -> WebhookResult<WebhookEvent>
    where
        S: ContentSource,
        R: DocumentRepository,
    {
        let event = self.receive(request)?;
        self.apply(&event, service).await?;
        Ok(event)
    }
}
