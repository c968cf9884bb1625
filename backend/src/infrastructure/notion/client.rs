/// Notion REST client implementing the ContentSource port
use crate::application::dto::DatabaseQuery;
use crate::application::repositories::{ContentSource, SourceError, SourceResult};
use crate::domain::{aggregates::RemotePage, entities::Block, value_objects::PageId};
use crate::infrastructure::parsers::{BlockRecord, ListResponse, NotionRecordParser, PageRecord, ParseError};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.notion.com/v1";
pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";

/// Largest page size the API accepts
const PAGE_SIZE: u32 = 100;

/// Connection settings for the Notion API
#[derive(Debug, Clone)]
pub struct NotionClientConfig {
    pub api_key: String,
    pub database_id: String,
    pub base_url: String,
    pub notion_version: String,
    pub timeout: Duration,
}

impl NotionClientConfig {
    pub fn new(api_key: impl Into<String>, database_id: impl Into<String>) -> Self {
        NotionClientConfig {
            api_key: api_key.into(),
            database_id: database_id.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            notion_version: DEFAULT_NOTION_VERSION.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Client for one Notion database
pub struct NotionClient {
    client: reqwest::Client,
    base_url: String,
    database_id: String,
}

impl NotionClient {
    pub fn new(config: NotionClientConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .context("Notion API key is not a valid header value")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            "notion-version",
            HeaderValue::from_str(&config.notion_version)
                .context("Notion version is not a valid header value")?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(NotionClient {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            database_id: config.database_id,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Send a request and decode a successful JSON body
    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> SourceResult<T> {
        let unavailable = |message: String| SourceError::RemoteUnavailable { operation, message };

        let response = request.send().await.map_err(|e| unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(unavailable(format!("HTTP {}: {}", status, body)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        serde_json::from_slice(&body)
            .map_err(|e| SourceError::InvalidResponse(format!("{}: {}", operation, e)))
    }
}

impl From<ParseError> for SourceError {
    fn from(error: ParseError) -> Self {
        match error {
            ParseError::Domain(e) => SourceError::Domain(e),
            ParseError::Json(e) => SourceError::InvalidResponse(e.to_string()),
        }
    }
}

#[async_trait]
impl ContentSource for NotionClient {
    async fn list_pages(&self, query: &DatabaseQuery) -> SourceResult<Vec<RemotePage>> {
        let url = self.url(&format!("databases/{}/query", self.database_id));
        let mut pages = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let body = query.to_request_body(PAGE_SIZE, cursor.as_deref());
            let response: ListResponse<PageRecord> = self
                .send("query database", self.client.post(&url).json(&body))
                .await?;

            for record in response.results {
                pages.push(NotionRecordParser::parse_page(record)?);
            }

            match (response.has_more, response.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }

        debug!("Listed {} pages from database {}", pages.len(), self.database_id);
        Ok(pages)
    }

    async fn fetch_blocks(&self, page_id: &PageId) -> SourceResult<Vec<Block>> {
        let url = self.url(&format!("blocks/{}/children", page_id));
        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut params = vec![("page_size", PAGE_SIZE.to_string())];
            if let Some(cursor) = &cursor {
                params.push(("start_cursor", cursor.clone()));
            }

            let response: ListResponse<BlockRecord> = self
                .send("fetch blocks", self.client.get(&url).query(&params))
                .await?;

            for record in response.results {
                blocks.push(NotionRecordParser::parse_block(record)?);
            }

            match (response.has_more, response.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }

        debug!("Fetched {} blocks for page {}", blocks.len(), page_id);
        Ok(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining_trims_trailing_slash() {
        let mut config = NotionClientConfig::new("secret", "db-1");
        config.base_url = "http://localhost:3001/api/notion/".to_string();

        let client = NotionClient::new(config).unwrap();

        assert_eq!(
            client.url("databases/db-1/query"),
            "http://localhost:3001/api/notion/databases/db-1/query"
        );
    }

    #[test]
    fn test_invalid_api_key_is_rejected() {
        let config = NotionClientConfig::new("bad\nkey", "db-1");
        assert!(NotionClient::new(config).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_remote_unavailable() {
        let mut config = NotionClientConfig::new("secret", "db-1");
        // Port 9 (discard) on localhost is closed on test machines
        config.base_url = "http://127.0.0.1:9".to_string();
        config.timeout = Duration::from_secs(2);
        let client = NotionClient::new(config).unwrap();

        let error = client
            .list_pages(&DatabaseQuery::new())
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            SourceError::RemoteUnavailable { operation: "query database", .. }
        ));
    }

    #[test]
    fn test_parse_errors_map_to_source_errors() {
        let json_error = serde_json::from_str::<PageRecord>("{").unwrap_err();
        let error: SourceError = ParseError::Json(json_error).into();
        assert!(matches!(error, SourceError::InvalidResponse(_)));
    }
}
