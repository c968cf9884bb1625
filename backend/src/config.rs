use crate::application::dto::DatabaseQuery;
use crate::infrastructure::notion::{NotionClientConfig, DEFAULT_BASE_URL, DEFAULT_NOTION_VERSION};
use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub notion_api_key: String,
    pub notion_database_id: String,
    pub notion_api_base_url: String,
    pub notion_version: String,
    pub notion_signing_secret: Option<String>,
    pub status_property: String,
    pub published_status: String,
    pub sort_property: String,
    pub content_dir: PathBuf,
    pub sync_interval: Duration,
    pub cycle_timeout: Option<Duration>,
    pub staleness_window: Duration,
    pub http_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from any name-to-value lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());
        let secs = |name: &str, default: u64| -> Result<u64> {
            parse_or(lookup(name), default).with_context(|| format!("{} must be a whole number of seconds", name))
        };

        let cycle_timeout = secs("SYNC_CYCLE_TIMEOUT_SECS", 120)?;

        Ok(Self {
            notion_api_key: lookup("NOTION_API_KEY")
                .filter(|v| !v.is_empty())
                .context("NOTION_API_KEY must be set")?,
            notion_database_id: lookup("NOTION_DATABASE_ID")
                .filter(|v| !v.is_empty())
                .context("NOTION_DATABASE_ID must be set")?,
            notion_api_base_url: var("NOTION_API_BASE_URL", DEFAULT_BASE_URL),
            notion_version: var("NOTION_VERSION", DEFAULT_NOTION_VERSION),
            notion_signing_secret: lookup("NOTION_SIGNING_SECRET").filter(|v| !v.is_empty()),
            status_property: var("NOTION_STATUS_PROPERTY", "Status"),
            published_status: var("NOTION_PUBLISHED_STATUS", "Published"),
            sort_property: var("NOTION_SORT_PROPERTY", "PublishDate"),
            content_dir: PathBuf::from(var("CONTENT_DIR", "content/posts")),
            sync_interval: Duration::from_secs(secs("SYNC_INTERVAL_SECS", 30)?.max(1)),
            cycle_timeout: (cycle_timeout > 0).then(|| Duration::from_secs(cycle_timeout)),
            staleness_window: Duration::from_secs(secs("SYNC_STALENESS_WINDOW_SECS", 60)?),
            http_timeout: Duration::from_secs(secs("HTTP_TIMEOUT_SECS", 30)?),
        })
    }

    pub fn notion_client_config(&self) -> NotionClientConfig {
        NotionClientConfig {
            api_key: self.notion_api_key.clone(),
            database_id: self.notion_database_id.clone(),
            base_url: self.notion_api_base_url.clone(),
            notion_version: self.notion_version.clone(),
            timeout: self.http_timeout,
        }
    }

    /// Query for the published pages, newest first
    pub fn database_query(&self) -> DatabaseQuery {
        DatabaseQuery::published(
            &self.status_property,
            &self.published_status,
            &self.sort_property,
        )
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(raw) => Ok(raw.trim().parse()?),
        None => Ok(default),
    }
}
