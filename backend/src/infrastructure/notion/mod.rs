/// Notion API integration
mod client;

pub use client::{NotionClient, NotionClientConfig, DEFAULT_BASE_URL, DEFAULT_NOTION_VERSION};
