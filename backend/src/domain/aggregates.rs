/// Domain aggregates
use super::base::Entity;
use super::entities::Block;
use super::value_objects::{DocumentKey, PageId, Slug};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Descriptive fields of a page. Missing values resolve to empty strings/lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
    pub categories: Vec<String>,
    pub cover_image: String,
    pub publish_date: String,
}

impl PageMetadata {
    /// Drop blank and repeated categories, keeping first-seen order
    fn normalize_categories(&mut self) {
        let mut seen = Vec::with_capacity(self.categories.len());
        for category in self.categories.drain(..) {
            let category = category.trim().to_string();
            if !category.is_empty() && !seen.contains(&category) {
                seen.push(category);
            }
        }
        self.categories = seen;
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}

/// A RemotePage is one content item of the source database.
/// Its blocks are fetched separately from its metadata and attached later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePage {
    id: PageId,
    slug: Option<Slug>,
    last_edited_at: DateTime<Utc>,
    metadata: PageMetadata,
    blocks: Vec<Block>,
}

impl RemotePage {
    pub fn new(
        id: PageId,
        slug: Option<Slug>,
        last_edited_at: DateTime<Utc>,
        mut metadata: PageMetadata,
    ) -> Self {
        metadata.normalize_categories();
        RemotePage {
            id,
            slug,
            last_edited_at,
            metadata,
            blocks: Vec::new(),
        }
    }

    pub fn with_blocks(mut self, blocks: Vec<Block>) -> Self {
        self.blocks = blocks;
        self
    }

    pub fn slug(&self) -> Option<&Slug> {
        self.slug.as_ref()
    }

    pub fn last_edited_at(&self) -> DateTime<Utc> {
        self.last_edited_at
    }

    pub fn metadata(&self) -> &PageMetadata {
        &self.metadata
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Preferred document key: slug, else id
    pub fn document_key(&self) -> DocumentKey {
        DocumentKey::for_page(self.slug.as_ref(), &self.id)
    }

    /// Label for logs: the slug when present, otherwise the id
    pub fn label(&self) -> &str {
        self.slug
            .as_ref()
            .map(|slug| slug.as_str())
            .unwrap_or_else(|| self.id.as_str())
    }
}

impl Entity for RemotePage {
    type Id = PageId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// The on-disk projection of one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedDocument {
    pub id: String,
    pub slug: String,
    pub content: String,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub cover_image: String,
    #[serde(default)]
    pub publish_date: String,
    pub last_edited_time: DateTime<Utc>,
}

impl PersistedDocument {
    pub fn from_page(page: &RemotePage, content: String, written_at: DateTime<Utc>) -> Self {
        let metadata = page.metadata();
        PersistedDocument {
            id: page.id().as_str().to_string(),
            slug: page
                .slug()
                .map(|slug| slug.as_str().to_string())
                .unwrap_or_default(),
            content,
            last_updated: written_at,
            title: metadata.title.clone(),
            description: metadata.description.clone(),
            categories: metadata.categories.clone(),
            cover_image: metadata.cover_image.clone(),
            publish_date: metadata.publish_date.clone(),
            last_edited_time: page.last_edited_at(),
        }
    }

    pub fn page_id(&self) -> Option<PageId> {
        PageId::new(self.id.clone()).ok()
    }

    /// Equal in everything except the write timestamp
    pub fn has_same_content(&self, other: &PersistedDocument) -> bool {
        self.id == other.id
            && self.slug == other.slug
            && self.content == other.content
            && self.title == other.title
            && self.description == other.description
            && self.categories == other.categories
            && self.cover_image == other.cover_image
            && self.publish_date == other.publish_date
            && self.last_edited_time == other.last_edited_time
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_page() -> RemotePage {
        RemotePage::new(
            PageId::new("p1").unwrap(),
            Slug::parse("alpha"),
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            PageMetadata {
                title: "Alpha".to_string(),
                description: "First project".to_string(),
                categories: vec![
                    "Branding".to_string(),
                    " ".to_string(),
                    "UX".to_string(),
                    "Branding".to_string(),
                ],
                cover_image: "https://example.com/cover.png".to_string(),
                publish_date: "2024-02-28".to_string(),
            },
        )
    }

    #[test]
    fn test_categories_are_an_ordered_set() {
        let page = sample_page();
        assert_eq!(page.metadata().categories, vec!["Branding", "UX"]);
        assert!(page.metadata().has_category("UX"));
        assert!(!page.metadata().has_category("Motion"));
    }

    #[test]
    fn test_document_key_and_label() {
        let page = sample_page();
        assert_eq!(page.document_key().as_str(), "alpha");
        assert_eq!(page.label(), "alpha");

        let unnamed = RemotePage::new(
            PageId::new("p9").unwrap(),
            None,
            Utc::now(),
            PageMetadata::default(),
        );
        assert_eq!(unnamed.document_key().as_str(), "p9");
        assert_eq!(unnamed.label(), "p9");
    }

    #[test]
    fn test_persisted_document_json_shape() {
        let page = sample_page();
        let written_at = Utc.with_ymd_and_hms(2024, 3, 2, 8, 30, 0).unwrap();
        let document = PersistedDocument::from_page(&page, "<p>Hi</p>".to_string(), written_at);

        let json: serde_json::Value = serde_json::to_value(&document).unwrap();
        assert_eq!(json["id"], "p1");
        assert_eq!(json["slug"], "alpha");
        assert_eq!(json["content"], "<p>Hi</p>");
        assert_eq!(json["title"], "Alpha");
        assert_eq!(json["coverImage"], "https://example.com/cover.png");
        assert_eq!(json["publishDate"], "2024-02-28");
        assert_eq!(json["categories"], serde_json::json!(["Branding", "UX"]));
        assert_eq!(json["lastUpdated"], "2024-03-02T08:30:00Z");
        assert_eq!(json["lastEditedTime"], "2024-03-01T12:00:00Z");
    }

    #[test]
    fn test_same_content_ignores_write_time() {
        let page = sample_page();
        let first = PersistedDocument::from_page(&page, "<p>Hi</p>".to_string(), Utc::now());
        let mut second = first.clone();
        second.last_updated = first.last_updated + chrono::Duration::hours(1);
        assert!(first.has_same_content(&second));

        second.content = "<p>Changed</p>".to_string();
        assert!(!first.has_same_content(&second));
    }

    #[test]
    fn test_reads_documents_with_missing_metadata() {
        let json = r#"{
            "id": "p1",
            "slug": "alpha",
            "content": "",
            "lastUpdated": "2024-03-02T08:30:00.000Z",
            "lastEditedTime": "2024-03-01T12:00:00.000Z"
        }"#;
        let document: PersistedDocument = serde_json::from_str(json).unwrap();
        assert_eq!(document.page_id(), Some(PageId::new("p1").unwrap()));
        assert!(document.categories.is_empty());
        assert_eq!(document.title, "");
    }
}
