/// Notion record parser - converts raw API records into RemotePage and Block domain objects
use crate::domain::aggregates::{PageMetadata, RemotePage};
use crate::domain::entities::{Block, BlockContent, HeadingLevel, ImageSource, RichText};
use crate::domain::value_objects::{BlockId, PageId, Slug};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::base::DomainError),
}

pub type ParseResult<T> = Result<T, ParseError>;

/// One page of a paginated list response
#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageRecord {
    pub id: String,
    pub last_edited_time: DateTime<Utc>,
    #[serde(default)]
    pub properties: PageProperties,
}

/// The database properties the site reads. Anything else is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct PageProperties {
    #[serde(rename = "Title", default)]
    pub title: Option<TitleProperty>,
    #[serde(rename = "Slug", default)]
    pub slug: Option<RichTextProperty>,
    #[serde(rename = "Description", default)]
    pub description: Option<RichTextProperty>,
    #[serde(rename = "Category", default)]
    pub category: Option<MultiSelectProperty>,
    #[serde(rename = "Cover", default)]
    pub cover: Option<FilesProperty>,
    #[serde(rename = "PublishDate", default)]
    pub publish_date: Option<DateProperty>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TextRun {
    #[serde(default)]
    pub plain_text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct TitleProperty {
    #[serde(default)]
    pub title: Vec<TextRun>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RichTextProperty {
    #[serde(default)]
    pub rich_text: Vec<TextRun>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MultiSelectProperty {
    #[serde(default)]
    pub multi_select: Vec<SelectOption>,
}

#[derive(Debug, Deserialize)]
pub struct SelectOption {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct FilesProperty {
    #[serde(default)]
    pub files: Vec<FileObject>,
}

/// A file reference: uploaded (`file`) or linked (`external`)
#[derive(Debug, Default, Deserialize)]
pub struct FileObject {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub file: Option<UrlObject>,
    #[serde(default)]
    pub external: Option<UrlObject>,
}

impl FileObject {
    /// Resolve by the `type` tag, falling back to whichever field is present
    fn source(&self) -> Option<ImageSource> {
        let external = || self.external.as_ref().map(|u| ImageSource::External(u.url.clone()));
        let uploaded = || self.file.as_ref().map(|u| ImageSource::Uploaded(u.url.clone()));
        match self.kind.as_deref() {
            Some("external") => external(),
            Some("file") => uploaded(),
            _ => uploaded().or_else(external),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UrlObject {
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct DateProperty {
    #[serde(default)]
    pub date: Option<DateValue>,
}

#[derive(Debug, Deserialize)]
pub struct DateValue {
    pub start: String,
}

/// A block record: `type` names the key holding the payload
#[derive(Debug, Deserialize)]
pub struct BlockRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct TextPayload {
    #[serde(default)]
    rich_text: Vec<TextRun>,
}

#[derive(Debug, Deserialize)]
struct CodePayload {
    #[serde(default)]
    rich_text: Vec<TextRun>,
    #[serde(default)]
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImagePayload {
    #[serde(flatten)]
    file: FileObject,
    #[serde(default)]
    caption: Vec<TextRun>,
}

fn rich_text(runs: &[TextRun]) -> RichText {
    RichText::new(runs.iter().map(|run| run.plain_text.clone()).collect())
}

fn joined(runs: &[TextRun]) -> String {
    runs.iter().map(|run| run.plain_text.as_str()).collect()
}

/// Parser for Notion API records
pub struct NotionRecordParser;

impl NotionRecordParser {
    /// Normalize a page record. Missing properties resolve to empty values here, once.
    pub fn parse_page(record: PageRecord) -> ParseResult<RemotePage> {
        let id = PageId::new(record.id)?;
        let properties = record.properties;

        let slug = properties
            .slug
            .as_ref()
            .and_then(|p| Slug::parse(&joined(&p.rich_text)));

        let metadata = PageMetadata {
            title: properties
                .title
                .as_ref()
                .map(|p| joined(&p.title))
                .unwrap_or_default(),
            description: properties
                .description
                .as_ref()
                .map(|p| joined(&p.rich_text))
                .unwrap_or_default(),
            categories: properties
                .category
                .map(|p| p.multi_select.into_iter().map(|o| o.name).collect())
                .unwrap_or_default(),
            cover_image: properties
                .cover
                .as_ref()
                .and_then(|p| p.files.first())
                .and_then(FileObject::source)
                .map(|source| source.url().to_string())
                .unwrap_or_default(),
            publish_date: properties
                .publish_date
                .and_then(|p| p.date)
                .map(|d| d.start)
                .unwrap_or_default(),
        };

        Ok(RemotePage::new(id, slug, record.last_edited_time, metadata))
    }

    /// Parse a page record from raw JSON
    pub fn parse_page_json(value: Value) -> ParseResult<RemotePage> {
        let record: PageRecord = serde_json::from_value(value)?;
        Self::parse_page(record)
    }

    /// Convert a block record into a typed block.
    ///
    /// Unknown kinds, and known kinds whose payload does not decode, become
    /// `BlockContent::Unsupported` so one odd block never fails a page.
    pub fn parse_block(mut record: BlockRecord) -> ParseResult<Block> {
        let id = BlockId::new(record.id)?;
        let payload = record.payload.remove(&record.kind).unwrap_or(Value::Null);

        let content = match Self::parse_content(&record.kind, payload) {
            Ok(Some(content)) => content,
            Ok(None) => BlockContent::Unsupported { kind: record.kind },
            Err(e) => {
                tracing::warn!(
                    "Block {} of kind '{}' has an unexpected payload: {}",
                    id,
                    record.kind,
                    e
                );
                BlockContent::Unsupported { kind: record.kind }
            }
        };

        Ok(Block::new(id, content))
    }

    fn parse_content(kind: &str, payload: Value) -> ParseResult<Option<BlockContent>> {
        let content = match kind {
            "paragraph" => BlockContent::Paragraph(Self::text(payload)?),
            "heading_1" | "heading_2" | "heading_3" => {
                let level = kind[kind.len() - 1..]
                    .parse::<u8>()
                    .ok()
                    .and_then(HeadingLevel::from_number);
                match level {
                    Some(level) => BlockContent::Heading {
                        level,
                        text: Self::text(payload)?,
                    },
                    None => return Ok(None),
                }
            }
            "bulleted_list_item" => BlockContent::BulletedListItem(Self::text(payload)?),
            "numbered_list_item" => BlockContent::NumberedListItem(Self::text(payload)?),
            "quote" => BlockContent::Quote(Self::text(payload)?),
            "code" => {
                let code: CodePayload = Self::payload(payload)?;
                BlockContent::Code {
                    text: rich_text(&code.rich_text),
                    language: code.language,
                }
            }
            "image" => {
                let image: ImagePayload = Self::payload(payload)?;
                let Some(source) = image.file.source() else {
                    tracing::warn!("Image block without a URL");
                    return Ok(None);
                };
                BlockContent::Image {
                    source,
                    caption: rich_text(&image.caption),
                }
            }
            "divider" => BlockContent::Divider,
            _ => return Ok(None),
        };
        Ok(Some(content))
    }

    fn text(payload: Value) -> ParseResult<RichText> {
        let text: TextPayload = Self::payload(payload)?;
        Ok(rich_text(&text.rich_text))
    }

    fn payload<T: DeserializeOwned>(payload: Value) -> ParseResult<T> {
        Ok(serde_json::from_value(payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::base::Entity;
    use serde_json::json;

    fn block(value: Value) -> Block {
        let record: BlockRecord = serde_json::from_value(value).unwrap();
        NotionRecordParser::parse_block(record).unwrap()
    }

    #[test]
    fn test_parse_full_page() {
        let page = NotionRecordParser::parse_page_json(json!({
            "object": "page",
            "id": "p1",
            "last_edited_time": "2024-03-01T12:00:00.000Z",
            "properties": {
                "Title": { "type": "title", "title": [
                    { "plain_text": "Brand " }, { "plain_text": "Refresh" }
                ]},
                "Slug": { "type": "rich_text", "rich_text": [{ "plain_text": "brand-refresh" }] },
                "Description": { "type": "rich_text", "rich_text": [{ "plain_text": "A new identity" }] },
                "Category": { "type": "multi_select", "multi_select": [
                    { "id": "a", "name": "Branding" }, { "id": "b", "name": "Print" }
                ]},
                "Cover": { "type": "files", "files": [
                    { "name": "cover.png", "type": "file", "file": { "url": "https://files.example.com/cover.png", "expiry_time": "2024-03-01T13:00:00.000Z" } }
                ]},
                "PublishDate": { "type": "date", "date": { "start": "2024-02-28", "end": null } },
                "Status": { "type": "status", "status": { "name": "Published" } }
            }
        }))
        .unwrap();

        assert_eq!(page.id().as_str(), "p1");
        assert_eq!(page.slug().unwrap().as_str(), "brand-refresh");
        assert_eq!(page.metadata().title, "Brand Refresh");
        assert_eq!(page.metadata().description, "A new identity");
        assert_eq!(page.metadata().categories, vec!["Branding", "Print"]);
        assert_eq!(page.metadata().cover_image, "https://files.example.com/cover.png");
        assert_eq!(page.metadata().publish_date, "2024-02-28");
        assert_eq!(page.last_edited_at().to_rfc3339(), "2024-03-01T12:00:00+00:00");
        assert!(page.blocks().is_empty());
    }

    #[test]
    fn test_parse_page_with_missing_properties() {
        let page = NotionRecordParser::parse_page_json(json!({
            "id": "p2",
            "last_edited_time": "2024-03-01T12:00:00.000Z",
            "properties": {
                "Slug": { "rich_text": [] },
                "PublishDate": { "date": null }
            }
        }))
        .unwrap();

        assert!(page.slug().is_none());
        assert_eq!(page.document_key().as_str(), "p2");
        assert_eq!(page.metadata(), &PageMetadata::default());
    }

    #[test]
    fn test_parse_external_cover() {
        let page = NotionRecordParser::parse_page_json(json!({
            "id": "p3",
            "last_edited_time": "2024-03-01T12:00:00.000Z",
            "properties": {
                "Cover": { "files": [
                    { "type": "external", "external": { "url": "https://example.com/c.jpg" } }
                ]}
            }
        }))
        .unwrap();

        assert_eq!(page.metadata().cover_image, "https://example.com/c.jpg");
    }

    #[test]
    fn test_parse_text_blocks() {
        let paragraph = block(json!({
            "id": "b1",
            "type": "paragraph",
            "paragraph": { "rich_text": [{ "plain_text": "Hello " }, { "plain_text": "world" }], "color": "default" }
        }));
        assert_eq!(
            paragraph.content(),
            &BlockContent::Paragraph(RichText::new(vec!["Hello ".to_string(), "world".to_string()]))
        );

        let heading = block(json!({
            "id": "b2",
            "type": "heading_3",
            "heading_3": { "rich_text": [{ "plain_text": "Outcome" }], "is_toggleable": false }
        }));
        assert_eq!(
            heading.content(),
            &BlockContent::Heading { level: HeadingLevel::Three, text: "Outcome".into() }
        );

        let bullet = block(json!({
            "id": "b3",
            "type": "bulleted_list_item",
            "bulleted_list_item": { "rich_text": [{ "plain_text": "Research" }] }
        }));
        assert_eq!(bullet.content(), &BlockContent::BulletedListItem("Research".into()));
    }

    #[test]
    fn test_parse_code_block() {
        let code = block(json!({
            "id": "b4",
            "type": "code",
            "code": { "rich_text": [{ "plain_text": "let x = 1;" }], "language": "rust", "caption": [] }
        }));
        assert_eq!(
            code.content(),
            &BlockContent::Code { text: "let x = 1;".into(), language: Some("rust".to_string()) }
        );
    }

    #[test]
    fn test_parse_image_blocks() {
        let external = block(json!({
            "id": "b5",
            "type": "image",
            "image": {
                "type": "external",
                "external": { "url": "https://example.com/a.png" },
                "caption": [{ "plain_text": "Sketches" }]
            }
        }));
        assert_eq!(
            external.content(),
            &BlockContent::Image {
                source: ImageSource::External("https://example.com/a.png".to_string()),
                caption: "Sketches".into(),
            }
        );

        let uploaded = block(json!({
            "id": "b6",
            "type": "image",
            "image": { "type": "file", "file": { "url": "https://files.example.com/b.png" } }
        }));
        assert_eq!(
            uploaded.content(),
            &BlockContent::Image {
                source: ImageSource::Uploaded("https://files.example.com/b.png".to_string()),
                caption: RichText::default(),
            }
        );
    }

    #[test]
    fn test_unknown_and_malformed_blocks_degrade() {
        let embed = block(json!({
            "id": "b7",
            "type": "embed",
            "embed": { "url": "https://example.com/video" }
        }));
        assert_eq!(embed.content(), &BlockContent::Unsupported { kind: "embed".to_string() });

        let malformed = block(json!({
            "id": "b8",
            "type": "paragraph",
            "paragraph": { "rich_text": "not a list" }
        }));
        assert_eq!(malformed.content(), &BlockContent::Unsupported { kind: "paragraph".to_string() });

        let image_without_url = block(json!({
            "id": "b9",
            "type": "image",
            "image": { "type": "file", "caption": [] }
        }));
        assert!(!image_without_url.content().is_supported());

        let divider = block(json!({ "id": "b10", "type": "divider", "divider": {} }));
        assert_eq!(divider.content(), &BlockContent::Divider);
        assert_eq!(divider.id().as_str(), "b10");
    }

    #[test]
    fn test_list_response_pagination_fields() {
        let response: ListResponse<BlockRecord> = serde_json::from_value(json!({
            "object": "list",
            "results": [{ "id": "b1", "type": "divider", "divider": {} }],
            "has_more": true,
            "next_cursor": "b2"
        }))
        .unwrap();

        assert_eq!(response.results.len(), 1);
        assert!(response.has_more);
        assert_eq!(response.next_cursor.as_deref(), Some("b2"));
    }
}
