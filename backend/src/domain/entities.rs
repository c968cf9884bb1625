/// Domain entities
use super::base::{Entity, ValueObject};
use super::value_objects::BlockId;

/// Inline text of a block: the plain-text runs in source order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RichText {
    runs: Vec<String>,
}

impl RichText {
    pub fn new(runs: Vec<String>) -> Self {
        RichText { runs }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        RichText {
            runs: vec![text.into()],
        }
    }

    pub fn runs(&self) -> &[String] {
        &self.runs
    }

    /// Concatenation of all runs
    pub fn joined(&self) -> String {
        self.runs.concat()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|run| run.is_empty())
    }
}

impl ValueObject for RichText {}

impl From<&str> for RichText {
    fn from(text: &str) -> Self {
        RichText::plain(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    One,
    Two,
    Three,
}

impl HeadingLevel {
    pub fn from_number(level: u8) -> Option<Self> {
        match level {
            1 => Some(HeadingLevel::One),
            2 => Some(HeadingLevel::Two),
            3 => Some(HeadingLevel::Three),
            _ => None,
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            HeadingLevel::One => 1,
            HeadingLevel::Two => 2,
            HeadingLevel::Three => 3,
        }
    }
}

/// Where an image block's file lives. The two are mutually exclusive per block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    External(String),
    Uploaded(String),
}

impl ImageSource {
    pub fn url(&self) -> &str {
        match self {
            ImageSource::External(url) | ImageSource::Uploaded(url) => url,
        }
    }
}

/// Typed content of a block. `Unsupported` keeps the source kind for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockContent {
    Paragraph(RichText),
    Heading { level: HeadingLevel, text: RichText },
    BulletedListItem(RichText),
    NumberedListItem(RichText),
    Image { source: ImageSource, caption: RichText },
    Code { text: RichText, language: Option<String> },
    Quote(RichText),
    Divider,
    Unsupported { kind: String },
}

impl BlockContent {
    /// Source kind name, as the content source spells it
    pub fn kind(&self) -> &str {
        match self {
            BlockContent::Paragraph(_) => "paragraph",
            BlockContent::Heading { level, .. } => match level {
                HeadingLevel::One => "heading_1",
                HeadingLevel::Two => "heading_2",
                HeadingLevel::Three => "heading_3",
            },
            BlockContent::BulletedListItem(_) => "bulleted_list_item",
            BlockContent::NumberedListItem(_) => "numbered_list_item",
            BlockContent::Image { .. } => "image",
            BlockContent::Code { .. } => "code",
            BlockContent::Quote(_) => "quote",
            BlockContent::Divider => "divider",
            BlockContent::Unsupported { kind } => kind,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, BlockContent::Unsupported { .. })
    }
}

/// A Block is one unit of rich content within a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    id: BlockId,
    content: BlockContent,
}

impl Block {
    pub fn new(id: BlockId, content: BlockContent) -> Self {
        Block { id, content }
    }

    pub fn content(&self) -> &BlockContent {
        &self.content
    }
}

impl Entity for Block {
    type Id = BlockId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
