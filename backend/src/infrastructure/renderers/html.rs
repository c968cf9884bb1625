/// HTML renderer - converts page blocks into an HTML fragment
use crate::domain::base::Entity;
use crate::domain::entities::{Block, BlockContent, ImageSource, RichText};

/// Language tag used for code blocks without one
pub const DEFAULT_CODE_LANGUAGE: &str = "plaintext";

/// Renders blocks one at a time, with no state carried between blocks.
///
/// Consecutive list items each get their own `<ul>`/`<ol>` container.
pub struct HtmlRenderer;

impl HtmlRenderer {
    /// Render a page's blocks in order. Unsupported blocks produce no output.
    pub fn render(blocks: &[Block]) -> String {
        let mut html = String::new();
        for block in blocks {
            match Self::render_block(block.content()) {
                Some(fragment) => html.push_str(&fragment),
                None => tracing::debug!(
                    "Skipping unsupported block {} of kind '{}'",
                    block.id(),
                    block.content().kind()
                ),
            }
        }
        html
    }

    /// Render a single block, or `None` for kinds the renderer does not know
    pub fn render_block(content: &BlockContent) -> Option<String> {
        let fragment = match content {
            BlockContent::Paragraph(text) => format!("<p>{}</p>", text_html(text)),
            BlockContent::Heading { level, text } => {
                let n = level.number();
                format!("<h{n}>{}</h{n}>", text_html(text))
            }
            BlockContent::BulletedListItem(text) => {
                format!("<ul><li>{}</li></ul>", text_html(text))
            }
            BlockContent::NumberedListItem(text) => {
                format!("<ol><li>{}</li></ol>", text_html(text))
            }
            BlockContent::Image { source, caption } => Self::render_image(source, caption),
            BlockContent::Code { text, language } => {
                let language = language
                    .as_deref()
                    .map(str::trim)
                    .filter(|lang| !lang.is_empty())
                    .unwrap_or(DEFAULT_CODE_LANGUAGE);
                format!(
                    "<pre><code class=\"language-{}\">{}</code></pre>",
                    escape_html(language),
                    text_html(text)
                )
            }
            BlockContent::Quote(text) => format!("<blockquote>{}</blockquote>", text_html(text)),
            BlockContent::Divider => "<hr>".to_string(),
            BlockContent::Unsupported { .. } => return None,
        };
        Some(fragment)
    }

    fn render_image(source: &ImageSource, caption: &RichText) -> String {
        let caption = text_html(caption);
        let figcaption = if caption.is_empty() {
            String::new()
        } else {
            format!("<figcaption>{}</figcaption>", caption)
        };
        format!(
            "<figure class=\"image-container\"><img src=\"{}\" alt=\"{}\" loading=\"lazy\">{}</figure>",
            escape_html(source.url()),
            caption,
            figcaption
        )
    }
}

fn text_html(text: &RichText) -> String {
    escape_html(&text.joined())
}

/// Escape text for use in HTML element content and quoted attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
