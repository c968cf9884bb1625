mod html;

pub use html::{escape_html, HtmlRenderer, DEFAULT_CODE_LANGUAGE};
