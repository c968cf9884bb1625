/// Value objects for the domain layer
use super::base::{DomainError, DomainResult, ValueObject};
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Characters that are not safe in a file name or URL path segment
static UNSAFE_KEY_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_-]+").expect("static regex is valid"));

/// Extension used by persisted documents
pub const DOCUMENT_EXTENSION: &str = "json";

/// Replace runs of unsafe characters with a single dash and trim dashes at the ends
fn sanitize_key(raw: &str) -> String {
    UNSAFE_KEY_CHARS
        .replace_all(raw.trim(), "-")
        .trim_matches('-')
        .to_string()
}

/// Unique identifier for a Page, assigned by the content source
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(String);

impl PageId {
    pub fn new(id: impl Into<String>) -> DomainResult<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::InvalidValue("PageId cannot be empty".to_string()));
        }
        Ok(PageId(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for PageId {}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a Block
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockId(String);

impl BlockId {
    pub fn new(id: impl Into<String>) -> DomainResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(DomainError::InvalidValue("BlockId cannot be empty".to_string()));
        }
        Ok(BlockId(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for BlockId {}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Human-readable, file-safe page identifier used for routing and file naming
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Slug(String);

impl Slug {
    /// Sanitize a raw slug. Returns `None` when nothing usable is left.
    pub fn parse(raw: &str) -> Option<Self> {
        let cleaned = sanitize_key(raw);
        if cleaned.is_empty() {
            None
        } else {
            Some(Slug(cleaned))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for Slug {}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// File stem of a persisted document: the slug, or the page id when the slug is empty
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentKey(String);

impl DocumentKey {
    pub fn new(key: impl Into<String>) -> DomainResult<Self> {
        let key = key.into();
        let cleaned = sanitize_key(&key);
        if cleaned.is_empty() || cleaned != key {
            return Err(DomainError::InvalidValue(format!(
                "Document key is not file-safe: {:?}",
                key
            )));
        }
        Ok(DocumentKey(key))
    }

    /// Key for a page, falling back to the sanitized id when there is no slug
    pub fn for_page(slug: Option<&Slug>, id: &PageId) -> Self {
        match slug {
            Some(slug) => DocumentKey(slug.as_str().to_string()),
            None => DocumentKey(Self::id_fragment(id)),
        }
    }

    /// Key disambiguated with the page id, used when two pages share a slug
    pub fn disambiguated(&self, id: &PageId) -> Self {
        DocumentKey(format!("{}-{}", self.0, Self::id_fragment(id)))
    }

    /// Key with a numeric suffix, for when even the disambiguated key is taken
    pub fn numbered(&self, n: usize) -> Self {
        DocumentKey(format!("{}-{}", self.0, n))
    }

    /// Parse a key back out of a document file name (`<key>.json`)
    pub fn from_file_name(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        if extension != DOCUMENT_EXTENSION {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        DocumentKey::new(stem).ok()
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.0, DOCUMENT_EXTENSION)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn id_fragment(id: &PageId) -> String {
        let cleaned = sanitize_key(id.as_str());
        if cleaned.is_empty() {
            // Ids made only of punctuation still need a stable, safe name
            format!("page-{}", id.as_str().len())
        } else {
            cleaned
        }
    }
}

impl ValueObject for DocumentKey {}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Output directory for persisted documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDirectoryPath {
    path: PathBuf,
}

impl ContentDirectoryPath {
    /// The directory does not need to exist yet; it is created on first write.
    /// An existing path must be a directory.
    pub fn new(path: impl Into<PathBuf>) -> DomainResult<Self> {
        let path = path.into();

        if path.as_os_str().is_empty() {
            return Err(DomainError::InvalidValue(
                "Content directory path cannot be empty".to_string(),
            ));
        }

        if path.exists() && !path.is_dir() {
            return Err(DomainError::InvalidValue(format!(
                "Path is not a directory: {}",
                path.display()
            )));
        }

        Ok(ContentDirectoryPath { path })
    }

    pub fn as_path(&self) -> &Path {
        &self.path
    }

    pub fn document_path(&self, key: &DocumentKey) -> PathBuf {
        self.path.join(key.file_name())
    }

    /// Hidden sibling used for atomic writes
    pub fn staging_path(&self, key: &DocumentKey) -> PathBuf {
        self.path.join(format!(".{}.tmp", key.file_name()))
    }
}

impl ValueObject for ContentDirectoryPath {}

impl fmt::Display for ContentDirectoryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_id_creation() {
        let id = PageId::new("1a2b3c").unwrap();
        assert_eq!(id.as_str(), "1a2b3c");

        assert!(PageId::new("").is_err());
        assert!(PageId::new("   ").is_err());
    }

    #[test]
    fn test_block_id_creation() {
        let id = BlockId::new("block-123").unwrap();
        assert_eq!(id.as_str(), "block-123");

        assert!(BlockId::new("").is_err());
    }

    #[test]
    fn test_slug_sanitization() {
        assert_eq!(Slug::parse("alpha").unwrap().as_str(), "alpha");
        assert_eq!(Slug::parse("  my post ").unwrap().as_str(), "my-post");
        assert_eq!(Slug::parse("../../etc/passwd").unwrap().as_str(), "etc-passwd");
        assert_eq!(Slug::parse("Case_Study-01").unwrap().as_str(), "Case_Study-01");
        assert!(Slug::parse("").is_none());
        assert!(Slug::parse(" / ").is_none());
    }

    #[test]
    fn test_document_key_falls_back_to_id() {
        let id = PageId::new("59833787-2cf9-4fdf-8782-e53db20768a5").unwrap();
        let slug = Slug::parse("beta");

        assert_eq!(DocumentKey::for_page(slug.as_ref(), &id).as_str(), "beta");
        assert_eq!(
            DocumentKey::for_page(None, &id).as_str(),
            "59833787-2cf9-4fdf-8782-e53db20768a5"
        );
    }

    #[test]
    fn test_document_key_disambiguation() {
        let id = PageId::new("p2").unwrap();
        let key = DocumentKey::new("alpha").unwrap();
        assert_eq!(key.disambiguated(&id).as_str(), "alpha-p2");
        assert_eq!(key.disambiguated(&id).numbered(2).as_str(), "alpha-p2-2");
    }

    #[test]
    fn test_document_key_file_names() {
        let key = DocumentKey::new("alpha").unwrap();
        assert_eq!(key.file_name(), "alpha.json");

        let parsed = DocumentKey::from_file_name(Path::new("/tmp/posts/alpha.json"));
        assert_eq!(parsed, Some(key));

        assert!(DocumentKey::from_file_name(Path::new("notes.txt")).is_none());
        assert!(DocumentKey::from_file_name(Path::new(".alpha.json.tmp")).is_none());
        assert!(DocumentKey::new("../alpha").is_err());
    }

    #[test]
    fn test_content_directory_path() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let missing = temp_dir.path().join("posts");

        let dir = ContentDirectoryPath::new(&missing).unwrap();
        let key = DocumentKey::new("alpha").unwrap();
        assert_eq!(dir.document_path(&key), missing.join("alpha.json"));
        assert_eq!(dir.staging_path(&key), missing.join(".alpha.json.tmp"));

        let file = temp_dir.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(ContentDirectoryPath::new(&file).is_err());
    }
}
