use crate::application::repositories::{DocumentError, DocumentRepository};
use crate::domain::aggregates::PersistedDocument;
use crate::domain::value_objects::{DocumentKey, Slug};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),
}

pub type QueryResult<T> = Result<T, QueryError>;

/// Published documents, newest `publishDate` first. Undated documents go last.
async fn newest_first<R: DocumentRepository>(repository: &R) -> QueryResult<Vec<PersistedDocument>> {
    let mut documents: Vec<PersistedDocument> = repository
        .find_all()
        .await?
        .into_iter()
        .map(|(_, document)| document)
        .collect();
    documents.sort_by(|a, b| b.publish_date.cmp(&a.publish_date));
    Ok(documents)
}

/// Use case for loading a single post by its slug
pub struct GetPostBySlug<'a, R: DocumentRepository> {
    repository: &'a R,
}

impl<'a, R: DocumentRepository> GetPostBySlug<'a, R> {
    pub fn new(repository: &'a R) -> Self {
        Self { repository }
    }

    pub async fn execute(&self, slug: &str) -> QueryResult<PersistedDocument> {
        let slug = Slug::parse(slug).ok_or_else(|| QueryError::NotFound(slug.to_string()))?;

        // Documents are normally stored under their slug
        if let Ok(key) = DocumentKey::new(slug.as_str()) {
            if let Some(document) = self.repository.find_by_key(&key).await? {
                if document.slug == slug.as_str() {
                    return Ok(document);
                }
            }
        }

        self.repository
            .find_all()
            .await?
            .into_iter()
            .map(|(_, document)| document)
            .find(|document| document.slug == slug.as_str())
            .ok_or_else(|| QueryError::NotFound(slug.to_string()))
    }
}

/// Use case for listing the posts tagged with a category
pub struct GetPostsByCategory<'a, R: DocumentRepository> {
    repository: &'a R,
}

impl<'a, R: DocumentRepository> GetPostsByCategory<'a, R> {
    pub fn new(repository: &'a R) -> Self {
        Self { repository }
    }

    pub async fn execute(&self, category: &str) -> QueryResult<Vec<PersistedDocument>> {
        let mut documents = newest_first(self.repository).await?;
        documents.retain(|document| document.has_category(category));
        Ok(documents)
    }
}

/// Use case for listing every category in use, in first-seen order over the newest posts
pub struct ListCategories<'a, R: DocumentRepository> {
    repository: &'a R,
}

impl<'a, R: DocumentRepository> ListCategories<'a, R> {
    pub fn new(repository: &'a R) -> Self {
        Self { repository }
    }

    pub async fn execute(&self) -> QueryResult<Vec<String>> {
        let mut categories: Vec<String> = Vec::new();
        for document in newest_first(self.repository).await? {
            for category in document.categories {
                if !categories.contains(&category) {
                    categories.push(category);
                }
            }
        }
        Ok(categories)
    }
}
