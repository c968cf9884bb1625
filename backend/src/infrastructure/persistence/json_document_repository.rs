use crate::application::repositories::{
    DocumentError, DocumentIndex, DocumentRepository, DocumentResult,
};
use crate::domain::aggregates::PersistedDocument;
use crate::domain::value_objects::{ContentDirectoryPath, DocumentKey};
use crate::infrastructure::file_system::discover_document_files;
use async_trait::async_trait;
use std::io::ErrorKind;
use tokio::fs;

/// Directory-of-JSON-files implementation of the DocumentRepository trait
pub struct JsonDocumentRepository {
    directory: ContentDirectoryPath,
}

impl JsonDocumentRepository {
    pub fn new(directory: ContentDirectoryPath) -> Self {
        JsonDocumentRepository { directory }
    }

    pub fn directory(&self) -> &ContentDirectoryPath {
        &self.directory
    }
}

#[async_trait]
impl DocumentRepository for JsonDocumentRepository {
    async fn save(&self, key: &DocumentKey, document: &PersistedDocument) -> DocumentResult<()> {
        fs::create_dir_all(self.directory.as_path()).await?;

        let json = serde_json::to_string_pretty(document)?;
        let staging = self.directory.staging_path(key);
        let target = self.directory.document_path(key);

        fs::write(&staging, json.as_bytes()).await?;
        if let Err(e) = fs::rename(&staging, &target).await {
            if let Err(cleanup) = fs::remove_file(&staging).await {
                tracing::warn!(
                    "Failed to remove staging file {}: {}",
                    staging.display(),
                    cleanup
                );
            }
            return Err(DocumentError::Io(e));
        }

        Ok(())
    }

    async fn find_by_key(&self, key: &DocumentKey) -> DocumentResult<Option<PersistedDocument>> {
        let path = self.directory.document_path(key);
        let json = match fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    async fn find_all(&self) -> DocumentResult<Vec<(DocumentKey, PersistedDocument)>> {
        let files = discover_document_files(self.directory.as_path()).await?;
        let mut documents = Vec::with_capacity(files.len());

        for path in files {
            let Some(key) = DocumentKey::from_file_name(&path) else {
                tracing::warn!("Ignoring document with unusable name: {}", path.display());
                continue;
            };

            match self.find_by_key(&key).await {
                Ok(Some(document)) => documents.push((key, document)),
                Ok(None) => {}
                Err(e) => tracing::warn!("Skipping unreadable document {}: {}", path.display(), e),
            }
        }

        Ok(documents)
    }

    async fn index(&self) -> DocumentResult<DocumentIndex> {
        let mut index = DocumentIndex::new();

        for (key, document) in self.find_all().await? {
            match document.page_id() {
                Some(id) => index.entry(id).or_default().push(key),
                None => tracing::warn!("Document {} has no page id", key),
            }
        }

        Ok(index)
    }

    async fn delete(&self, key: &DocumentKey) -> DocumentResult<bool> {
        match fs::remove_file(self.directory.document_path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
