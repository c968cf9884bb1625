/// File discovery utilities for finding persisted documents
use crate::domain::value_objects::DOCUMENT_EXTENSION;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Discover all document files directly inside `dir`.
///
/// Hidden files (including in-flight `.tmp` writes) and subdirectories are skipped.
/// A missing directory has no documents.
pub async fn discover_document_files(dir: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();

        if !entry.file_type().await?.is_file() {
            continue;
        }

        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if file_name.starts_with('.') {
            continue;
        }

        if path.extension().and_then(|ext| ext.to_str()) == Some(DOCUMENT_EXTENSION) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}
