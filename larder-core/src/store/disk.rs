//! File-backed store: one pretty-printed JSON file per document.
//!
//! Layout is `<root>/<collection>/<id>.json`. Writes go to a temp file first
//! and are renamed into place.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;

use super::{validate_id, Collection, Document, DocumentStore, FieldFilter, StoreError};

#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_dir(&self, collection: Collection) -> PathBuf {
        self.root.join(collection.as_str())
    }

    fn document_path(&self, collection: Collection, id: &str) -> PathBuf {
        self.collection_dir(collection).join(format!("{}.json", id))
    }

    async fn read_document(
        &self,
        collection: Collection,
        id: &str,
        path: &Path,
    ) -> Result<Option<Value>, StoreError> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(path, e)),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| StoreError::Malformed {
                collection,
                id: id.to_string(),
                message: e.to_string(),
            })
    }
}

fn io_error(path: &Path, e: std::io::Error) -> StoreError {
    StoreError::Io(format!("{}: {}", path.display(), e))
}

#[async_trait]
impl DocumentStore for DiskStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError> {
        validate_id(id)?;
        let path = self.document_path(collection, id);
        self.read_document(collection, id, &path).await
    }

    async fn list(
        &self,
        collection: Collection,
        filter: Option<&FieldFilter>,
    ) -> Result<Vec<Document>, StoreError> {
        let dir = self.collection_dir(collection);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&dir, e)),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(&dir, e))? {
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    if validate_id(stem).is_ok() {
                        ids.push(stem.to_string());
                    }
                }
            }
        }
        ids.sort();

        let mut documents = Vec::with_capacity(ids.len());
        for id in ids {
            let path = self.document_path(collection, &id);
            // Deleted between read_dir and now.
            let Some(body) = self.read_document(collection, &id, &path).await? else {
                continue;
            };
            if filter.is_none_or(|f| f.matches(&body)) {
                documents.push(Document { id, body });
            }
        }
        Ok(documents)
    }

    async fn put(&self, collection: Collection, id: &str, body: Value) -> Result<(), StoreError> {
        validate_id(id)?;
        let dir = self.collection_dir(collection);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| io_error(&dir, e))?;

        let content = serde_json::to_string_pretty(&body).map_err(|e| StoreError::Malformed {
            collection,
            id: id.to_string(),
            message: e.to_string(),
        })?;

        let path = self.document_path(collection, id);
        let tmp = dir.join(format!(".{}.json.tmp", id));
        fs::write(&tmp, content)
            .await
            .map_err(|e| io_error(&tmp, e))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| io_error(&path, e))?;

        tracing::debug!(collection = %collection, id = id, "wrote document");
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        validate_id(id)?;
        let path = self.document_path(collection, id);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(&path, e)),
        }
    }
}
