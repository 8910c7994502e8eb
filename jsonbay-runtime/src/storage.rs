//! Storage adapters - where the served JSON document lives

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors from reading or writing the served document
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to read {0}: {1}")]
    FileRead(PathBuf, std::io::Error),

    #[error("Failed to write {0}: {1}")]
    FileWrite(PathBuf, std::io::Error),

    #[error("Stored document is not valid JSON: {0}")]
    InvalidDocument(#[from] serde_json::Error),

    #[error("Object storage request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Object storage returned status {0} for {1}")]
    UnexpectedStatus(u16, String),
}

/// Abstraction over where the served JSON document is persisted
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Read the full document.
    async fn read(&self) -> Result<Value, StorageError>;

    /// Write the full document back.
    async fn write(&self, document: &Value) -> Result<(), StorageError>;

    /// Human-readable location, for logs and diagnostics.
    fn location(&self) -> String;
}

/// Document persisted on the local filesystem (local runs)
pub struct FileStorageAdapter {
    path: PathBuf,
}

impl FileStorageAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StorageAdapter for FileStorageAdapter {
    async fn read(&self) -> Result<Value, StorageError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| StorageError::FileRead(self.path.clone(), e))?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn write(&self, document: &Value) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::FileWrite(self.path.clone(), e))?;
        }
        let content = serde_json::to_string_pretty(document)?;
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| StorageError::FileWrite(self.path.clone(), e))?;
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Document persisted in an S3-compatible object store (deployed runs)
///
/// Addresses the object as `{endpoint}/{bucket}/{key}` over plain HTTP;
/// no vendor SDK, the store is an opaque collaborator.
pub struct ObjectStorageAdapter {
    client: reqwest::Client,
    url: String,
}

impl ObjectStorageAdapter {
    pub fn new(endpoint: &str, bucket: &str, key: &str) -> Self {
        let url = format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key);
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl StorageAdapter for ObjectStorageAdapter {
    async fn read(&self) -> Result<Value, StorageError> {
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(StorageError::UnexpectedStatus(
                response.status().as_u16(),
                self.url.clone(),
            ));
        }
        Ok(response.json().await?)
    }

    async fn write(&self, document: &Value) -> Result<(), StorageError> {
        let response = self
            .client
            .put(&self.url)
            .header("content-type", "application/json")
            .body(serde_json::to_vec(document)?)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(StorageError::UnexpectedStatus(
                response.status().as_u16(),
                self.url.clone(),
            ));
        }
        Ok(())
    }

    fn location(&self) -> String {
        self.url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn file_adapter_round_trips_document() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = FileStorageAdapter::new(dir.path().join("db.json"));

        let document = json!({"posts": [{"id": 1, "title": "hello"}]});
        adapter.write(&document).await.unwrap();
        let read_back = adapter.read().await.unwrap();
        assert_eq!(read_back, document);
    }

    #[tokio::test]
    async fn file_adapter_read_fails_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = FileStorageAdapter::new(dir.path().join("missing.json"));
        let err = adapter.read().await.unwrap_err();
        assert!(matches!(err, StorageError::FileRead(_, _)));
    }

    #[tokio::test]
    async fn file_adapter_read_fails_for_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        std::fs::write(&path, "{not json").unwrap();

        let adapter = FileStorageAdapter::new(&path);
        let err = adapter.read().await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidDocument(_)));
    }

    #[test]
    fn object_adapter_builds_bucket_key_url() {
        let adapter = ObjectStorageAdapter::new("https://s3.example.com/", "my-bucket", "db.json");
        assert_eq!(adapter.location(), "https://s3.example.com/my-bucket/db.json");
    }
}
