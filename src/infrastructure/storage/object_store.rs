//! ObjectStore implementations

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::domain::provider::{ObjectStore, StoredObject};
use crate::domain::DomainError;

/// Rejects empty, absolute and parent-relative object paths
pub fn validate_object_path(path: &str) -> Result<(), DomainError> {
    if path.is_empty() {
        return Err(DomainError::validation("object path is empty"));
    }

    let safe = Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_)));

    if !safe {
        return Err(DomainError::validation(format!("invalid object path: {}", path)));
    }

    Ok(())
}

fn content_type_for(path: &str) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Objects stored as files under a root directory
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, DomainError> {
        validate_object_path(path)?;
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put_object(
        &self,
        path: &str,
        bytes: Bytes,
        _content_type: &str,
    ) -> Result<(), DomainError> {
        let target = self.resolve(path)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::storage(format!("Failed to create directory: {}", e)))?;
        }

        // Readers never observe a partial file
        let staging = target.with_extension(format!("tmp-{}", uuid::Uuid::new_v4()));
        tokio::fs::write(&staging, &bytes)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to write object: {}", e)))?;
        tokio::fs::rename(&staging, &target)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to move object into place: {}", e)))?;

        debug!(path = %path, size = bytes.len(), "Object stored");
        Ok(())
    }

    async fn get_object(&self, path: &str) -> Result<Option<StoredObject>, DomainError> {
        let target = self.resolve(path)?;

        match tokio::fs::read(&target).await {
            Ok(data) => Ok(Some(StoredObject {
                bytes: Bytes::from(data),
                content_type: content_type_for(path),
            })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DomainError::storage(format!("Failed to read object: {}", e))),
        }
    }
}

/// Process-local object store
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<String, StoredObject>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put_object(
        &self,
        path: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), DomainError> {
        validate_object_path(path)?;

        self.objects
            .write()
            .map_err(|_| DomainError::internal("Object store lock poisoned"))?
            .insert(
                path.to_string(),
                StoredObject {
                    bytes,
                    content_type: content_type.to_string(),
                },
            );

        Ok(())
    }

    async fn get_object(&self, path: &str) -> Result<Option<StoredObject>, DomainError> {
        validate_object_path(path)?;

        let objects = self
            .objects
            .read()
            .map_err(|_| DomainError::internal("Object store lock poisoned"))?;

        Ok(objects.get(path).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_validation() {
        assert!(validate_object_path("speech/abc.mp3").is_ok());
        assert!(validate_object_path("").is_err());
        assert!(validate_object_path("../etc/passwd").is_err());
        assert!(validate_object_path("speech/../../x").is_err());
        assert!(validate_object_path("/abs/path").is_err());
    }

    #[tokio::test]
    async fn test_local_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());

        store
            .put_object("speech/abc.mp3", Bytes::from_static(b"ID3"), "audio/mpeg")
            .await
            .unwrap();

        let object = store.get_object("speech/abc.mp3").await.unwrap().unwrap();
        assert_eq!(&object.bytes[..], b"ID3");
        assert_eq!(object.content_type, "audio/mpeg");
        assert!(dir.path().join("speech/abc.mp3").exists());
    }

    #[tokio::test]
    async fn test_local_store_missing_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());

        assert!(store.get_object("speech/none.mp3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_local_store_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());

        store
            .put_object("a.mp3", Bytes::from_static(b"one"), "audio/mpeg")
            .await
            .unwrap();
        store
            .put_object("a.mp3", Bytes::from_static(b"two"), "audio/mpeg")
            .await
            .unwrap();

        let object = store.get_object("a.mp3").await.unwrap().unwrap();
        assert_eq!(&object.bytes[..], b"two");
    }

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemoryObjectStore::new();

        store
            .put_object("images/x.png", Bytes::from_static(b"png"), "image/png")
            .await
            .unwrap();

        let object = store.get_object("images/x.png").await.unwrap().unwrap();
        assert_eq!(object.content_type, "image/png");
        assert!(store.get_object("images/y.png").await.unwrap().is_none());
        assert!(store.get_object("../x").await.is_err());
    }
}
