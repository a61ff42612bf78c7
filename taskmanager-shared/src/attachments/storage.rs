/// Blob storage for attachment bytes
///
/// Paths handed to [`FileStorage`] are relative to the storage root and use
/// `/` separators. Absolute paths and `..` components are refused.

use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage path: {0}")]
    InvalidPath(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn save(&self, relative_path: &str, content: Bytes) -> StorageResult<()>;

    async fn get(&self, relative_path: &str) -> StorageResult<Bytes>;

    /// Deleting a missing file succeeds
    async fn delete(&self, relative_path: &str) -> StorageResult<()>;

    async fn exists(&self, relative_path: &str) -> StorageResult<bool>;
}

/// Stores files under a base directory on the local disk
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    base_path: PathBuf,
}

impl LocalFileStorage {
    /// Opens the storage root, creating it if needed
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();
        tokio::fs::create_dir_all(&base_path).await?;

        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn resolve(&self, relative_path: &str) -> StorageResult<PathBuf> {
        let relative = Path::new(relative_path);

        if relative_path.is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::InvalidPath(relative_path.to_string()));
        }

        Ok(self.base_path.join(relative))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn save(&self, relative_path: &str, content: Bytes) -> StorageResult<()> {
        let full_path = self.resolve(relative_path)?;

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full_path, &content).await?;

        debug!(path = %relative_path, bytes = content.len(), "Stored file");
        Ok(())
    }

    async fn get(&self, relative_path: &str) -> StorageResult<Bytes> {
        let full_path = self.resolve(relative_path)?;

        match tokio::fs::read(&full_path).await {
            Ok(content) => Ok(Bytes::from(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(relative_path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, relative_path: &str) -> StorageResult<()> {
        let full_path = self.resolve(relative_path)?;

        match tokio::fs::remove_file(&full_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, relative_path: &str) -> StorageResult<bool> {
        let full_path = self.resolve(relative_path)?;
        Ok(tokio::fs::try_exists(&full_path).await?)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    async fn temp_storage() -> LocalFileStorage {
        let dir = std::env::temp_dir().join(format!("taskmanager-storage-{}", Uuid::new_v4()));
        LocalFileStorage::new(dir).await.unwrap()
    }

    #[tokio::test]
    async fn test_new_creates_base_directory() {
        let storage = temp_storage().await;
        assert!(storage.base_path().is_dir());
        tokio::fs::remove_dir_all(storage.base_path()).await.unwrap();
    }

    #[tokio::test]
    async fn test_save_get_delete() {
        let storage = temp_storage().await;
        let path = "task-1/file.pdf";

        storage.save(path, Bytes::from_static(b"%PDF-1.7")).await.unwrap();
        assert!(storage.exists(path).await.unwrap());
        assert_eq!(storage.get(path).await.unwrap(), Bytes::from_static(b"%PDF-1.7"));

        storage.delete(path).await.unwrap();
        assert!(!storage.exists(path).await.unwrap());

        // second delete is a no-op
        storage.delete(path).await.unwrap();

        tokio::fs::remove_dir_all(storage.base_path()).await.unwrap();
    }

    #[tokio::test]
    async fn test_get_missing_file() {
        let storage = temp_storage().await;
        assert!(matches!(
            storage.get("nope/missing.png").await,
            Err(StorageError::NotFound(_))
        ));
        tokio::fs::remove_dir_all(storage.base_path()).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() {
        let storage = temp_storage().await;

        for path in ["../outside.txt", "a/../../b", "/etc/passwd", ""] {
            assert!(
                matches!(
                    storage.save(path, Bytes::from_static(b"x")).await,
                    Err(StorageError::InvalidPath(_))
                ),
                "{path:?} should be rejected"
            );
        }

        tokio::fs::remove_dir_all(storage.base_path()).await.unwrap();
    }
}
