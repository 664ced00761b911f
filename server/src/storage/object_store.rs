//! Bucketed object storage
//!
//! Objects are addressed by `(bucket, path)` where paths look like
//! `{user_id}/{name}.png`. Writes are upserts: a repeated `put` on the same
//! path replaces the object.
//!
//! Example: bucket "logos", path "u1/abc.png" is stored at
//! "<root>/logos/u1/abc.png" and published as "<base_url>/logos/u1/abc.png".

use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Binary object storage with public URLs
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` at `path`, replacing any existing object
    async fn put(&self, bucket: &str, path: &str, data: &[u8], content_type: &str) -> Result<()>;

    /// Read an object
    async fn get(&self, bucket: &str, path: &str) -> Result<Vec<u8>>;

    /// Remove an object; removing a missing object succeeds
    async fn delete(&self, bucket: &str, path: &str) -> Result<()>;

    /// Public URL for an object. Pure derivation, no I/O.
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

/// Object store backed by a local directory tree
#[derive(Clone)]
pub struct FsObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl FsObjectStore {
    /// Create a new store at the given root directory
    pub fn new(root: PathBuf, public_base_url: impl Into<String>) -> Self {
        Self {
            root,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Initialize the store (create directory if needed)
    pub async fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        tracing::info!("Object store initialized at: {:?}", self.root);
        Ok(())
    }

    /// Check if an object exists
    pub async fn exists(&self, bucket: &str, path: &str) -> Result<bool> {
        let full = self.object_path(bucket, path)?;
        Ok(fs::try_exists(&full).await?)
    }

    /// Get store root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, bucket: &str, path: &str) -> Result<PathBuf> {
        validate_key(bucket)?;
        validate_key(path)?;
        Ok(self.root.join(bucket).join(path))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(&self, bucket: &str, path: &str, data: &[u8], content_type: &str) -> Result<()> {
        let full = self.object_path(bucket, path)?;

        let parent = full
            .parent()
            .ok_or_else(|| AppError::Storage(format!("Invalid object key: {:?}", path)))?;
        fs::create_dir_all(parent).await?;

        // Write to a per-writer temp file, then rename over the target
        let temp_path = parent.join(format!(".{}.tmp", Uuid::new_v4()));
        if let Err(e) = write_file(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }
        if let Err(e) = fs::rename(&temp_path, &full).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        tracing::debug!(
            "Stored object {}/{} ({} bytes, {})",
            bucket,
            path,
            data.len(),
            content_type
        );
        Ok(())
    }

    async fn get(&self, bucket: &str, path: &str) -> Result<Vec<u8>> {
        let full = self.object_path(bucket, path)?;

        match fs::read(&full).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound(format!("object {}/{}", bucket, path)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, bucket: &str, path: &str) -> Result<()> {
        let full = self.object_path(bucket, path)?;

        match fs::remove_file(&full).await {
            Ok(()) => {
                tracing::debug!("Deleted object {}/{}", bucket, path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, bucket, path)
    }
}

async fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    Ok(())
}

/// Reject keys that could escape the store root
fn validate_key(key: &str) -> Result<()> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.contains('\0')
        || key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");

    if bad {
        return Err(AppError::Storage(format!("Invalid object key: {:?}", key)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_store() -> (FsObjectStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FsObjectStore::new(temp_dir.path().join("objects"), "http://cdn.test/storage/");
        store.initialize().await.unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let (store, _temp) = create_test_store().await;

        store.put("logos", "u1/a.png", b"png-bytes", "image/png").await.unwrap();

        let data = store.get("logos", "u1/a.png").await.unwrap();
        assert_eq!(data, b"png-bytes");
        assert!(store.exists("logos", "u1/a.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_put_is_upsert() {
        let (store, _temp) = create_test_store().await;

        store.put("logo-previews", "u1/l1.png", b"first", "image/png").await.unwrap();
        store.put("logo-previews", "u1/l1.png", b"second", "image/png").await.unwrap();

        let data = store.get("logo-previews", "u1/l1.png").await.unwrap();
        assert_eq!(data, b"second");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_upserts_of_same_key() {
        let (store, temp) = create_test_store().await;
        let store = std::sync::Arc::new(store);

        for round in 0..20u8 {
            let writers: Vec<_> = (0..4u8)
                .map(|writer| {
                    let store = store.clone();
                    tokio::spawn(async move {
                        let data = vec![round ^ writer; 256 * 1024];
                        store.put("logo-previews", "u1/l1.png", &data, "image/png").await
                    })
                })
                .collect();

            for writer in writers {
                writer.await.unwrap().unwrap();
            }
        }

        let data = store.get("logo-previews", "u1/l1.png").await.unwrap();
        assert_eq!(data.len(), 256 * 1024);
        assert!(data.iter().all(|b| *b == data[0]));

        // No temp files left behind
        let dir = temp.path().join("objects").join("logo-previews").join("u1");
        let names: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("l1.png")]);
    }

    #[tokio::test]
    async fn test_keys_differing_by_extension_do_not_collide() {
        let (store, _temp) = create_test_store().await;

        let (a, b) = tokio::join!(
            store.put("logos", "u1/a.png", b"png", "image/png"),
            store.put("logos", "u1/a.jpg", b"jpg", "image/jpeg"),
        );
        a.unwrap();
        b.unwrap();

        assert_eq!(store.get("logos", "u1/a.png").await.unwrap(), b"png");
        assert_eq!(store.get("logos", "u1/a.jpg").await.unwrap(), b"jpg");
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (store, _temp) = create_test_store().await;

        store.put("logos", "u1/a.png", b"x", "image/png").await.unwrap();
        store.delete("logos", "u1/a.png").await.unwrap();
        store.delete("logos", "u1/a.png").await.unwrap();

        assert!(!store.exists("logos", "u1/a.png").await.unwrap());
        assert!(matches!(
            store.get("logos", "u1/a.png").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_public_url() {
        let (store, _temp) = create_test_store().await;
        assert_eq!(
            store.public_url("logos", "u1/a.png"),
            "http://cdn.test/storage/logos/u1/a.png"
        );
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let (store, _temp) = create_test_store().await;

        for key in ["../etc/passwd", "/abs.png", "u1//a.png", "u1\\a.png", "u1/./a.png"] {
            assert!(
                store.put("logos", key, b"x", "image/png").await.is_err(),
                "accepted {:?}",
                key
            );
        }
    }
}
