//! Local filesystem storage backend.

use crate::error::{StorageError, StorageResult};
use crate::traits::{ByteStream, ObjectMeta, ObjectStore};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use uuid::Uuid;

/// Default chunk size for streaming reads (64 KiB).
const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Local filesystem object store.
pub struct FilesystemBackend {
    root: PathBuf,
}

impl FilesystemBackend {
    /// Create a new filesystem backend.
    pub async fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Get the full path for a key, with path traversal protection.
    ///
    /// This is an async wrapper around `key_path_sync` that uses `spawn_blocking`
    /// to avoid blocking the Tokio runtime during filesystem operations like
    /// `canonicalize` and `symlink_metadata`.
    async fn key_path(&self, key: &str) -> StorageResult<PathBuf> {
        let root = self.root.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || Self::key_path_sync(&root, &key))
            .await
            .map_err(|e| {
                StorageError::Io(std::io::Error::other(format!("spawn_blocking failed: {e}")))
            })?
    }

    /// Synchronous key path validation with path traversal protection.
    ///
    /// Returns an error if the key would escape the storage root.
    /// This includes protection against symlink-based traversal attacks.
    fn key_path_sync(root: &Path, key: &str) -> StorageResult<PathBuf> {
        // Reject keys with obvious path traversal attempts (fast path)
        if key.contains("..") || key.starts_with('/') || key.starts_with('\\') {
            return Err(StorageError::InvalidKey(format!(
                "path traversal not allowed: {key}"
            )));
        }

        // Validate all path components are normal (no .., ., root, etc.)
        for component in std::path::Path::new(key).components() {
            match component {
                std::path::Component::Normal(_) => {}
                _ => {
                    return Err(StorageError::InvalidKey(format!(
                        "contains unsafe path component: {key}"
                    )));
                }
            }
        }

        let path = root.join(key);

        let root_canonical = root.canonicalize().map_err(|e| {
            StorageError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to canonicalize root: {e}"),
            ))
        })?;

        // For existing paths (or symlinks, even if broken), canonicalize and verify
        // they don't escape the root. This catches symlink-based traversal attacks
        // where a symlink inside the storage root points to a location outside of it.
        match std::fs::symlink_metadata(&path) {
            Ok(meta) => {
                let canonical = path.canonicalize().map_err(|e| {
                    if meta.file_type().is_symlink() {
                        StorageError::InvalidKey(format!(
                            "symlink target missing or invalid: {key}"
                        ))
                    } else {
                        StorageError::Io(std::io::Error::new(
                            e.kind(),
                            format!("failed to canonicalize path: {e}"),
                        ))
                    }
                })?;

                if !canonical.starts_with(&root_canonical) {
                    return Err(StorageError::InvalidKey(format!(
                        "resolved path escapes storage root: {key}"
                    )));
                }

                // Return the original path (not canonical) to preserve consistency
                // with root in list operations. The security check above ensures
                // the path is safe.
                return Ok(path);
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(StorageError::Io(std::io::Error::new(
                    err.kind(),
                    format!("failed to stat path: {err}"),
                )));
            }
        }

        // For new paths, find the nearest existing ancestor and verify it's within the root.
        // This prevents creating files through symlinked directories, even when intermediate
        // directories don't exist yet. For example: if root/a -> /tmp/out (symlink), and
        // key is "a/b/file", the parent "root/a/b" doesn't exist, but ancestor "root/a"
        // does and would escape the root via symlink.

        // Walk up the path to find the nearest existing ancestor
        let mut ancestor = path.as_path();
        while let Some(parent) = ancestor.parent() {
            match std::fs::symlink_metadata(parent) {
                Ok(meta) => {
                    let parent_canonical = parent.canonicalize().map_err(|e| {
                        if meta.file_type().is_symlink() {
                            StorageError::InvalidKey(format!(
                                "ancestor symlink target missing or invalid: {key}"
                            ))
                        } else {
                            StorageError::Io(std::io::Error::new(
                                e.kind(),
                                format!("failed to canonicalize ancestor: {e}"),
                            ))
                        }
                    })?;

                    if !parent_canonical.starts_with(&root_canonical) {
                        return Err(StorageError::InvalidKey(format!(
                            "ancestor path escapes storage root: {key}"
                        )));
                    }
                    // Found a valid existing ancestor within root
                    break;
                }
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => {
                    return Err(StorageError::Io(std::io::Error::new(
                        err.kind(),
                        format!("failed to stat ancestor: {err}"),
                    )));
                }
            }
            ancestor = parent;
        }

        Ok(path)
    }

    /// Ensure parent directory exists.
    async fn ensure_parent(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for FilesystemBackend {
    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn head(&self, key: &str) -> StorageResult<ObjectMeta> {
        let path = self.key_path(key).await?;
        let metadata = fs::metadata(&path).await.map_err(|e| not_found_or_io(e, key))?;
        if !metadata.is_file() {
            return Err(StorageError::NotFound(key.to_string()));
        }

        Ok(ObjectMeta {
            size: metadata.len(),
            last_modified: metadata.modified().ok().map(|t| t.into()),
            content_type: None,
        })
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        let path = self.key_path(key).await?;
        let data = fs::read(&path).await.map_err(|e| not_found_or_io(e, key))?;
        Ok(Bytes::from(data))
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn get_stream(&self, key: &str) -> StorageResult<ByteStream> {
        use tokio::io::AsyncReadExt;

        let path = self.key_path(key).await?;
        let file = fs::File::open(&path)
            .await
            .map_err(|e| not_found_or_io(e, key))?;

        // Stream the file in chunks instead of loading entirely into memory
        let stream = async_stream::try_stream! {
            let mut file = file;
            let mut buf = vec![0u8; STREAM_CHUNK_SIZE];
            loop {
                let n = file.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                yield Bytes::copy_from_slice(&buf[..n]);
            }
        };

        Ok(Box::pin(stream))
    }

    #[instrument(skip(self, data), fields(backend = "filesystem", size = data.len()))]
    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()> {
        let path = self.key_path(key).await?;
        self.ensure_parent(&path).await?;

        // Write to temp file with unique name, fsync, then rename for atomicity and durability.
        // The UUID keeps concurrent writers of the same key apart.
        let temp_name = format!(".tmp.{}", Uuid::new_v4());
        let temp_path = path.with_file_name(
            path.file_name()
                .map(|n| format!("{}{}", n.to_string_lossy(), temp_name))
                .unwrap_or_else(|| temp_name.clone()),
        );

        let write_result = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(&data).await?;
            file.sync_all().await?;
            fs::rename(&temp_path, &path).await
        }
        .await;

        if let Err(e) = write_result {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::Io(e));
        }

        Ok(())
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_path(key).await?;
        fs::remove_file(&path)
            .await
            .map_err(|e| not_found_or_io(e, key))?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn health_check(&self) -> StorageResult<()> {
        // Verify the root directory exists and is accessible
        let metadata = fs::metadata(&self.root).await.map_err(|e| {
            StorageError::Io(std::io::Error::new(
                e.kind(),
                format!("storage root not accessible: {}", e),
            ))
        })?;

        if !metadata.is_dir() {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::NotADirectory,
                format!("storage root is not a directory: {:?}", self.root),
            )));
        }

        Ok(())
    }
}

fn not_found_or_io(e: std::io::Error, key: &str) -> StorageError {
    if e.kind() == std::io::ErrorKind::NotFound {
        StorageError::NotFound(key.to_string())
    } else {
        StorageError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path()).await.unwrap();

        let key = "photos/1717243200123-ab12.jpg";
        let data = Bytes::from("jpeg bytes");

        backend.put(key, data.clone()).await.unwrap();

        let retrieved = backend.get(key).await.unwrap();
        assert_eq!(retrieved, data);

        let meta = backend.head(key).await.unwrap();
        assert_eq!(meta.size, data.len() as u64);
        assert!(meta.last_modified.is_some());
    }

    #[tokio::test]
    async fn test_put_replaces_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path()).await.unwrap();

        backend.put("gallery.json", Bytes::from("[]")).await.unwrap();
        backend
            .put("gallery.json", Bytes::from("[1]"))
            .await
            .unwrap();

        assert_eq!(backend.get("gallery.json").await.unwrap(), "[1]");
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["gallery.json".to_string()]);
    }

    #[tokio::test]
    async fn test_get_stream_yields_content() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path()).await.unwrap();

        let data = Bytes::from(vec![7u8; STREAM_CHUNK_SIZE * 2 + 10]);
        backend.put("big.bin", data.clone()).await.unwrap();

        let mut stream = backend.get_stream("big.bin").await.unwrap();
        let mut collected = Vec::new();
        while let Some(chunk) = stream.next().await {
            collected.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(collected, data.to_vec());
    }

    #[tokio::test]
    async fn test_missing_objects_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path()).await.unwrap();

        assert!(matches!(
            backend.get("nope.jpg").await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            backend.head("nope.jpg").await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            backend.delete("nope.jpg").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_head_on_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path()).await.unwrap();
        backend.put("photos/a.jpg", Bytes::from("a")).await.unwrap();

        assert!(matches!(
            backend.head("photos").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_removes_object() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path()).await.unwrap();

        backend.put("photos/a.jpg", Bytes::from("a")).await.unwrap();
        backend.delete("photos/a.jpg").await.unwrap();
        assert!(backend.get("photos/a.jpg").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path()).await.unwrap();

        assert!(matches!(
            backend.get("../escape").await,
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            backend.get("/absolute/path").await,
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            backend.get("foo/../../etc/passwd").await,
            Err(StorageError::InvalidKey(_))
        ));

        // Valid but missing keys are simply not found
        assert!(backend.get("valid/nested/key").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_symlink_traversal_rejected() {
        use std::os::unix::fs::symlink;

        let dir = tempfile::tempdir().unwrap();
        let outside_dir = tempfile::tempdir().unwrap();

        let outside_file = outside_dir.path().join("secret.txt");
        std::fs::write(&outside_file, "secret data").unwrap();

        let backend = FilesystemBackend::new(dir.path()).await.unwrap();

        let symlink_path = dir.path().join("malicious_link");
        symlink(&outside_file, &symlink_path).unwrap();

        let result = backend.get("malicious_link").await;
        if let Err(StorageError::InvalidKey(msg)) = result {
            assert!(
                msg.contains("escapes storage root"),
                "error should mention escaping root: {msg}"
            );
        } else {
            panic!("expected InvalidKey error, got: {result:?}");
        }
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_ancestor_symlink_traversal_rejected() {
        use std::os::unix::fs::symlink;

        let dir = tempfile::tempdir().unwrap();
        let outside_dir = tempfile::tempdir().unwrap();

        let backend = FilesystemBackend::new(dir.path()).await.unwrap();

        // root/escape -> outside; writing root/escape/nested/file must not create
        // directories outside the root.
        let symlink_path = dir.path().join("escape");
        symlink(outside_dir.path(), &symlink_path).unwrap();

        let result = backend
            .put("escape/nested/deep/file.txt", Bytes::from("data"))
            .await;

        if let Err(StorageError::InvalidKey(msg)) = result {
            assert!(
                msg.contains("escapes storage root"),
                "error should mention escaping root: {msg}"
            );
        } else {
            panic!("expected InvalidKey error, got: {result:?}");
        }

        assert!(!outside_dir.path().join("nested").exists());
    }

    #[tokio::test]
    async fn test_health_check_fails_when_root_removed() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("store");
        let backend = FilesystemBackend::new(&root).await.unwrap();
        backend.health_check().await.unwrap();

        std::fs::remove_dir_all(&root).unwrap();
        assert!(backend.health_check().await.is_err());
    }
}
