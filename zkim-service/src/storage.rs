//! Storage backend: an opaque key -> bytes map with atomic get/put/
//! delete/list, `async` so storage I/O is a real suspension point for
//! callers.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use async_trait::async_trait;
use tokio::time::sleep;

use crate::error::StorageError;

#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
    async fn has(&self, key: &str) -> Result<bool, StorageError>;
    async fn list(&self) -> Result<Vec<String>, StorageError>;
    async fn clear(&self) -> Result<(), StorageError>;
}

/// `get` is retried locally up to `retries` times with the backoff
/// schedule from `Config::storage_retry_backoff` (1s, 2s, 3s); `put`/
/// `delete` failures surface directly, matching §6's stated retry policy
/// and §7's "transient storage get failures are retried locally".
pub async fn get_with_retry(
    backend: &dyn StorageBackend,
    key: &str,
    retries: u32,
    backoff: &[std::time::Duration],
) -> Result<Option<Vec<u8>>, StorageError> {
    let mut attempt = 0;
    loop {
        match backend.get(key).await {
            Ok(v) => return Ok(v),
            Err(e) if attempt < retries => {
                let wait = backoff.get(attempt as usize).copied().unwrap_or(
                    backoff.last().copied().unwrap_or(std::time::Duration::from_secs(1)),
                );
                tracing::warn!(key, attempt, error = %e, "storage get failed, retrying");
                sleep(wait).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// In-memory backend for tests and ephemeral use.
#[derive(Default)]
pub struct InMemoryBackend {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.objects.read().unwrap().get(key).cloned())
    }

    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        self.objects.write().unwrap().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.objects.write().unwrap().remove(key);
        Ok(())
    }

    async fn has(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.objects.read().unwrap().contains_key(key))
    }

    async fn list(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.objects.read().unwrap().keys().cloned().collect())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.objects.write().unwrap().clear();
        Ok(())
    }
}

/// File-backed backend (one opaque blob per key), using an atomic
/// write-to-temp-then-rename. Keys are hex-encoded into a flat filename —
/// the trait contract treats keys as opaque, not as path components.
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::StorageUnavailable(format!("create dir: {e}")))?;
        Ok(Self { dir })
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.zkim", hex::encode(key.as_bytes())))
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.object_path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::StorageUnavailable(format!("read: {e}"))),
        }
    }

    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.object_path(key);
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| StorageError::StorageUnavailable(format!("write: {e}")))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StorageError::StorageUnavailable(format!("rename: {e}")))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.object_path(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::StorageUnavailable(format!("delete: {e}"))),
        }
    }

    async fn has(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.object_path(key).exists())
    }

    async fn list(&self) -> Result<Vec<String>, StorageError> {
        let mut out = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| StorageError::StorageUnavailable(format!("readdir: {e}")))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::StorageUnavailable(format!("entry: {e}")))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("zkim") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    if let Ok(bytes) = hex::decode(stem) {
                        if let Ok(key) = String::from_utf8(bytes) {
                            out.push(key);
                        }
                    }
                }
            }
        }
        Ok(out)
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let keys = self.list().await?;
        for key in keys {
            self.delete(&key).await?;
        }
        Ok(())
    }
}

/// Content-addressed key derivation for containers stored without an
/// explicit `fileId` opt-out (§6 "Persisted state layout").
pub fn content_address(container_bytes: &[u8]) -> String {
    use sha3::{Digest, Sha3_256};
    let digest = Sha3_256::digest(container_bytes);
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_roundtrip() {
        let backend = InMemoryBackend::new();
        backend.put("k", b"v").await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), Some(b"v".to_vec()));
        assert!(backend.has("k").await.unwrap());
        backend.delete("k").await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_backend_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path()).await.unwrap();
        backend.put("object-1", b"payload").await.unwrap();
        assert_eq!(backend.get("object-1").await.unwrap(), Some(b"payload".to_vec()));
        let listed = backend.list().await.unwrap();
        assert_eq!(listed, vec!["object-1".to_string()]);
        backend.clear().await.unwrap();
        assert!(backend.list().await.unwrap().is_empty());
    }
}
