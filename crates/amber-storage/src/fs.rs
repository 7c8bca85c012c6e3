//! Filesystem content store
//!
//! Durable implementation of [`ContentStore`] using BLAKE3-addressed files
//! under sharded directories. Writes are atomic (temp file plus rename) and
//! every load re-hashes the bytes against the requested address, so a blob
//! that rotted on disk is reported instead of returned.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info, instrument, warn};

use crate::address::ContentAddress;
use crate::error::StorageError;
use crate::store::ContentStore;

/// Configuration for the filesystem store
#[derive(Debug, Clone)]
pub struct FsStoreConfig {
    /// Base directory for blob files
    pub base_dir: PathBuf,
    /// Number of subdirectory levels (for sharding)
    pub shard_depth: u8,
    /// Maximum blob size (bytes)
    pub max_blob_size: u64,
}

impl Default for FsStoreConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("./data/blobs"),
            shard_depth: 2,                   // e.g., ab/cd/abcdef...
            max_blob_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// Content-addressed blob store on the local filesystem
pub struct FsContentStore {
    config: FsStoreConfig,
}

impl FsContentStore {
    /// Create a filesystem store, ensuring the base directory exists
    pub async fn new(config: FsStoreConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.base_dir)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;

        info!(path = %config.base_dir.display(), "Content store initialized");

        Ok(Self { config })
    }

    /// Delete a blob; returns whether anything was removed
    #[instrument(skip(self), fields(hash = %address.short_hash()))]
    pub async fn delete(&self, address: &ContentAddress) -> Result<bool, StorageError> {
        let path = self.blob_path(address);

        match fs::remove_file(&path).await {
            Ok(_) => {
                debug!("Deleted blob");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Io(e.to_string())),
        }
    }

    /// File path for a content address
    fn blob_path(&self, address: &ContentAddress) -> PathBuf {
        let hash_hex = address.hash_hex();

        let mut path = self.config.base_dir.clone();
        for i in 0..self.config.shard_depth as usize {
            let start = i * 2;
            let end = start + 2;
            if end <= hash_hex.len() {
                path.push(&hash_hex[start..end]);
            }
        }
        path.push(&hash_hex);
        path
    }
}

#[async_trait]
impl ContentStore for FsContentStore {
    #[instrument(skip(self, data), fields(size = data.len()))]
    async fn put(&self, data: &[u8]) -> Result<ContentAddress, StorageError> {
        if data.len() as u64 > self.config.max_blob_size {
            return Err(StorageError::CapacityExceeded);
        }

        let address = ContentAddress::from_data(data);

        if self.contains(&address).await? {
            debug!(hash = %address.short_hash(), "Blob already exists");
            return Ok(address);
        }

        let path = self.blob_path(&address);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Io(e.to_string()))?;
        }

        // Write atomically (write to temp, then rename)
        let temp_path = path.with_extension("tmp");

        let mut file = File::create(&temp_path)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;

        file.write_all(data)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;

        file.sync_all()
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;

        fs::rename(&temp_path, &path)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;

        debug!(hash = %address.short_hash(), "Stored blob");
        Ok(address)
    }

    #[instrument(skip(self), fields(hash = %address.short_hash()))]
    async fn get(&self, address: &ContentAddress) -> Result<Bytes, StorageError> {
        let path = self.blob_path(address);

        let mut file = File::open(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::not_found(address.hash_hex())
            } else {
                StorageError::Io(e.to_string())
            }
        })?;

        let mut data = Vec::with_capacity(address.size as usize);
        file.read_to_end(&mut data)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;

        // Verify hash before returning anything
        let actual = ContentAddress::from_data(&data);
        if !actual.content_equals(address) {
            warn!(
                expected = %address.hash_hex(),
                actual = %actual.hash_hex(),
                "Blob hash mismatch"
            );
            return Err(StorageError::HashMismatch {
                expected: address.hash_hex(),
                actual: actual.hash_hex(),
            });
        }

        Ok(Bytes::from(data))
    }

    async fn contains(&self, address: &ContentAddress) -> Result<bool, StorageError> {
        let path = self.blob_path(address);
        Ok(path.exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;
    use tempfile::TempDir;

    async fn create_test_store() -> (FsContentStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = FsStoreConfig {
            base_dir: temp_dir.path().join("blobs"),
            ..Default::default()
        };
        let store = FsContentStore::new(config).await.unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let (store, _temp) = create_test_store().await;

        let data = b"sealed health record";
        let address = store.put(data).await.unwrap();

        assert_eq!(address.size, data.len() as u64);

        let fetched = store.get(&address).await.unwrap();
        assert_eq!(&fetched[..], data);
    }

    #[tokio::test]
    async fn test_large_random_blob_round_trip() {
        let (store, _temp) = create_test_store().await;

        let mut data = vec![0u8; 64 * 1024];
        rand::rng().fill_bytes(&mut data);

        let address = store.put(&data).await.unwrap();
        assert_eq!(address.size, data.len() as u64);

        let fetched = store.get(&address).await.unwrap();
        assert_eq!(&fetched[..], &data[..]);
    }

    #[tokio::test]
    async fn test_put_is_idempotent() {
        let (store, _temp) = create_test_store().await;

        let a = store.put(b"same ciphertext").await.unwrap();
        let b = store.put(b"same ciphertext").await.unwrap();

        assert!(a.content_equals(&b));
    }

    #[tokio::test]
    async fn test_get_missing_blob() {
        let (store, _temp) = create_test_store().await;

        let address = ContentAddress::from_data(b"never stored");
        let result = store.get(&address).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_contains_and_delete() {
        let (store, _temp) = create_test_store().await;

        let address = store.put(b"delete me").await.unwrap();
        assert!(store.contains(&address).await.unwrap());

        assert!(store.delete(&address).await.unwrap());
        assert!(!store.contains(&address).await.unwrap());

        // Deleting again is a no-op
        assert!(!store.delete(&address).await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupted_blob_is_rejected() {
        let (store, temp) = create_test_store().await;

        let data = b"original ciphertext";
        let address = store.put(data).await.unwrap();

        // Corrupt the file on disk
        let hash_hex = address.hash_hex();
        let path = temp
            .path()
            .join("blobs")
            .join(&hash_hex[0..2])
            .join(&hash_hex[2..4])
            .join(&hash_hex);
        fs::write(&path, b"rotted bytes").await.unwrap();

        let result = store.get(&address).await;
        assert!(matches!(result, Err(StorageError::HashMismatch { .. })));
    }

    #[tokio::test]
    async fn test_capacity_limit() {
        let temp_dir = TempDir::new().unwrap();
        let config = FsStoreConfig {
            base_dir: temp_dir.path().join("blobs"),
            max_blob_size: 4,
            ..Default::default()
        };
        let store = FsContentStore::new(config).await.unwrap();

        assert!(store.put(b"ok").await.is_ok());
        assert!(matches!(
            store.put(b"too long").await,
            Err(StorageError::CapacityExceeded)
        ));
    }
}
