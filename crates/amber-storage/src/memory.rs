//! In-memory content store
//!
//! DashMap-backed implementation of [`ContentStore`], suitable for tests
//! and in-process simulation of the storage collaborator.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use tracing::{debug, trace};

use crate::address::ContentAddress;
use crate::error::StorageError;
use crate::store::ContentStore;

/// Default per-blob size limit (100MB)
const DEFAULT_MAX_BLOB_SIZE: u64 = 100 * 1024 * 1024;

/// In-memory implementation of [`ContentStore`]
///
/// Uses `DashMap` for concurrent access. Tracks put counts so tests can
/// assert how often the collaborator was called.
#[derive(Debug)]
pub struct MemoryContentStore {
    blobs: DashMap<[u8; 32], Bytes>,
    max_blob_size: u64,
    /// Total number of put calls (including deduplicated ones)
    put_count: AtomicUsize,
    /// Total number of get calls
    get_count: AtomicUsize,
    /// Total bytes currently held
    total_bytes: AtomicU64,
}

impl Default for MemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryContentStore {
    /// Create an in-memory store with the default size limit
    pub fn new() -> Self {
        Self::with_max_blob_size(DEFAULT_MAX_BLOB_SIZE)
    }

    /// Create with a custom per-blob size limit
    pub fn with_max_blob_size(max_blob_size: u64) -> Self {
        Self {
            blobs: DashMap::new(),
            max_blob_size,
            put_count: AtomicUsize::new(0),
            get_count: AtomicUsize::new(0),
            total_bytes: AtomicU64::new(0),
        }
    }

    /// Number of distinct blobs held
    pub fn blob_count(&self) -> usize {
        self.blobs.len()
    }

    /// Number of put calls observed
    pub fn put_count(&self) -> usize {
        self.put_count.load(Ordering::SeqCst)
    }

    /// Number of get calls observed
    pub fn get_count(&self) -> usize {
        self.get_count.load(Ordering::SeqCst)
    }

    /// Total bytes currently held
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn put(&self, data: &[u8]) -> Result<ContentAddress, StorageError> {
        self.put_count.fetch_add(1, Ordering::SeqCst);

        if data.len() as u64 > self.max_blob_size {
            return Err(StorageError::CapacityExceeded);
        }

        let address = ContentAddress::from_data(data);
        trace!(hash = %address.short_hash(), size = data.len(), "Storing blob");

        if self
            .blobs
            .insert(address.hash, Bytes::copy_from_slice(data))
            .is_none()
        {
            self.total_bytes.fetch_add(address.size, Ordering::SeqCst);
            debug!(hash = %address.short_hash(), "Stored new blob");
        }

        Ok(address)
    }

    async fn get(&self, address: &ContentAddress) -> Result<Bytes, StorageError> {
        self.get_count.fetch_add(1, Ordering::SeqCst);

        match self.blobs.get(&address.hash) {
            Some(data) => Ok(data.clone()),
            None => Err(StorageError::not_found(address.hash_hex())),
        }
    }

    async fn contains(&self, address: &ContentAddress) -> Result<bool, StorageError> {
        Ok(self.blobs.contains_key(&address.hash))
    }
}
