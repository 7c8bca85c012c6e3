//! The content store boundary
//!
//! The ciphertext store is an untrusted collaborator: it sees only sealed
//! blobs and addresses them by content hash. Implementations in this crate
//! are [`MemoryContentStore`](crate::memory::MemoryContentStore) and
//! [`FsContentStore`](crate::fs::FsContentStore).

use async_trait::async_trait;
use bytes::Bytes;

use crate::address::ContentAddress;
use crate::error::StorageError;

/// Content-addressed blob storage
///
/// No mutation semantics beyond content addressing: storing the same bytes
/// twice yields the same address, and a returned blob always hashes back to
/// the address it was fetched under.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store a blob, returning its content address
    async fn put(&self, data: &[u8]) -> Result<ContentAddress, StorageError>;

    /// Fetch a blob by content address
    async fn get(&self, address: &ContentAddress) -> Result<Bytes, StorageError>;

    /// Check whether a blob is present
    async fn contains(&self, address: &ContentAddress) -> Result<bool, StorageError>;
}
