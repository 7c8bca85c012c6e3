//! Content address types

use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Address of a content-addressed blob
///
/// The retrieval key is the BLAKE3 hash of the stored bytes: same bytes in,
/// same address; same address, same bytes out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentAddress {
    /// BLAKE3 hash of the content
    pub hash: [u8; 32],
    /// Size of the content in bytes
    pub size: u64,
}

impl ContentAddress {
    /// Compute the address of a byte string
    pub fn from_data(data: &[u8]) -> Self {
        let hash = blake3::hash(data);
        Self {
            hash: *hash.as_bytes(),
            size: data.len() as u64,
        }
    }

    /// Parse from the hex string form used at collaborator boundaries
    pub fn from_hex(hash_hex: &str, size: u64) -> Result<Self, StorageError> {
        let bytes = hex::decode(hash_hex)
            .map_err(|e| StorageError::InvalidAddress(e.to_string()))?;
        let hash: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
            StorageError::InvalidAddress(format!("expected 32 hash bytes, got {}", v.len()))
        })?;
        Ok(Self { hash, size })
    }

    /// The hash as a hex string
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// Short hash for display (first 8 chars)
    pub fn short_hash(&self) -> String {
        hex::encode(&self.hash[..4])
    }

    /// Whether two addresses name the same content
    pub fn content_equals(&self, other: &ContentAddress) -> bool {
        self.hash == other.hash
    }
}

impl std::fmt::Display for ContentAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ContentAddress({}, {} bytes)", self.short_hash(), self.size)
    }
}
