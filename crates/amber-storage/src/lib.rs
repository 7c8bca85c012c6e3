//! # Amber Storage
//!
//! Content-addressed blob storage for sealed payloads.
//!
//! The storage collaborator is untrusted: it holds opaque ciphertext blobs
//! and promises only content addressing (same bytes in, same address out;
//! same address, same bytes back). This crate defines that boundary as the
//! [`ContentStore`] trait and provides two implementations:
//!
//! - [`MemoryContentStore`]: DashMap-backed, for tests and simulation
//! - [`FsContentStore`]: sharded on-disk files with atomic writes and
//!   hash verification on every load

pub mod address;
pub mod error;
pub mod fs;
pub mod memory;
pub mod store;

// Re-export main types
pub use address::ContentAddress;
pub use error::StorageError;
pub use fs::{FsContentStore, FsStoreConfig};
pub use memory::MemoryContentStore;
pub use store::ContentStore;
