//! # Amber Session
//!
//! Per-asset encryption sessions for Amber.
//!
//! This crate orchestrates the full seal/open pipeline over the crypto and
//! storage layers: single-use transport keys, wrapped key material from the
//! key-derivation collaborator, fail-closed unwrap under a binding context,
//! payload encryption, and content-addressed publication with a record
//! update last.
//!
//! ## Features
//!
//! - **AssetCryptoSession**: One-shot seal/open pipeline for a single asset
//! - **KeyDerivationService trait**: Abstraction over the remote key collaborator
//! - **RecordService trait**: Abstraction over asset record storage
//! - **MockKeyService / MockRecordService**: Deterministic in-process
//!   collaborators with outage switches and call counters
//!
//! ## Example
//!
//! ```rust,ignore
//! use amber_core::Principal;
//! use amber_session::{AssetCryptoSession, MockKeyService, MockRecordService};
//! use amber_storage::MemoryContentStore;
//!
//! #[tokio::main]
//! async fn main() {
//!     let keys = MockKeyService::new([7u8; 32]);
//!     let store = MemoryContentStore::new();
//!     let records = MockRecordService::new();
//!
//!     let caller = Principal::new("principal-A").unwrap();
//!     let asset = records.create_asset(&caller).await.unwrap();
//!
//!     // Seal a payload for the asset
//!     let session = AssetCryptoSession::new(&keys, &store, &records, asset.clone(), caller.clone());
//!     let receipt = session.seal(b"confidential payload").await.unwrap();
//!
//!     // A fresh session opens it again
//!     let session = AssetCryptoSession::new(&keys, &store, &records, asset, caller);
//!     let plaintext = session.open(&receipt.content_address).await.unwrap();
//!     assert_eq!(plaintext, b"confidential payload");
//! }
//! ```

pub mod collaborators;
pub mod error;
pub mod record;
pub mod session;

// Re-exports
pub use collaborators::{KeyDerivationService, MockKeyService};
pub use error::{CollaboratorError, SessionError, SessionResult};
pub use record::{AssetRecord, MockRecordService, RecordService};
pub use session::{AssetCryptoSession, SealReceipt, SessionState};

// Re-export identity and binding types from amber-core for convenience
pub use amber_core::{AssetId, BindingContext, Principal};
