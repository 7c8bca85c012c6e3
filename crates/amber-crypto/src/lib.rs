//! # Amber Crypto
//!
//! Cryptographic primitives for the Amber per-asset encryption pipeline.
//!
//! The pipeline never moves a raw symmetric key over the network: the
//! key-derivation collaborator seals a key share to a single-use transport
//! public key, and the caller unwraps it locally before touching any
//! payload bytes.
//!
//! ## Features
//!
//! - AES-256-GCM authenticated encryption for asset payloads
//! - X25519 single-use transport keypairs for wrapped-key delivery
//! - Key unwrapping bound to an asset and caller context
//! - Zeroization of secret material on drop
//!
//! ## Key Types
//!
//! - [`TransportKeyPair`]: single-use keypair that receives one wrapped key
//! - [`WrappedKeyMaterial`]: sealed key share plus verification key
//! - [`KeyUnwrapper`]: recovers the payload key, failing closed on mismatch
//! - [`SymmetricKey`]: 256-bit payload key, valid for one payload
//!
//! ## Example
//!
//! ```rust,ignore
//! use amber_core::{AssetId, BindingContext, Principal};
//! use amber_crypto::{KEY_DOMAIN_TAG, KeyUnwrapper, TransportKeyPair, WrappedKeyMaterial};
//!
//! let binding = BindingContext::for_asset(
//!     AssetId::new("asset-42")?,
//!     Principal::new("principal-A")?,
//! );
//!
//! // One fresh transport keypair per operation
//! let transport = TransportKeyPair::generate()?;
//!
//! // The collaborator returns hex-encoded material for our public key
//! let wrapped = WrappedKeyMaterial::from_hex(&ciphertext_hex, &verification_hex)?;
//!
//! // Unwrap locally; the transport keypair is consumed
//! let key = KeyUnwrapper::unwrap(transport, &wrapped, &binding, KEY_DOMAIN_TAG)?;
//!
//! let blob = key.encrypt(b"confidential payload")?.to_bytes();
//! let plaintext = key.decrypt_blob(&blob)?;
//! ```

pub mod cipher;
pub mod envelope;
pub mod error;
pub mod transport;

// Re-exports
pub use cipher::{EncryptedPayload, IV_SIZE, KEY_SIZE, SymmetricKey, TAG_SIZE};
pub use envelope::{KEY_DOMAIN_TAG, KeyUnwrapper, WrappedKeyMaterial};
pub use error::{CryptoError, CryptoResult};
pub use transport::TransportKeyPair;

// Re-export x25519 types for convenience
pub use x25519_dalek::{PublicKey, StaticSecret};
