//! Error types for amber-crypto

use thiserror::Error;

/// Errors that can occur during cryptographic operations
///
/// Every failure is fatal to the operation that raised it; nothing in this
/// crate retries or substitutes fallback key material.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Entropy source failure: {0}")]
    EntropyFailure(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Key unwrap failed: {0}")]
    UnwrapFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Crypto primitive failure: {0}")]
    CryptoFailure(String),
}

/// Result type for crypto operations
pub type CryptoResult<T> = Result<T, CryptoError>;
