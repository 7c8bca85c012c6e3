//! Session error types
//!
//! Maps failures from the crypto layer, the storage layer, and remote
//! collaborators into one fail-closed taxonomy. Every variant is fatal for
//! the session that produced it; sessions never retry a failed step.

use thiserror::Error;

use amber_crypto::CryptoError;
use amber_storage::StorageError;

/// Error returned by a collaborator service call
///
/// Collaborators are remote from the session's point of view. Whatever the
/// transport-level cause, the session reports it as
/// [`SessionError::CollaboratorUnavailable`].
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct CollaboratorError(String);

impl CollaboratorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors surfaced by an asset crypto session
#[derive(Debug, Error)]
pub enum SessionError {
    /// The operating system refused to produce random bytes
    #[error("Entropy failure: {0}")]
    EntropyFailure(String),

    /// A collaborator could not be reached or answered with an error
    #[error("Collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    /// An input had an invalid encoding before any cryptography ran
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Key unwrap failed: wrong binding, wrong verification key, or corrupt
    /// wrapped material. Deliberately does not say which.
    #[error("Key unwrap failed: {0}")]
    UnwrapFailed(String),

    /// Payload decryption failed authentication
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Unexpected failure inside a cryptographic primitive
    #[error("Crypto failure: {0}")]
    CryptoFailure(String),
}

impl SessionError {
    /// Stable machine-readable tag for the failure reason
    ///
    /// Callers surface this to users instead of the message text, which may
    /// mention internals.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::EntropyFailure(_) => "entropy_failure",
            Self::CollaboratorUnavailable(_) => "collaborator_unavailable",
            Self::MalformedInput(_) => "malformed_input",
            Self::UnwrapFailed(_) => "unwrap_failed",
            Self::DecryptionFailed(_) => "decryption_failed",
            Self::CryptoFailure(_) => "crypto_failure",
        }
    }
}

impl From<CryptoError> for SessionError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::EntropyFailure(msg) => Self::EntropyFailure(msg),
            CryptoError::MalformedInput(msg) => Self::MalformedInput(msg),
            CryptoError::UnwrapFailed(msg) => Self::UnwrapFailed(msg),
            CryptoError::DecryptionFailed(msg) => Self::DecryptionFailed(msg),
            CryptoError::CryptoFailure(msg) => Self::CryptoFailure(msg),
        }
    }
}

impl From<StorageError> for SessionError {
    fn from(err: StorageError) -> Self {
        Self::CollaboratorUnavailable(err.to_string())
    }
}

impl From<CollaboratorError> for SessionError {
    fn from(err: CollaboratorError) -> Self {
        Self::CollaboratorUnavailable(err.to_string())
    }
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;
