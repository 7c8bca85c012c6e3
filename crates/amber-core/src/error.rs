//! Error types for amber-core

use thiserror::Error;

use crate::identity::MAX_IDENTIFIER_BYTES;

/// Errors related to asset and caller identifiers
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Empty {0} identifier")]
    Empty(&'static str),

    #[error("{0} identifier exceeds {max} bytes", max = MAX_IDENTIFIER_BYTES)]
    TooLong(&'static str),
}
