//! Binding context for key derivation
//!
//! The binding context is the data mixed into key unwrapping that ties a
//! recovered key to one asset and one caller. A key wrapped under one
//! context can never be unwrapped under another.

use serde::{Deserialize, Serialize};

use crate::identity::{AssetId, Principal};

/// Frame tag for an asset-scoped binding
const TAG_ASSET: u8 = 0x01;
/// Frame tag for a caller-only binding
const TAG_CALLER: u8 = 0x02;

/// Context a wrapped key is bound to
///
/// Asset flows (upload, download) bind to the asset identifier plus the
/// acting caller. Registration-style flows, which run before any asset
/// exists, bind to the caller identity alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindingContext {
    /// Key is bound to one asset, derivable only by this caller
    Asset { asset: AssetId, caller: Principal },
    /// Key is bound to the caller identity alone
    Caller { caller: Principal },
}

impl BindingContext {
    /// Binding for an asset operation
    pub fn for_asset(asset: AssetId, caller: Principal) -> Self {
        Self::Asset { asset, caller }
    }

    /// Binding for a caller-only operation
    pub fn for_caller(caller: Principal) -> Self {
        Self::Caller { caller }
    }

    /// The asset this context is scoped to, if any
    pub fn asset(&self) -> Option<&AssetId> {
        match self {
            Self::Asset { asset, .. } => Some(asset),
            Self::Caller { .. } => None,
        }
    }

    /// The caller this context is scoped to
    pub fn caller(&self) -> &Principal {
        match self {
            Self::Asset { caller, .. } => caller,
            Self::Caller { caller } => caller,
        }
    }

    /// Canonical byte encoding mixed into key unwrapping
    ///
    /// Layout: a variant tag byte followed by each segment as a u32-LE
    /// length prefix plus the segment bytes. The length prefixes make the
    /// encoding injective: no two distinct contexts share an encoding,
    /// so `("ab", "c")` and `("a", "bc")` bind different keys.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.encoded_len());
        match self {
            Self::Asset { asset, caller } => {
                bytes.push(TAG_ASSET);
                push_segment(&mut bytes, asset.as_bytes());
                push_segment(&mut bytes, caller.as_bytes());
            }
            Self::Caller { caller } => {
                bytes.push(TAG_CALLER);
                push_segment(&mut bytes, caller.as_bytes());
            }
        }
        bytes
    }

    fn encoded_len(&self) -> usize {
        match self {
            Self::Asset { asset, caller } => 1 + 4 + asset.as_bytes().len() + 4 + caller.as_bytes().len(),
            Self::Caller { caller } => 1 + 4 + caller.as_bytes().len(),
        }
    }
}

fn push_segment(bytes: &mut Vec<u8>, segment: &[u8]) {
    // Segments come from identifiers capped at MAX_IDENTIFIER_BYTES, so
    // the cast is exact.
    bytes.extend_from_slice(&(segment.len() as u32).to_le_bytes());
    bytes.extend_from_slice(segment);
}

impl std::fmt::Display for BindingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Asset { asset, caller } => write!(f, "asset:{}@{}", asset, caller),
            Self::Caller { caller } => write!(f, "caller:{}", caller),
        }
    }
}
