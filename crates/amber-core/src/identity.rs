//! Asset and caller identifiers
//!
//! Both identifiers are opaque strings assigned outside this crate:
//! [`AssetId`] by the record-owning collaborator at asset creation time,
//! [`Principal`] by the hosting environment's authentication layer.
//! Amber never parses them; it only binds key material to them.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::error::IdentityError;

/// Upper bound on identifier length in bytes
///
/// Binding-context encodings carry each identifier behind a u32 length
/// prefix; the bound keeps that prefix exact.
pub const MAX_IDENTIFIER_BYTES: usize = 1024;

/// Opaque identifier for one encrypted data object
///
/// Assigned once at creation by the record collaborator and immutable
/// thereafter. All key derivation and all ciphertext for an asset are
/// bound to this identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    /// Create an asset identifier; rejects the empty string and anything
    /// longer than [`MAX_IDENTIFIER_BYTES`]
    pub fn new(id: impl Into<String>) -> Result<Self, IdentityError> {
        let id = id.into();
        if id.is_empty() {
            return Err(IdentityError::Empty("asset"));
        }
        if id.len() > MAX_IDENTIFIER_BYTES {
            return Err(IdentityError::TooLong("asset"));
        }
        Ok(Self(id))
    }

    /// The identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier bytes used for key binding
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque caller identity supplied by the hosting environment
///
/// Amber treats it as an authenticated fact: whoever invokes a session
/// presents the principal the environment vouched for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    /// Create a principal; rejects the empty string and anything longer
    /// than [`MAX_IDENTIFIER_BYTES`]
    pub fn new(id: impl Into<String>) -> Result<Self, IdentityError> {
        let id = id.into();
        if id.is_empty() {
            return Err(IdentityError::Empty("principal"));
        }
        if id.len() > MAX_IDENTIFIER_BYTES {
            return Err(IdentityError::TooLong("principal"));
        }
        Ok(Self(id))
    }

    /// The identity as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identity bytes used for key binding
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_id_creation() {
        assert!(AssetId::new("asset-42").is_ok());
        assert!(AssetId::new("").is_err());
    }

    #[test]
    fn test_principal_creation() {
        assert!(Principal::new("principal-A").is_ok());
        assert!(Principal::new("").is_err());
    }

    #[test]
    fn test_identifier_length_bound() {
        let longest = "a".repeat(MAX_IDENTIFIER_BYTES);
        assert!(AssetId::new(longest.clone()).is_ok());
        assert!(Principal::new(longest).is_ok());

        let oversized = "a".repeat(MAX_IDENTIFIER_BYTES + 1);
        assert!(matches!(
            AssetId::new(oversized.clone()),
            Err(IdentityError::TooLong("asset"))
        ));
        assert!(matches!(
            Principal::new(oversized),
            Err(IdentityError::TooLong("principal"))
        ));
    }

    #[test]
    fn test_display_roundtrip() {
        let asset = AssetId::new("asset-42").unwrap();
        assert_eq!(format!("{}", asset), "asset-42");
        assert_eq!(asset.as_str(), "asset-42");

        let caller = Principal::new("principal-A").unwrap();
        assert_eq!(format!("{}", caller), "principal-A");
    }

    #[test]
    fn test_serde_transparent() {
        let asset = AssetId::new("asset-42").unwrap();
        let json = serde_json::to_string(&asset).unwrap();
        assert_eq!(json, "\"asset-42\"");

        let parsed: AssetId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, asset);
    }
}
