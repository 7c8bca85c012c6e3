//! Asset record collaborator
//!
//! Asset records are the metadata half of a sealed asset: which content
//! address holds the current ciphertext, and what the plaintext's media
//! type is. The record service mints asset identifiers up front, so a
//! session always seals against an asset that already exists, and updates
//! the record only after the ciphertext is durably stored.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use amber_core::{AssetId, Principal};
use amber_storage::ContentAddress;

use crate::error::CollaboratorError;

/// Metadata stored against an asset after a successful seal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Address of the current ciphertext blob
    pub content_address: ContentAddress,
    /// Media type of the plaintext, when the caller declared one
    pub content_type: Option<String>,
    /// Milliseconds since the Unix epoch at record construction
    pub updated_at_millis: i64,
}

impl AssetRecord {
    pub fn new(content_address: ContentAddress) -> Self {
        Self {
            content_address,
            content_type: None,
            updated_at_millis: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Remote record service as seen by a session
#[async_trait]
pub trait RecordService: Send + Sync {
    /// Mint a placeholder asset owned by `owner`
    ///
    /// The returned identifier is stable from this point on; sealing never
    /// changes it, only the record behind it.
    async fn create_asset(&self, owner: &Principal) -> Result<AssetId, CollaboratorError>;

    /// Replace the record behind an existing asset
    ///
    /// Fails for identifiers that were never minted. Sessions call this
    /// last, after the ciphertext is stored, so a crash between the two
    /// steps leaves the old record intact rather than dangling.
    async fn update_asset_record(
        &self,
        asset: &AssetId,
        record: AssetRecord,
    ) -> Result<(), CollaboratorError>;
}

/// Entry held per minted asset
#[derive(Debug, Clone)]
struct AssetEntry {
    owner: Principal,
    record: Option<AssetRecord>,
}

/// In-process record service for tests and demos
#[derive(Debug, Default)]
pub struct MockRecordService {
    assets: DashMap<AssetId, AssetEntry>,
    next_id: AtomicUsize,
    update_count: AtomicUsize,
    unavailable: bool,
}

impl MockRecordService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage (or recovery) of the service
    pub fn set_available(&mut self, available: bool) {
        self.unavailable = !available;
    }

    /// Adopt an asset minted elsewhere, leaving the serial counter alone
    pub fn register_asset(&self, asset: AssetId, owner: Principal) {
        self.assets.insert(asset, AssetEntry { owner, record: None });
    }

    /// Number of assets minted so far
    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    /// Number of record updates observed
    pub fn update_count(&self) -> usize {
        self.update_count.load(Ordering::SeqCst)
    }

    /// Current record for an asset, if one was ever published
    pub fn record(&self, asset: &AssetId) -> Option<AssetRecord> {
        self.assets.get(asset).and_then(|entry| entry.record.clone())
    }

    /// Owner of a minted asset
    pub fn owner(&self, asset: &AssetId) -> Option<Principal> {
        self.assets.get(asset).map(|entry| entry.owner.clone())
    }

    fn check_available(&self) -> Result<(), CollaboratorError> {
        if self.unavailable {
            Err(CollaboratorError::new("record service unreachable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RecordService for MockRecordService {
    async fn create_asset(&self, owner: &Principal) -> Result<AssetId, CollaboratorError> {
        self.check_available()?;

        let serial = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let asset = AssetId::new(format!("asset-{serial}"))
            .map_err(|e| CollaboratorError::new(e.to_string()))?;

        self.assets.insert(
            asset.clone(),
            AssetEntry {
                owner: owner.clone(),
                record: None,
            },
        );

        debug!(asset = %asset, owner = %owner, "Minted placeholder asset");
        Ok(asset)
    }

    async fn update_asset_record(
        &self,
        asset: &AssetId,
        record: AssetRecord,
    ) -> Result<(), CollaboratorError> {
        self.check_available()?;

        match self.assets.get_mut(asset) {
            Some(mut entry) => {
                entry.record = Some(record);
                self.update_count.fetch_add(1, Ordering::SeqCst);
                debug!(asset = %asset, "Updated asset record");
                Ok(())
            }
            None => Err(CollaboratorError::new(format!("unknown asset: {asset}"))),
        }
    }
}
