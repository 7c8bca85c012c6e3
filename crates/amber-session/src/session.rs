//! Asset crypto session
//!
//! A session seals or opens exactly one payload for one asset on behalf of
//! one caller. It walks a fixed pipeline: generate a single-use transport
//! keypair, request wrapped key material from the key-derivation service,
//! unwrap it under this session's binding context, transform the payload,
//! and (when sealing) publish ciphertext to content storage before pointing
//! the asset record at it.
//!
//! Sessions are one-shot. `seal` and `open` consume the session, the
//! transport keypair is consumed by the unwrap, and the payload key is
//! dropped before the call returns. The first failing step terminates the
//! session; nothing is retried.

use tracing::{debug, instrument, warn};

use amber_core::{AssetId, BindingContext, Principal};
use amber_crypto::{
    EncryptedPayload, KEY_DOMAIN_TAG, KeyUnwrapper, SymmetricKey, TransportKeyPair,
    WrappedKeyMaterial,
};
use amber_storage::{ContentAddress, ContentStore};

use crate::collaborators::KeyDerivationService;
use crate::error::SessionResult;
use crate::record::{AssetRecord, RecordService};

/// Lifecycle of a session
///
/// Sessions move strictly forward. The first failure moves them to
/// `Failed` and nothing runs after that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Constructed, nothing has run
    Start,
    /// Single-use transport keypair generated
    TransportKeyReady,
    /// Wrapped key material received from the key-derivation service
    KeyMaterialRequested,
    /// Payload key recovered under this session's binding context
    KeyUnwrapped,
    /// Payload encrypted (seal) or decrypted (open)
    PayloadTransformed,
    /// Pipeline completed
    Done,
    /// Terminal failure, tagged with the error reason
    Failed(&'static str),
}

/// Returned by a successful seal
#[derive(Debug, Clone)]
pub struct SealReceipt {
    /// Asset whose record now points at the ciphertext
    pub asset: AssetId,
    /// Content address of the stored blob
    pub content_address: ContentAddress,
    /// Stored blob size: IV plus ciphertext plus tag
    pub ciphertext_len: usize,
}

/// Single-use encryption session for one asset
///
/// Borrows its collaborators so many sessions can share one set of
/// services. The asset must already exist at the record service before
/// sealing; sessions never mint identifiers.
pub struct AssetCryptoSession<'a, K, C, R> {
    keys: &'a K,
    content: &'a C,
    records: &'a R,
    asset: AssetId,
    binding: BindingContext,
    content_type: Option<String>,
    state: SessionState,
}

impl<'a, K, C, R> AssetCryptoSession<'a, K, C, R>
where
    K: KeyDerivationService,
    C: ContentStore,
    R: RecordService,
{
    /// Create a session for `asset` on behalf of `caller`
    pub fn new(
        keys: &'a K,
        content: &'a C,
        records: &'a R,
        asset: AssetId,
        caller: Principal,
    ) -> Self {
        let binding = BindingContext::for_asset(asset.clone(), caller);
        Self {
            keys,
            content,
            records,
            asset,
            binding,
            content_type: None,
            state: SessionState::Start,
        }
    }

    /// Declare the payload's media type, recorded alongside the content
    /// address on seal
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Binding context every key in this session is tied to
    pub fn binding(&self) -> &BindingContext {
        &self.binding
    }

    /// Encrypt `plaintext` and publish it as the asset's current content
    ///
    /// The record is updated only after the ciphertext is durably stored,
    /// so an interrupted seal leaves the previous record intact.
    #[instrument(skip(self, plaintext), fields(asset = %self.asset, bytes = plaintext.len()))]
    pub async fn seal(mut self, plaintext: &[u8]) -> SessionResult<SealReceipt> {
        let result = self.run_seal(plaintext).await;
        self.finish(result)
    }

    /// Fetch the blob at `address` and decrypt it under this session's
    /// binding context
    #[instrument(skip(self), fields(asset = %self.asset, address = %address))]
    pub async fn open(mut self, address: &ContentAddress) -> SessionResult<Vec<u8>> {
        let result = self.run_open(address).await;
        self.finish(result)
    }

    async fn run_seal(&mut self, plaintext: &[u8]) -> SessionResult<SealReceipt> {
        let transport = self.create_transport_key()?;
        let wrapped_hex = self.request_key_material(&transport).await?;
        let key = self.unwrap_key(transport, &wrapped_hex).await?;
        let payload = self.encrypt_payload(&key, plaintext)?;
        // Key material does not survive into the storage round-trip
        drop(key);
        self.publish(payload).await
    }

    async fn run_open(&mut self, address: &ContentAddress) -> SessionResult<Vec<u8>> {
        let transport = self.create_transport_key()?;
        let wrapped_hex = self.request_key_material(&transport).await?;
        let key = self.unwrap_key(transport, &wrapped_hex).await?;
        let blob = self.content.get(address).await?;
        let plaintext = self.decrypt_payload(&key, &blob)?;
        drop(key);
        self.advance(SessionState::Done);
        Ok(plaintext)
    }

    /// Generate the single-use transport keypair
    fn create_transport_key(&mut self) -> SessionResult<TransportKeyPair> {
        let transport = TransportKeyPair::generate()?;
        self.advance(SessionState::TransportKeyReady);
        Ok(transport)
    }

    /// Ask the key-derivation service for material sealed to the transport
    /// key
    async fn request_key_material(
        &mut self,
        transport: &TransportKeyPair,
    ) -> SessionResult<String> {
        let wrapped_hex = self
            .keys
            .wrapped_key(&self.binding, &transport.public_key_bytes())
            .await?;
        self.advance(SessionState::KeyMaterialRequested);
        Ok(wrapped_hex)
    }

    /// Fetch the verification key and unwrap the payload key, consuming
    /// the transport keypair
    async fn unwrap_key(
        &mut self,
        transport: TransportKeyPair,
        wrapped_hex: &str,
    ) -> SessionResult<SymmetricKey> {
        let verification_hex = self.keys.verification_key(&self.asset).await?;
        let wrapped = WrappedKeyMaterial::from_hex(wrapped_hex, &verification_hex)?;
        let key = KeyUnwrapper::unwrap(transport, &wrapped, &self.binding, KEY_DOMAIN_TAG)?;
        self.advance(SessionState::KeyUnwrapped);
        Ok(key)
    }

    fn encrypt_payload(
        &mut self,
        key: &SymmetricKey,
        plaintext: &[u8],
    ) -> SessionResult<EncryptedPayload> {
        let payload = key.encrypt(plaintext)?;
        self.advance(SessionState::PayloadTransformed);
        Ok(payload)
    }

    fn decrypt_payload(&mut self, key: &SymmetricKey, blob: &[u8]) -> SessionResult<Vec<u8>> {
        let plaintext = key.decrypt_blob(blob)?;
        self.advance(SessionState::PayloadTransformed);
        Ok(plaintext)
    }

    /// Store the ciphertext, then point the asset record at it
    async fn publish(&mut self, payload: EncryptedPayload) -> SessionResult<SealReceipt> {
        let blob = payload.to_bytes();
        let content_address = self.content.put(&blob).await?;
        debug!(address = %content_address, "Stored sealed payload");

        let mut record = AssetRecord::new(content_address);
        if let Some(content_type) = self.content_type.take() {
            record = record.with_content_type(content_type);
        }
        self.records.update_asset_record(&self.asset, record).await?;

        self.advance(SessionState::Done);
        Ok(SealReceipt {
            asset: self.asset.clone(),
            content_address,
            ciphertext_len: blob.len(),
        })
    }

    fn advance(&mut self, next: SessionState) {
        debug!(from = ?self.state, to = ?next, "Session advanced");
        self.state = next;
    }

    fn finish<T>(&mut self, result: SessionResult<T>) -> SessionResult<T> {
        if let Err(err) = &result {
            warn!(reason = err.reason(), error = %err, "Session failed");
            self.state = SessionState::Failed(err.reason());
        }
        result
    }
}
