//! Key-derivation collaborator interface
//!
//! The key-derivation service is the remote party that holds per-asset key
//! shares. Sessions only ever see it through [`KeyDerivationService`]: they
//! send a transport public key and a binding context, and get back
//! hex-encoded wrapped material plus the verification key to check it
//! against. The service never sees a payload key and the session never sees
//! a raw share outside the unwrap.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use amber_core::{AssetId, BindingContext};
use amber_crypto::{PublicKey, StaticSecret, WrappedKeyMaterial};

use crate::error::CollaboratorError;

/// Remote key-derivation service as seen by a session
///
/// Both responses are hex strings because that is what the wire carries;
/// decoding and validation happen on the session side, fail-closed.
#[async_trait]
pub trait KeyDerivationService: Send + Sync {
    /// Request key material for `binding`, sealed to `transport_public`
    ///
    /// Returns the hex-encoded wrapped ciphertext. The material is only
    /// usable by the holder of the matching transport secret, and only
    /// under the exact binding context it was issued for.
    async fn wrapped_key(
        &self,
        binding: &BindingContext,
        transport_public: &[u8; 32],
    ) -> Result<String, CollaboratorError>;

    /// Fetch the hex-encoded verification key for `asset`
    async fn verification_key(&self, asset: &AssetId) -> Result<String, CollaboratorError>;
}

/// In-process key-derivation service for tests and demos
///
/// Derives every scalar and key share deterministically from a master seed,
/// so independent sessions against the same mock agree on per-asset keys
/// the way they would against a real service. Call counters and the
/// availability switch let tests assert exactly which steps ran.
#[derive(Debug)]
pub struct MockKeyService {
    master_seed: [u8; 32],
    available: bool,
    response_delay: Option<Duration>,
    pinned_binding: Option<BindingContext>,
    wrapped_key_calls: AtomicUsize,
    verification_key_calls: AtomicUsize,
}

impl MockKeyService {
    pub fn new(master_seed: [u8; 32]) -> Self {
        Self {
            master_seed,
            available: true,
            response_delay: None,
            pinned_binding: None,
            wrapped_key_calls: AtomicUsize::new(0),
            verification_key_calls: AtomicUsize::new(0),
        }
    }

    /// Simulate an outage (or recovery) of the service
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Delay every response, for timeout and cancellation tests
    pub fn set_response_delay(&mut self, delay: Duration) {
        self.response_delay = Some(delay);
    }

    /// Issue all wrapped material for `binding` regardless of what callers
    /// request
    ///
    /// Models a confused or hostile service handing out material minted for
    /// a different asset or caller. Unwraps against any other binding must
    /// fail.
    pub fn pin_binding(&mut self, binding: BindingContext) {
        self.pinned_binding = Some(binding);
    }

    /// Number of wrapped-key requests observed
    pub fn wrapped_key_calls(&self) -> usize {
        self.wrapped_key_calls.load(Ordering::SeqCst)
    }

    /// Number of verification-key fetches observed
    pub fn verification_key_calls(&self) -> usize {
        self.verification_key_calls.load(Ordering::SeqCst)
    }

    /// Scalar for a sealing scope, derived from the master seed
    fn scope_secret(&self, scope: &[u8]) -> StaticSecret {
        let mut material = Vec::with_capacity(self.master_seed.len() + scope.len());
        material.extend_from_slice(&self.master_seed);
        material.extend_from_slice(scope);
        StaticSecret::from(blake3::derive_key("amber mock key service scalar v1", &material))
    }

    /// Key share for a binding context, derived from the master seed
    fn share_for(&self, binding: &BindingContext) -> [u8; 32] {
        let binding_bytes = binding.to_bytes();
        let mut material = Vec::with_capacity(self.master_seed.len() + binding_bytes.len());
        material.extend_from_slice(&self.master_seed);
        material.extend_from_slice(&binding_bytes);
        blake3::derive_key("amber mock key share v1", &material)
    }

    /// The scope a binding seals under: the asset when present, else the
    /// caller
    fn scope_for(binding: &BindingContext) -> &[u8] {
        match binding.asset() {
            Some(asset) => asset.as_bytes(),
            None => binding.caller().as_bytes(),
        }
    }

    async fn pause(&self) {
        if let Some(delay) = self.response_delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn check_available(&self) -> Result<(), CollaboratorError> {
        if self.available {
            Ok(())
        } else {
            Err(CollaboratorError::new("key derivation service unreachable"))
        }
    }
}

#[async_trait]
impl KeyDerivationService for MockKeyService {
    async fn wrapped_key(
        &self,
        binding: &BindingContext,
        transport_public: &[u8; 32],
    ) -> Result<String, CollaboratorError> {
        self.wrapped_key_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.check_available()?;

        let issued_for = self.pinned_binding.as_ref().unwrap_or(binding);
        let share = self.share_for(issued_for);
        let secret = self.scope_secret(Self::scope_for(issued_for));
        let recipient = PublicKey::from(*transport_public);

        let wrapped = WrappedKeyMaterial::seal(&share, &secret, &recipient, issued_for)
            .map_err(|e| CollaboratorError::new(format!("key wrap failed: {e}")))?;

        debug!(binding = %issued_for, "Issued wrapped key material");
        Ok(wrapped.ciphertext_hex())
    }

    async fn verification_key(&self, asset: &AssetId) -> Result<String, CollaboratorError> {
        self.verification_key_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.check_available()?;

        let public = PublicKey::from(&self.scope_secret(asset.as_bytes()));
        Ok(hex::encode(public.as_bytes()))
    }
}
