//! Single-use transport keypairs
//!
//! A transport keypair exists to receive exactly one wrapped-key delivery.
//! The key-derivation service encrypts key material to the transport public
//! key; only the holder of the matching secret can recover it. Every
//! operation generates a fresh pair, and the ECDH step consumes it, so a
//! wrapped-key response can never be replayed against a later operation.

use x25519_dalek::{PublicKey, SharedSecret, StaticSecret};
use zeroize::Zeroize;

use crate::error::{CryptoError, CryptoResult};

/// Short-lived x25519 keypair, generated fresh per operation
///
/// The secret scalar is zeroized on drop. The ECDH step consumes the pair,
/// so a transport keypair cannot receive a second delivery.
pub struct TransportKeyPair {
    secret: StaticSecret,
    public: PublicKey,
}

impl TransportKeyPair {
    /// Generate a keypair from the operating system's entropy source
    ///
    /// The only failure mode is entropy exhaustion, which is fatal to the
    /// calling operation.
    pub fn generate() -> CryptoResult<Self> {
        let mut bytes = [0u8; 32];
        getrandom::getrandom(&mut bytes)
            .map_err(|e| CryptoError::EntropyFailure(e.to_string()))?;

        let secret = StaticSecret::from(bytes);
        bytes.zeroize();

        let public = PublicKey::from(&secret);
        Ok(Self { secret, public })
    }

    /// The public key the key-derivation service wraps material to
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Public key bytes for transmission to a collaborator
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.public.to_bytes()
    }

    /// Run the key agreement with the sender's public key, consuming the pair
    pub(crate) fn agree(self, their_public: &PublicKey) -> SharedSecret {
        self.secret.diffie_hellman(their_public)
    }
}
