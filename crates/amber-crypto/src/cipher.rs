//! Payload encryption
//!
//! AES-256-GCM authenticated encryption of asset payloads. The stored blob
//! is the 12-byte IV followed by ciphertext and tag, so a payload is
//! decryptable given only the symmetric key.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CryptoError, CryptoResult};

/// IV size for AES-256-GCM (12 bytes)
pub const IV_SIZE: usize = 12;

/// Authentication tag size appended to the ciphertext (16 bytes)
pub const TAG_SIZE: usize = 16;

/// Key size (32 bytes)
pub const KEY_SIZE: usize = 32;

/// Symmetric key for one asset payload
///
/// Produced by the key unwrap step, used for exactly one encrypt or
/// decrypt, then dropped. The bytes are zeroized on drop and there is no
/// way to generate a key locally outside of tests: keys exist only as the
/// output of unwrapping.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey {
    key: [u8; KEY_SIZE],
}

impl SymmetricKey {
    /// Create from raw key bytes
    pub fn from_bytes(key: [u8; KEY_SIZE]) -> Self {
        Self { key }
    }

    /// Raw key bytes (use with caution)
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }

    /// Encrypt a payload under this key
    ///
    /// Draws a fresh random IV for every call. Same plaintext encrypted
    /// twice yields different blobs.
    pub fn encrypt(&self, plaintext: &[u8]) -> CryptoResult<EncryptedPayload> {
        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|e| CryptoError::CryptoFailure(e.to_string()))?;

        let mut iv = [0u8; IV_SIZE];
        getrandom::getrandom(&mut iv)
            .map_err(|e| CryptoError::EntropyFailure(e.to_string()))?;
        let nonce = Nonce::from_slice(&iv);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| CryptoError::CryptoFailure(e.to_string()))?;

        Ok(EncryptedPayload { iv, ciphertext })
    }

    /// Decrypt a payload, verifying its authentication tag
    ///
    /// Tag mismatch fails; no partial or unauthenticated plaintext is ever
    /// returned.
    pub fn decrypt(&self, payload: &EncryptedPayload) -> CryptoResult<Vec<u8>> {
        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|e| CryptoError::CryptoFailure(e.to_string()))?;

        let nonce = Nonce::from_slice(&payload.iv);

        cipher
            .decrypt(nonce, payload.ciphertext.as_slice())
            .map_err(|_| CryptoError::DecryptionFailed("authentication tag mismatch".to_string()))
    }

    /// Decrypt from the wire framing (IV || ciphertext)
    pub fn decrypt_blob(&self, blob: &[u8]) -> CryptoResult<Vec<u8>> {
        let payload = EncryptedPayload::from_bytes(blob)?;
        self.decrypt(&payload)
    }
}

/// Encrypted payload with its IV
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedPayload {
    /// IV used for encryption
    pub iv: [u8; IV_SIZE],
    /// Ciphertext with the authentication tag appended
    pub ciphertext: Vec<u8>,
}

impl EncryptedPayload {
    /// Wire framing: IV || ciphertext
    ///
    /// This exact layout is the on-storage format; the decrypt path slices
    /// the first 12 bytes back off as the IV.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(IV_SIZE + self.ciphertext.len());
        bytes.extend_from_slice(&self.iv);
        bytes.extend_from_slice(&self.ciphertext);
        bytes
    }

    /// Parse from the wire framing (IV || ciphertext)
    pub fn from_bytes(blob: &[u8]) -> CryptoResult<Self> {
        if blob.len() < IV_SIZE {
            return Err(CryptoError::DecryptionFailed(format!(
                "blob too short for IV: expected at least {} bytes, got {}",
                IV_SIZE,
                blob.len()
            )));
        }

        let mut iv = [0u8; IV_SIZE];
        iv.copy_from_slice(&blob[..IV_SIZE]);

        Ok(Self {
            iv,
            ciphertext: blob[IV_SIZE..].to_vec(),
        })
    }

    /// Total blob size in bytes
    pub fn len(&self) -> usize {
        IV_SIZE + self.ciphertext.len()
    }

    /// True when the payload carries no ciphertext bytes at all
    pub fn is_empty(&self) -> bool {
        self.ciphertext.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    fn random_key() -> SymmetricKey {
        let mut bytes = [0u8; KEY_SIZE];
        rand::rng().fill_bytes(&mut bytes);
        SymmetricKey::from_bytes(bytes)
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = random_key();

        let plaintext = b"hello-health-xyz";
        let encrypted = key.encrypt(plaintext).unwrap();
        let decrypted = key.decrypt(&encrypted).unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_roundtrip_through_wire_framing() {
        let key = random_key();

        let plaintext = b"stored and fetched later";
        let blob = key.encrypt(plaintext).unwrap().to_bytes();

        let decrypted = key.decrypt_blob(&blob).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_empty_plaintext_roundtrip() {
        let key = random_key();

        let encrypted = key.encrypt(b"").unwrap();
        assert_eq!(encrypted.ciphertext.len(), TAG_SIZE);

        let decrypted = key.decrypt(&encrypted).unwrap();
        assert!(decrypted.is_empty());
    }

    #[test]
    fn test_large_payload_roundtrip() {
        let key = random_key();

        let mut plaintext = vec![0u8; 1024 * 1024];
        rand::rng().fill_bytes(&mut plaintext);

        let encrypted = key.encrypt(&plaintext).unwrap();
        let decrypted = key.decrypt(&encrypted).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_fresh_iv_per_encryption() {
        let key = random_key();

        let plaintext = b"same plaintext";
        let a = key.encrypt(plaintext).unwrap();
        let b = key.encrypt(plaintext).unwrap();

        assert_ne!(a.iv, b.iv);
        assert_ne!(a.ciphertext, b.ciphertext);

        assert_eq!(key.decrypt(&a).unwrap(), plaintext);
        assert_eq!(key.decrypt(&b).unwrap(), plaintext);
    }

    #[test]
    fn test_iv_uniqueness_over_many_encryptions() {
        use std::collections::HashSet;

        let key = random_key();
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let encrypted = key.encrypt(b"x").unwrap();
            assert!(seen.insert(encrypted.iv), "IV repeated under the same key");
        }
    }

    #[test]
    fn test_wrong_key_fails() {
        let key1 = random_key();
        let key2 = random_key();

        let encrypted = key1.encrypt(b"secret record").unwrap();
        let result = key2.decrypt(&encrypted);
        assert!(matches!(result, Err(CryptoError::DecryptionFailed(_))));
    }

    #[test]
    fn test_any_single_bit_flip_is_detected() {
        let key = random_key();
        let blob = key.encrypt(b"tamper target").unwrap().to_bytes();

        // Flip every bit of the ciphertext and tag portion in turn; each
        // corrupted blob must fail authentication
        for byte_idx in IV_SIZE..blob.len() {
            for bit in 0..8 {
                let mut corrupted = blob.clone();
                corrupted[byte_idx] ^= 1 << bit;
                let result = key.decrypt_blob(&corrupted);
                assert!(
                    matches!(result, Err(CryptoError::DecryptionFailed(_))),
                    "bit {} of byte {} survived tampering",
                    bit,
                    byte_idx
                );
            }
        }
    }

    #[test]
    fn test_flipped_iv_is_detected() {
        let key = random_key();
        let blob = key.encrypt(b"tamper target").unwrap().to_bytes();

        let mut corrupted = blob.clone();
        corrupted[0] ^= 0x01;
        assert!(key.decrypt_blob(&corrupted).is_err());
    }

    #[test]
    fn test_truncated_blob_fails() {
        let key = random_key();
        let blob = key.encrypt(b"short").unwrap().to_bytes();

        // Shorter than the IV
        assert!(matches!(
            key.decrypt_blob(&blob[..IV_SIZE - 1]),
            Err(CryptoError::DecryptionFailed(_))
        ));

        // IV intact but tag cut off
        assert!(matches!(
            key.decrypt_blob(&blob[..blob.len() - 1]),
            Err(CryptoError::DecryptionFailed(_))
        ));
    }

    #[test]
    fn test_payload_framing_roundtrip() {
        let payload = EncryptedPayload {
            iv: [7; IV_SIZE],
            ciphertext: vec![10, 20, 30, 40],
        };

        let bytes = payload.to_bytes();
        assert_eq!(bytes.len(), payload.len());

        let parsed = EncryptedPayload::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.iv, payload.iv);
        assert_eq!(parsed.ciphertext, payload.ciphertext);
    }
}
