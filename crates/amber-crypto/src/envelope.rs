//! Key wrapping and unwrapping
//!
//! The key-derivation service never transmits a raw symmetric key. It seals
//! a per-context key share to the caller's single-use transport public key;
//! the caller unwraps it locally. Both halves of the envelope live here so
//! the contract is specified and tested in one place: the service side is
//! [`WrappedKeyMaterial::seal`], the client side is [`KeyUnwrapper::unwrap`].
//!
//! The construction is X25519 key agreement, HKDF-SHA256 to a key-encryption
//! key salted with the verification key, then AES-256-GCM over the share
//! with the binding context as associated data. A mismatched verification
//! key or binding context changes the key-encryption key or the associated
//! data, so the authentication tag fails and the unwrap fails closed.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit, Payload},
};
use hkdf::Hkdf;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use x25519_dalek::{PublicKey, SharedSecret, StaticSecret};
use zeroize::Zeroize;

use amber_core::BindingContext;

use crate::cipher::{IV_SIZE, KEY_SIZE, SymmetricKey, TAG_SIZE};
use crate::error::{CryptoError, CryptoResult};
use crate::transport::TransportKeyPair;

/// Domain separator naming the downstream use of unwrapped keys
///
/// Mixed into the final key derivation; not a secret.
pub const KEY_DOMAIN_TAG: &[u8] = b"aes-256-gcm";

/// HKDF info prefix for the key-encryption key
const WRAP_INFO: &[u8] = b"amber-key-wrap-v1";

/// Wrapped key material returned by the key-derivation collaborator
///
/// Assembled from two collaborator responses: the sealed ciphertext and the
/// verification key, both hex-encoded on the wire. Untrusted until an
/// unwrap succeeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrappedKeyMaterial {
    /// Sealed key share: IV || AEAD ciphertext with tag
    pub ciphertext: Vec<u8>,
    /// Public key identifying the sealing context
    pub verification_key: [u8; 32],
}

impl WrappedKeyMaterial {
    /// Assemble from the hex encodings used at the collaborator boundary
    ///
    /// Accepts an optional `0x` prefix on either value. Any decoding
    /// problem is a protocol mismatch and fails the operation.
    pub fn from_hex(ciphertext_hex: &str, verification_key_hex: &str) -> CryptoResult<Self> {
        let ciphertext = decode_hex("wrapped key ciphertext", ciphertext_hex)?;
        let vk_bytes = decode_hex("verification key", verification_key_hex)?;

        let verification_key: [u8; 32] = vk_bytes.try_into().map_err(|v: Vec<u8>| {
            CryptoError::MalformedInput(format!(
                "verification key: expected 32 bytes, got {}",
                v.len()
            ))
        })?;

        Ok(Self {
            ciphertext,
            verification_key,
        })
    }

    /// Hex encoding of the sealed ciphertext
    pub fn ciphertext_hex(&self) -> String {
        hex::encode(&self.ciphertext)
    }

    /// Hex encoding of the verification key
    pub fn verification_key_hex(&self) -> String {
        hex::encode(self.verification_key)
    }

    /// Seal a key share to a transport public key (service side)
    ///
    /// `service_secret` is the sealing context's keypair; its public half
    /// becomes the verification key the client checks against. The binding
    /// context is authenticated as associated data.
    pub fn seal(
        share: &[u8; KEY_SIZE],
        service_secret: &StaticSecret,
        transport_public: &PublicKey,
        binding: &BindingContext,
    ) -> CryptoResult<Self> {
        let binding_bytes = binding.to_bytes();
        let verification_key = PublicKey::from(service_secret);

        let shared = service_secret.diffie_hellman(transport_public);
        let mut kek = derive_kek(&shared, &verification_key, &binding_bytes)?;

        let cipher = Aes256Gcm::new_from_slice(&kek)
            .map_err(|e| CryptoError::CryptoFailure(e.to_string()))?;
        kek.zeroize();

        let mut iv = [0u8; IV_SIZE];
        getrandom::getrandom(&mut iv)
            .map_err(|e| CryptoError::EntropyFailure(e.to_string()))?;
        let nonce = Nonce::from_slice(&iv);

        let sealed = cipher
            .encrypt(
                nonce,
                Payload {
                    msg: share,
                    aad: &binding_bytes,
                },
            )
            .map_err(|e| CryptoError::CryptoFailure(e.to_string()))?;

        let mut ciphertext = Vec::with_capacity(IV_SIZE + sealed.len());
        ciphertext.extend_from_slice(&iv);
        ciphertext.extend_from_slice(&sealed);

        Ok(Self {
            ciphertext,
            verification_key: verification_key.to_bytes(),
        })
    }
}

/// Recovers symmetric keys from wrapped material
pub struct KeyUnwrapper;

impl KeyUnwrapper {
    /// Unwrap a key share and derive the payload key, consuming the
    /// transport keypair
    ///
    /// Deterministic given identical inputs. Fails closed with
    /// `UnwrapFailed` when the verification key does not match the sealing
    /// context or the binding context differs from the one the material was
    /// issued under; no fallback key is ever substituted. `domain_tag`
    /// separates downstream uses of the derived key (see
    /// [`KEY_DOMAIN_TAG`]).
    pub fn unwrap(
        transport: TransportKeyPair,
        wrapped: &WrappedKeyMaterial,
        binding: &BindingContext,
        domain_tag: &[u8],
    ) -> CryptoResult<SymmetricKey> {
        if wrapped.ciphertext.len() < IV_SIZE + TAG_SIZE {
            return Err(CryptoError::MalformedInput(format!(
                "wrapped key ciphertext: expected at least {} bytes, got {}",
                IV_SIZE + TAG_SIZE,
                wrapped.ciphertext.len()
            )));
        }

        let binding_bytes = binding.to_bytes();
        let verification_key = PublicKey::from(wrapped.verification_key);

        let shared = transport.agree(&verification_key);
        if !shared.was_contributory() {
            return Err(CryptoError::UnwrapFailed(
                "non-contributory verification key".to_string(),
            ));
        }

        let mut kek = derive_kek(&shared, &verification_key, &binding_bytes)?;
        let cipher = Aes256Gcm::new_from_slice(&kek)
            .map_err(|e| CryptoError::CryptoFailure(e.to_string()))?;
        kek.zeroize();

        let nonce = Nonce::from_slice(&wrapped.ciphertext[..IV_SIZE]);
        let mut share = cipher
            .decrypt(
                nonce,
                Payload {
                    msg: &wrapped.ciphertext[IV_SIZE..],
                    aad: &binding_bytes,
                },
            )
            .map_err(|_| {
                CryptoError::UnwrapFailed("verification or binding mismatch".to_string())
            })?;

        if share.len() != KEY_SIZE {
            share.zeroize();
            return Err(CryptoError::UnwrapFailed(format!(
                "unexpected key share length: {}",
                share.len()
            )));
        }

        let key = derive_payload_key(&share, domain_tag, &binding_bytes)?;
        share.zeroize();

        Ok(key)
    }
}

/// Key-encryption key: HKDF over the key agreement, salted with the
/// verification key so material sealed by one context never decrypts under
/// another
fn derive_kek(
    shared: &SharedSecret,
    verification_key: &PublicKey,
    binding_bytes: &[u8],
) -> CryptoResult<[u8; KEY_SIZE]> {
    let hk = Hkdf::<Sha256>::new(Some(verification_key.as_bytes()), shared.as_bytes());

    let mut info = Vec::with_capacity(WRAP_INFO.len() + binding_bytes.len());
    info.extend_from_slice(WRAP_INFO);
    info.extend_from_slice(binding_bytes);

    let mut kek = [0u8; KEY_SIZE];
    hk.expand(&info, &mut kek)
        .map_err(|e| CryptoError::CryptoFailure(e.to_string()))?;
    Ok(kek)
}

/// Final payload key: HKDF over the recovered share under the domain tag
fn derive_payload_key(
    share: &[u8],
    domain_tag: &[u8],
    binding_bytes: &[u8],
) -> CryptoResult<SymmetricKey> {
    let hk = Hkdf::<Sha256>::new(None, share);

    let mut info = Vec::with_capacity(domain_tag.len() + binding_bytes.len());
    info.extend_from_slice(domain_tag);
    info.extend_from_slice(binding_bytes);

    let mut key = [0u8; KEY_SIZE];
    hk.expand(&info, &mut key)
        .map_err(|e| CryptoError::CryptoFailure(e.to_string()))?;

    let symmetric = SymmetricKey::from_bytes(key);
    key.zeroize();
    Ok(symmetric)
}

fn decode_hex(what: &str, input: &str) -> CryptoResult<Vec<u8>> {
    let trimmed = input.strip_prefix("0x").unwrap_or(input);
    hex::decode(trimmed).map_err(|e| CryptoError::MalformedInput(format!("{}: {}", what, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use amber_core::{AssetId, Principal};
    use rand::RngCore;

    /// Generate a random StaticSecret (compatible with x25519-dalek's rand_core version)
    fn random_secret() -> StaticSecret {
        let mut bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut bytes);
        StaticSecret::from(bytes)
    }

    fn random_share() -> [u8; KEY_SIZE] {
        let mut bytes = [0u8; KEY_SIZE];
        rand::rng().fill_bytes(&mut bytes);
        bytes
    }

    fn binding(asset: &str, caller: &str) -> BindingContext {
        BindingContext::for_asset(
            AssetId::new(asset).unwrap(),
            Principal::new(caller).unwrap(),
        )
    }

    fn seal_for(
        share: &[u8; KEY_SIZE],
        service: &StaticSecret,
        transport: &TransportKeyPair,
        ctx: &BindingContext,
    ) -> WrappedKeyMaterial {
        WrappedKeyMaterial::seal(share, service, transport.public_key(), ctx).unwrap()
    }

    #[test]
    fn test_wrap_unwrap_roundtrip() {
        let service = random_secret();
        let share = random_share();
        let ctx = binding("asset-42", "principal-A");

        let transport = TransportKeyPair::generate().unwrap();
        let wrapped = seal_for(&share, &service, &transport, &ctx);

        let key = KeyUnwrapper::unwrap(transport, &wrapped, &ctx, KEY_DOMAIN_TAG).unwrap();
        assert_eq!(key.as_bytes().len(), KEY_SIZE);
    }

    #[test]
    fn test_same_context_recovers_same_key() {
        // Two independent operations against the same share and binding
        // must derive identical payload keys, or a sealed asset could
        // never be reopened
        let service = random_secret();
        let share = random_share();
        let ctx = binding("asset-42", "principal-A");

        let t1 = TransportKeyPair::generate().unwrap();
        let w1 = seal_for(&share, &service, &t1, &ctx);
        let k1 = KeyUnwrapper::unwrap(t1, &w1, &ctx, KEY_DOMAIN_TAG).unwrap();

        let t2 = TransportKeyPair::generate().unwrap();
        let w2 = seal_for(&share, &service, &t2, &ctx);
        let k2 = KeyUnwrapper::unwrap(t2, &w2, &ctx, KEY_DOMAIN_TAG).unwrap();

        assert_eq!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_unwrap_requires_matching_binding() {
        let service = random_secret();
        let share = random_share();
        let issued_for = binding("asset-42", "principal-A");

        let transport = TransportKeyPair::generate().unwrap();
        let wrapped = seal_for(&share, &service, &transport, &issued_for);

        let other_asset = binding("asset-43", "principal-A");
        let result = KeyUnwrapper::unwrap(transport, &wrapped, &other_asset, KEY_DOMAIN_TAG);
        assert!(matches!(result, Err(CryptoError::UnwrapFailed(_))));
    }

    #[test]
    fn test_unwrap_requires_matching_caller() {
        let service = random_secret();
        let share = random_share();
        let issued_for = binding("asset-42", "principal-A");

        let transport = TransportKeyPair::generate().unwrap();
        let wrapped = seal_for(&share, &service, &transport, &issued_for);

        let other_caller = binding("asset-42", "principal-B");
        let result = KeyUnwrapper::unwrap(transport, &wrapped, &other_caller, KEY_DOMAIN_TAG);
        assert!(matches!(result, Err(CryptoError::UnwrapFailed(_))));
    }

    #[test]
    fn test_unwrap_requires_matching_verification_key() {
        let service = random_secret();
        let imposter = random_secret();
        let share = random_share();
        let ctx = binding("asset-42", "principal-A");

        let transport = TransportKeyPair::generate().unwrap();
        let mut wrapped = seal_for(&share, &service, &transport, &ctx);

        // Swap in another service's verification key
        wrapped.verification_key = PublicKey::from(&imposter).to_bytes();

        let result = KeyUnwrapper::unwrap(transport, &wrapped, &ctx, KEY_DOMAIN_TAG);
        assert!(matches!(result, Err(CryptoError::UnwrapFailed(_))));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let service = random_secret();
        let share = random_share();
        let ctx = binding("asset-42", "principal-A");

        let transport = TransportKeyPair::generate().unwrap();
        let mut wrapped = seal_for(&share, &service, &transport, &ctx);

        let last = wrapped.ciphertext.len() - 1;
        wrapped.ciphertext[last] ^= 0x01;

        let result = KeyUnwrapper::unwrap(transport, &wrapped, &ctx, KEY_DOMAIN_TAG);
        assert!(matches!(result, Err(CryptoError::UnwrapFailed(_))));
    }

    #[test]
    fn test_truncated_wrapped_material() {
        let transport = TransportKeyPair::generate().unwrap();
        let ctx = binding("asset-42", "principal-A");

        let wrapped = WrappedKeyMaterial {
            ciphertext: vec![0u8; IV_SIZE + TAG_SIZE - 1],
            verification_key: [9u8; 32],
        };

        let result = KeyUnwrapper::unwrap(transport, &wrapped, &ctx, KEY_DOMAIN_TAG);
        assert!(matches!(result, Err(CryptoError::MalformedInput(_))));
    }

    #[test]
    fn test_domain_tag_separates_keys() {
        let service = random_secret();
        let share = random_share();
        let ctx = binding("asset-42", "principal-A");

        let t1 = TransportKeyPair::generate().unwrap();
        let w1 = seal_for(&share, &service, &t1, &ctx);
        let k1 = KeyUnwrapper::unwrap(t1, &w1, &ctx, KEY_DOMAIN_TAG).unwrap();

        let t2 = TransportKeyPair::generate().unwrap();
        let w2 = seal_for(&share, &service, &t2, &ctx);
        let k2 = KeyUnwrapper::unwrap(t2, &w2, &ctx, b"another-use").unwrap();

        assert_ne!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_caller_only_binding() {
        let service = random_secret();
        let share = random_share();
        let ctx = BindingContext::for_caller(Principal::new("principal-A").unwrap());

        let transport = TransportKeyPair::generate().unwrap();
        let wrapped = seal_for(&share, &service, &transport, &ctx);

        let key = KeyUnwrapper::unwrap(transport, &wrapped, &ctx, KEY_DOMAIN_TAG).unwrap();
        assert_eq!(key.as_bytes().len(), KEY_SIZE);
    }

    #[test]
    fn test_hex_boundary_roundtrip() {
        let service = random_secret();
        let share = random_share();
        let ctx = binding("asset-42", "principal-A");

        let transport = TransportKeyPair::generate().unwrap();
        let wrapped = seal_for(&share, &service, &transport, &ctx);

        let reassembled =
            WrappedKeyMaterial::from_hex(&wrapped.ciphertext_hex(), &wrapped.verification_key_hex())
                .unwrap();

        let key = KeyUnwrapper::unwrap(transport, &reassembled, &ctx, KEY_DOMAIN_TAG).unwrap();
        assert_eq!(key.as_bytes().len(), KEY_SIZE);
    }

    #[test]
    fn test_hex_prefix_accepted() {
        let wrapped = WrappedKeyMaterial {
            ciphertext: vec![0xAB; IV_SIZE + TAG_SIZE],
            verification_key: [0xCD; 32],
        };

        let prefixed = format!("0x{}", wrapped.ciphertext_hex());
        let parsed =
            WrappedKeyMaterial::from_hex(&prefixed, &wrapped.verification_key_hex()).unwrap();
        assert_eq!(parsed.ciphertext, wrapped.ciphertext);
    }

    #[test]
    fn test_malformed_hex_rejected() {
        // Odd length
        let result = WrappedKeyMaterial::from_hex("abc", &"00".repeat(32));
        assert!(matches!(result, Err(CryptoError::MalformedInput(_))));

        // Non-hex characters
        let result = WrappedKeyMaterial::from_hex("zzzz", &"00".repeat(32));
        assert!(matches!(result, Err(CryptoError::MalformedInput(_))));

        // Verification key of the wrong length
        let result = WrappedKeyMaterial::from_hex("00", "0011");
        assert!(matches!(result, Err(CryptoError::MalformedInput(_))));
    }
}
