// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AES-256-GCM envelope operations.
//!
//! Two shapes share one primitive:
//! - key wrapping keeps IV, tag and ciphertext as separate fields so they can
//!   be stored side by side in the key file;
//! - payload encryption emits one self-describing blob:
//!
//! ```text
//! [ iv (12 bytes) ][ tag (16 bytes) ][ ciphertext ]
//! ```
//!
//! Every seal draws a fresh random 96-bit IV from the system CSPRNG. Nothing
//! in this module touches storage.

use lockbox_core::LockboxError;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

/// Key length in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// IV length in bytes (96 bits).
pub const IV_LEN: usize = 12;

/// Authentication tag length in bytes (128 bits).
pub const TAG_LEN: usize = 16;

/// Smallest valid payload blob: IV and tag around an empty ciphertext.
pub const PAYLOAD_OVERHEAD: usize = IV_LEN + TAG_LEN;

/// Output of [`wrap_key`]. All three parts are needed to unwrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedKey {
    pub ciphertext: Vec<u8>,
    pub iv: [u8; IV_LEN],
    pub tag: [u8; TAG_LEN],
}

/// Fill a fixed-size array from the system CSPRNG.
pub fn random_bytes<const N: usize>() -> Result<[u8; N], LockboxError> {
    let rng = SystemRandom::new();
    let mut buf = [0u8; N];
    rng.fill(&mut buf).map_err(|_| LockboxError::Randomness)?;
    Ok(buf)
}

/// Generate a random 32-byte key suitable for AES-256-GCM.
pub fn generate_random_key() -> Result<Zeroizing<[u8; KEY_LEN]>, LockboxError> {
    random_bytes().map(Zeroizing::new)
}

fn aead_key(key: &[u8; KEY_LEN]) -> Result<LessSafeKey, LockboxError> {
    let unbound = UnboundKey::new(&AES_256_GCM, key)
        .map_err(|_| LockboxError::Internal("failed to create AES-256-GCM key".to_string()))?;
    Ok(LessSafeKey::new(unbound))
}

/// Encrypt `plaintext` under `key` with a fresh IV, tag kept separate.
fn seal_detached(
    key: &[u8; KEY_LEN],
    plaintext: &[u8],
) -> Result<(Vec<u8>, [u8; IV_LEN], [u8; TAG_LEN]), LockboxError> {
    let key = aead_key(key)?;
    let iv: [u8; IV_LEN] = random_bytes()?;

    // Holds plaintext until sealing succeeds; zeroed if it fails.
    let mut in_out = Zeroizing::new(plaintext.to_vec());
    let tag = key
        .seal_in_place_separate_tag(
            Nonce::assume_unique_for_key(iv),
            Aad::empty(),
            &mut *in_out,
        )
        .map_err(|_| LockboxError::Internal("AES-256-GCM encryption failed".to_string()))?;

    let mut tag_bytes = [0u8; TAG_LEN];
    tag_bytes.copy_from_slice(tag.as_ref());
    Ok((std::mem::take(&mut *in_out), iv, tag_bytes))
}

/// Verify and decrypt. Nothing is returned unless the tag verifies; the
/// working buffer is zeroed on both paths.
fn open_detached(
    key: &[u8; KEY_LEN],
    iv: &[u8; IV_LEN],
    tag: &[u8; TAG_LEN],
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>, LockboxError> {
    let key = aead_key(key)?;

    let mut in_out = Zeroizing::new(Vec::with_capacity(ciphertext.len() + TAG_LEN));
    in_out.extend_from_slice(ciphertext);
    in_out.extend_from_slice(tag);

    let plaintext_len = key
        .open_in_place(Nonce::assume_unique_for_key(*iv), Aad::empty(), &mut in_out)
        .map_err(|_| LockboxError::Authentication)?
        .len();

    in_out.truncate(plaintext_len);
    Ok(in_out)
}

/// Wrap a short fixed-length secret (the DEK) under a derived key.
///
/// The ciphertext has the same length as `plaintext_key`.
pub fn wrap_key(derived_key: &[u8; KEY_LEN], plaintext_key: &[u8]) -> Result<SealedKey, LockboxError> {
    let (ciphertext, iv, tag) = seal_detached(derived_key, plaintext_key)?;
    Ok(SealedKey { ciphertext, iv, tag })
}

/// Unwrap key material. Fails with [`LockboxError::Authentication`] on any
/// tag mismatch and releases no plaintext bytes in that case.
pub fn unwrap_key(
    derived_key: &[u8; KEY_LEN],
    ciphertext: &[u8],
    iv: &[u8; IV_LEN],
    tag: &[u8; TAG_LEN],
) -> Result<Zeroizing<Vec<u8>>, LockboxError> {
    open_detached(derived_key, iv, tag, ciphertext)
}

/// Encrypt arbitrary-length data into an `iv ‖ tag ‖ ciphertext` blob.
pub fn encrypt_payload(dek: &[u8; KEY_LEN], data: &[u8]) -> Result<Vec<u8>, LockboxError> {
    let (ciphertext, iv, tag) = seal_detached(dek, data)?;

    let mut blob = Vec::with_capacity(PAYLOAD_OVERHEAD + ciphertext.len());
    blob.extend_from_slice(&iv);
    blob.extend_from_slice(&tag);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Decrypt a blob produced by [`encrypt_payload`].
///
/// Truncated blobs are reported as authentication failures, the same as
/// tampered ones.
pub fn decrypt_payload(dek: &[u8; KEY_LEN], blob: &[u8]) -> Result<Zeroizing<Vec<u8>>, LockboxError> {
    if blob.len() < PAYLOAD_OVERHEAD {
        return Err(LockboxError::Authentication);
    }

    let (iv, rest) = blob.split_at(IV_LEN);
    let (tag, ciphertext) = rest.split_at(TAG_LEN);
    let iv: [u8; IV_LEN] = iv.try_into().map_err(|_| LockboxError::Authentication)?;
    let tag: [u8; TAG_LEN] = tag.try_into().map_err(|_| LockboxError::Authentication)?;

    open_detached(dek, &iv, &tag, ciphertext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn wrap_unwrap_roundtrip() {
        let kek = generate_random_key().unwrap();
        let dek = generate_random_key().unwrap();

        let sealed = wrap_key(&kek, &*dek).unwrap();
        let unwrapped = unwrap_key(&kek, &sealed.ciphertext, &sealed.iv, &sealed.tag).unwrap();

        assert_eq!(unwrapped.as_slice(), dek.as_slice());
    }

    #[test]
    fn wrapped_ciphertext_has_plaintext_length() {
        let kek = generate_random_key().unwrap();
        let sealed = wrap_key(&kek, &[0xAB; KEY_LEN]).unwrap();
        assert_eq!(sealed.ciphertext.len(), KEY_LEN);
    }

    #[test]
    fn sealed_output_does_not_leak_the_key() {
        let kek = [3u8; KEY_LEN];
        let dek = [0xABu8; KEY_LEN];
        let sealed = wrap_key(&kek, &dek).unwrap();
        assert_ne!(sealed.ciphertext.as_slice(), &dek[..]);
        assert!(sealed.ciphertext.iter().filter(|&&b| b == 0xAB).count() < KEY_LEN / 2);
    }

    #[test]
    fn unwrap_with_wrong_key_fails() {
        let kek = generate_random_key().unwrap();
        let other = generate_random_key().unwrap();
        let sealed = wrap_key(&kek, b"0123456789abcdef0123456789abcdef").unwrap();

        let result = unwrap_key(&other, &sealed.ciphertext, &sealed.iv, &sealed.tag);
        assert!(matches!(result, Err(LockboxError::Authentication)));
    }

    #[test]
    fn every_bit_flip_in_wrap_is_detected() {
        let kek = generate_random_key().unwrap();
        let sealed = wrap_key(&kek, &[7u8; KEY_LEN]).unwrap();

        for byte in 0..sealed.ciphertext.len() {
            let mut ct = sealed.ciphertext.clone();
            ct[byte] ^= 0x80;
            assert!(unwrap_key(&kek, &ct, &sealed.iv, &sealed.tag).is_err());
        }
        for byte in 0..IV_LEN {
            let mut iv = sealed.iv;
            iv[byte] ^= 0x01;
            assert!(unwrap_key(&kek, &sealed.ciphertext, &iv, &sealed.tag).is_err());
        }
        for byte in 0..TAG_LEN {
            let mut tag = sealed.tag;
            tag[byte] ^= 0x10;
            assert!(unwrap_key(&kek, &sealed.ciphertext, &sealed.iv, &tag).is_err());
        }
    }

    #[test]
    fn payload_roundtrip_hello() {
        let dek = generate_random_key().unwrap();
        let blob = encrypt_payload(&dek, b"hello").unwrap();
        assert_eq!(blob.len(), PAYLOAD_OVERHEAD + 5);
        assert_eq!(decrypt_payload(&dek, &blob).unwrap().as_slice(), b"hello");
    }

    #[test]
    fn empty_payload_roundtrip() {
        let dek = generate_random_key().unwrap();
        let blob = encrypt_payload(&dek, b"").unwrap();
        assert_eq!(blob.len(), PAYLOAD_OVERHEAD);
        assert!(decrypt_payload(&dek, &blob).unwrap().is_empty());
    }

    #[test]
    fn tampered_payload_fails() {
        let dek = generate_random_key().unwrap();
        let mut blob = encrypt_payload(&dek, b"hello").unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0x01;
        assert!(matches!(
            decrypt_payload(&dek, &blob),
            Err(LockboxError::Authentication)
        ));
    }

    #[test]
    fn truncated_payload_fails() {
        let dek = generate_random_key().unwrap();
        let blob = encrypt_payload(&dek, b"hello").unwrap();
        for len in [0, 1, IV_LEN, PAYLOAD_OVERHEAD - 1] {
            assert!(matches!(
                decrypt_payload(&dek, &blob[..len]),
                Err(LockboxError::Authentication)
            ));
        }
    }

    #[test]
    fn ivs_are_never_reused_across_samples() {
        let key = generate_random_key().unwrap();
        let mut seen = HashSet::new();
        for _ in 0..512 {
            let sealed = wrap_key(&key, &[0u8; KEY_LEN]).unwrap();
            assert!(seen.insert(sealed.iv), "IV reused");
            let blob = encrypt_payload(&key, b"same input").unwrap();
            let iv: [u8; IV_LEN] = blob[..IV_LEN].try_into().unwrap();
            assert!(seen.insert(iv), "IV reused");
        }
    }

    #[test]
    fn same_plaintext_encrypts_differently() {
        let dek = generate_random_key().unwrap();
        let a = encrypt_payload(&dek, b"same input twice").unwrap();
        let b = encrypt_payload(&dek, b"same input twice").unwrap();
        assert_ne!(a, b);
    }

    proptest! {
        #[test]
        fn payload_roundtrips_for_any_data(data in proptest::collection::vec(any::<u8>(), 0..2048)) {
            let dek = generate_random_key().unwrap();
            let blob = encrypt_payload(&dek, &data).unwrap();
            let decrypted = decrypt_payload(&dek, &blob).unwrap();
            prop_assert_eq!(decrypted.as_slice(), data.as_slice());
        }

        #[test]
        fn any_single_bit_flip_is_rejected(
            data in proptest::collection::vec(any::<u8>(), 0..256),
            position in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let dek = generate_random_key().unwrap();
            let mut blob = encrypt_payload(&dek, &data).unwrap();
            let i = position.index(blob.len());
            blob[i] ^= 1 << bit;
            prop_assert!(matches!(decrypt_payload(&dek, &blob), Err(LockboxError::Authentication)));
        }
    }
}
