// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory key material: the data-encryption key and recovery codes.

use std::fmt;

use lockbox_core::LockboxError;
use ring::digest;
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

use crate::crypto::{self, KEY_LEN};

/// The 32-byte data-encryption key protected by a key file.
///
/// Not `Clone`; zeroed on drop. Debug output never shows the key.
pub struct DataEncryptionKey {
    bytes: Zeroizing<[u8; KEY_LEN]>,
}

impl fmt::Debug for DataEncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataEncryptionKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

impl DataEncryptionKey {
    pub(crate) fn generate() -> Result<Self, LockboxError> {
        Ok(Self {
            bytes: crypto::generate_random_key()?,
        })
    }

    /// Adopt an authenticated unwrap result. A verified plaintext of the
    /// wrong size means the file was produced by something other than this
    /// vault.
    pub(crate) fn from_unwrapped(plaintext: Zeroizing<Vec<u8>>) -> Result<Self, LockboxError> {
        if plaintext.len() != KEY_LEN {
            return Err(LockboxError::MalformedRecord(format!(
                "wrapped key is {} bytes, expected {KEY_LEN}",
                plaintext.len()
            )));
        }
        let mut bytes = Zeroizing::new([0u8; KEY_LEN]);
        bytes.copy_from_slice(&plaintext);
        Ok(Self { bytes })
    }

    #[cfg(test)]
    pub(crate) fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self {
            bytes: Zeroizing::new(bytes),
        }
    }

    /// Borrow the raw key. Callers should keep the borrow short.
    pub fn expose(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    /// First 8 bytes of SHA-256 over the key, hex-encoded.
    ///
    /// Identifies a key across unlocks without revealing it.
    pub fn fingerprint(&self) -> String {
        let digest = digest::digest(&digest::SHA256, self.bytes.as_slice());
        hex::encode(&digest.as_ref()[..8])
    }

    /// Encrypt application data into an `iv ‖ tag ‖ ciphertext` blob.
    pub fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, LockboxError> {
        crypto::encrypt_payload(&self.bytes, data)
    }

    /// Decrypt a blob produced by [`DataEncryptionKey::encrypt`].
    pub fn decrypt(&self, blob: &[u8]) -> Result<Zeroizing<Vec<u8>>, LockboxError> {
        crypto::decrypt_payload(&self.bytes, blob)
    }
}

/// Length of a recovery code in random bytes (64 hex characters).
pub const RECOVERY_CODE_BYTES: usize = 32;

/// A one-time recovery code, shown to the operator once and never stored.
///
/// The hex text itself is the secret fed to Argon2id, exactly as the
/// operator will type it back in.
pub struct RecoveryCode(SecretString);

impl fmt::Debug for RecoveryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RecoveryCode([REDACTED])")
    }
}

impl RecoveryCode {
    pub(crate) fn generate() -> Result<Self, LockboxError> {
        let raw = Zeroizing::new(crypto::random_bytes::<RECOVERY_CODE_BYTES>()?);
        Ok(Self(SecretString::from(hex::encode(raw.as_slice()))))
    }

    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }

    /// The code as a secret suitable for [`crate::KeyFileService::unlock`].
    pub fn to_secret(&self) -> SecretString {
        SecretString::from(self.0.expose_secret().to_string())
    }
}
