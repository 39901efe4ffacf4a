// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-disk key file schema.
//!
//! ```json
//! {
//!   "identity": "alice",
//!   "primaryWrap":  { "ciphertext": "..", "salt": "..", "iv": "..", "tag": "..", "version": 1 },
//!   "recoveryWrap": { "ciphertext": "..", "salt": "..", "iv": "..", "tag": "..", "version": 1 }
//! }
//! ```
//!
//! All binary fields are lowercase hex. `recoveryWrap` is omitted when the
//! record was set up without a recovery path, and `identity` is `null` for
//! the unnamed single-tenant record.

use lockbox_core::{Identity, LockboxError};
use serde::{Deserialize, Serialize};

use crate::crypto::{IV_LEN, SealedKey, TAG_LEN};
use crate::kdf::SALT_LEN;

/// Current schema generation written by this build.
pub const KEY_FILE_VERSION: u32 = 1;

/// One wrap of the DEK under one derived key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WrappedKeyRecord {
    #[serde(with = "hex::serde")]
    pub ciphertext: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub salt: [u8; SALT_LEN],
    #[serde(with = "hex::serde")]
    pub iv: [u8; IV_LEN],
    #[serde(with = "hex::serde")]
    pub tag: [u8; TAG_LEN],
    /// Pins the Argon2id parameter set and cipher suite.
    pub version: u32,
}

impl WrappedKeyRecord {
    pub fn new(sealed: SealedKey, salt: [u8; SALT_LEN]) -> Self {
        Self {
            ciphertext: sealed.ciphertext,
            salt,
            iv: sealed.iv,
            tag: sealed.tag,
            version: KEY_FILE_VERSION,
        }
    }
}

/// Which of a record's wraps to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapSlot {
    Primary,
    Recovery,
}

/// The whole key file for one identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VaultRecord {
    pub identity: Option<Identity>,
    pub primary_wrap: WrappedKeyRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_wrap: Option<WrappedKeyRecord>,
}

impl VaultRecord {
    /// The wrap stored in `slot`, if present.
    pub fn wrap(&self, slot: WrapSlot) -> Result<&WrappedKeyRecord, LockboxError> {
        match slot {
            WrapSlot::Primary => Ok(&self.primary_wrap),
            WrapSlot::Recovery => self.recovery_wrap.as_ref().ok_or(LockboxError::NoRecoveryPath),
        }
    }

    pub fn has_recovery(&self) -> bool {
        self.recovery_wrap.is_some()
    }

    /// Serialize as pretty-printed JSON with a trailing newline.
    pub fn to_json(&self) -> Result<Vec<u8>, LockboxError> {
        let mut bytes = serde_json::to_vec_pretty(self)
            .map_err(|e| LockboxError::Internal(format!("failed to serialize key file: {e}")))?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Parse a key file. The version of every wrap is checked here, so a
    /// record from a future schema fails before any derivation runs.
    pub fn from_json(bytes: &[u8]) -> Result<Self, LockboxError> {
        let record: Self = serde_json::from_slice(bytes)
            .map_err(|e| LockboxError::MalformedRecord(e.to_string()))?;

        for wrap in std::iter::once(&record.primary_wrap).chain(record.recovery_wrap.as_ref()) {
            if wrap.version != KEY_FILE_VERSION {
                return Err(LockboxError::UnsupportedVersion(wrap.version));
            }
        }
        Ok(record)
    }
}
