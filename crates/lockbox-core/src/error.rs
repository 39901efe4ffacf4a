// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Lockbox credential vault.
//!
//! Authentication failures never say which field (ciphertext, IV, or tag)
//! failed verification, and unlock never distinguishes a wrong secret from a
//! tampered wrap.

use std::path::PathBuf;

use thiserror::Error;

/// The error type used across all Lockbox crates.
#[derive(Debug, Error)]
pub enum LockboxError {
    /// Configuration errors (invalid TOML, bad values, unreadable files).
    #[error("configuration error: {0}")]
    Config(String),

    /// The password-hashing function rejected its inputs (short salt, bad parameters).
    #[error("key derivation failed: {0}")]
    Derivation(String),

    /// AEAD tag verification failed on unwrap or payload decryption.
    #[error("authentication failed -- wrong key or corrupted data")]
    Authentication,

    /// Unlock could not authenticate the stored wrap with the supplied secret.
    #[error("wrong secret or corrupted key file")]
    WrongSecret,

    /// Setup found an existing key file and refused to overwrite it.
    #[error("key file already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },

    /// No key file exists for the requested identity.
    #[error("key file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Recovery unlock was requested but the record has no recovery wrap.
    #[error("key file has no recovery wrap")]
    NoRecoveryPath,

    /// The identity cannot be mapped to a key file name.
    #[error("invalid identity `{name}`: {reason}")]
    InvalidIdentity { name: String, reason: &'static str },

    /// The key file was written by a schema generation this build does not know.
    #[error("unsupported key file version {0}")]
    UnsupportedVersion(u32),

    /// The key file is not valid JSON or a field has the wrong encoding or length.
    #[error("malformed key file: {0}")]
    MalformedRecord(String),

    /// Filesystem failure while reading, writing, or creating the vault.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// No passphrase or recovery code could be obtained from the environment or a terminal.
    #[error("could not read secret: {0}")]
    SecretInput(String),

    /// The key file changed between being read and being replaced.
    #[error("key file changed concurrently, nothing was written: {}", path.display())]
    Conflict { path: PathBuf },

    /// A destructive operation was requested without explicit confirmation.
    #[error("refusing to {action} {} without confirmation", path.display())]
    Unconfirmed { action: &'static str, path: PathBuf },

    /// The system random number generator failed.
    #[error("randomness source failed")]
    Randomness,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LockboxError {
    /// Wrap an I/O error with the path it happened at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
