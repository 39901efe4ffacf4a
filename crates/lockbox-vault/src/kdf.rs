// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Argon2id key derivation from a password or recovery code.
//!
//! The cost parameters are not configurable at runtime: each key file schema
//! version pins one parameter set, so a stored wrap always records (through
//! its `version`) exactly how its key was derived.

use lockbox_core::LockboxError;
use zeroize::Zeroizing;

use crate::crypto;

/// Output length of the derivation in bytes.
pub const DERIVED_KEY_LEN: usize = 32;

/// Salt length generated for every derivation.
pub const SALT_LEN: usize = 16;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_cost_kib: u32,
    /// Number of passes over memory.
    pub iterations: u32,
    /// Degree of parallelism (lanes).
    pub parallelism: u32,
}

impl KdfParams {
    /// Schema version 1: 64 MiB, 3 passes, 4 lanes.
    pub const V1: KdfParams = KdfParams {
        memory_cost_kib: 65536,
        iterations: 3,
        parallelism: 4,
    };

    /// The parameter set pinned by a key file schema version.
    pub fn for_version(version: u32) -> Result<Self, LockboxError> {
        match version {
            1 => Ok(Self::V1),
            other => Err(LockboxError::UnsupportedVersion(other)),
        }
    }
}

/// Derive a 32-byte key from `secret` and `salt` using Argon2id v0x13.
///
/// Salts shorter than [`SALT_LEN`] are rejected rather than padded. The
/// returned key is wrapped in [`Zeroizing`] for automatic memory zeroing on
/// drop.
pub fn derive_key(
    secret: &[u8],
    salt: &[u8],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; DERIVED_KEY_LEN]>, LockboxError> {
    if salt.len() < SALT_LEN {
        return Err(LockboxError::Derivation(format!(
            "salt must be at least {SALT_LEN} bytes, got {}",
            salt.len()
        )));
    }

    let argon_params = argon2::Params::new(
        params.memory_cost_kib,
        params.iterations,
        params.parallelism,
        Some(DERIVED_KEY_LEN),
    )
    .map_err(|e| LockboxError::Derivation(format!("invalid Argon2id parameters: {e}")))?;

    let argon2 = argon2::Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon_params,
    );

    let mut output = Zeroizing::new([0u8; DERIVED_KEY_LEN]);
    argon2
        .hash_password_into(secret, salt, output.as_mut())
        .map_err(|e| LockboxError::Derivation(format!("Argon2id key derivation failed: {e}")))?;

    Ok(output)
}

/// Generate a fresh random salt.
pub fn generate_salt() -> Result<[u8; SALT_LEN], LockboxError> {
    crypto::random_bytes()
}
