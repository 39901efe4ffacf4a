// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local credential vault built on envelope encryption.
//!
//! A random 256-bit data-encryption key (DEK) protects application data.
//! The DEK itself is stored only in wrapped form: AES-256-GCM under a key
//! derived with Argon2id from a password, and optionally a second wrap of the
//! same DEK under a key derived from a one-time recovery code.

pub mod crypto;
pub mod kdf;
pub mod key;
pub mod keyfile;
pub mod observer;
pub mod prompt;
pub mod record;
pub mod store;

pub use key::{DataEncryptionKey, RecoveryCode};
pub use keyfile::{KeyFileService, KeyFileState, SetupOutcome};
pub use observer::TracingObserver;
pub use prompt::{get_new_passphrase, get_passphrase, get_passphrase_with_confirm, get_recovery_code};
pub use record::{KEY_FILE_VERSION, VaultRecord, WrapSlot, WrappedKeyRecord};
pub use store::VaultStore;
