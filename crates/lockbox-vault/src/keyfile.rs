// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key file lifecycle: setup, unlock, re-wrap, recovery, and destruction.
//!
//! One random DEK is generated per key file and never changes afterwards:
//! - setup wraps it under a password-derived key (`primaryWrap`) and, when a
//!   recovery path is requested, wraps the SAME DEK under a key derived from
//!   a fresh recovery code (`recoveryWrap`);
//! - unlock re-derives the key from the stored salt and unwraps either slot;
//! - re-wrap, recovery reset and recovery rotation replace one wrap at a
//!   time and leave the DEK and the other wrap untouched.

use std::path::PathBuf;
use std::sync::Arc;

use lockbox_core::{Identity, LockboxError, VaultEvent, VaultEventKind, VaultObserver};
use secrecy::{ExposeSecret, SecretString};

use crate::crypto;
use crate::kdf::{self, KdfParams};
use crate::key::{DataEncryptionKey, RecoveryCode};
use crate::observer::TracingObserver;
use crate::record::{KEY_FILE_VERSION, VaultRecord, WrapSlot, WrappedKeyRecord};
use crate::store::VaultStore;

/// Result of a successful setup.
#[derive(Debug)]
pub struct SetupOutcome {
    /// The record as persisted.
    pub record: VaultRecord,
    /// Where it was written.
    pub path: PathBuf,
    /// Present only if a recovery path was requested. This is the only time
    /// the code is ever available.
    pub recovery_code: Option<RecoveryCode>,
    /// The freshly generated DEK, so the caller need not unlock again.
    pub dek: DataEncryptionKey,
}

/// Where an identity stands in its lifecycle. `Unlocked` is not a stored
/// state: it exists only as a [`DataEncryptionKey`] in the caller's memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFileState {
    Uninitialized,
    Setup { has_recovery: bool },
}

/// Orchestrates derivation, wrapping and storage of key files.
pub struct KeyFileService {
    store: VaultStore,
    observer: Arc<dyn VaultObserver>,
}

impl std::fmt::Debug for KeyFileService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyFileService")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl KeyFileService {
    /// Service reporting outcomes through `tracing`.
    pub fn new(store: VaultStore) -> Self {
        Self::with_observer(store, Arc::new(TracingObserver))
    }

    pub fn with_observer(store: VaultStore, observer: Arc<dyn VaultObserver>) -> Self {
        Self { store, observer }
    }

    pub fn store(&self) -> &VaultStore {
        &self.store
    }

    pub fn path_for(&self, identity: Option<&Identity>) -> PathBuf {
        self.store.path_for(identity)
    }

    pub fn exists(&self, identity: Option<&Identity>) -> bool {
        self.store.exists(&self.store.path_for(identity))
    }

    /// Like [`KeyFileService::exists`], but an existing key file is reported
    /// to the observer as a refused setup. Lets callers skip prompting for a
    /// password that setup would never use.
    pub fn check_setup_allowed(&self, identity: Option<&Identity>) -> Result<(), LockboxError> {
        let path = self.store.path_for(identity);
        if self.store.exists(&path) {
            self.emit(VaultEventKind::AlreadyExists, identity, &path);
            return Err(LockboxError::AlreadyExists { path });
        }
        Ok(())
    }

    /// Inspect the stored state without deriving anything.
    pub fn state(&self, identity: Option<&Identity>) -> Result<KeyFileState, LockboxError> {
        match self.load_record(identity) {
            Ok(record) => Ok(KeyFileState::Setup {
                has_recovery: record.has_recovery(),
            }),
            Err(LockboxError::NotFound { .. }) => Ok(KeyFileState::Uninitialized),
            Err(e) => Err(e),
        }
    }

    /// Create a key file protecting a new DEK.
    ///
    /// Fails with [`LockboxError::AlreadyExists`] if the identity already has
    /// a key file; the existing file is never modified.
    pub fn setup(
        &self,
        identity: Option<&Identity>,
        password: &SecretString,
        with_recovery: bool,
    ) -> Result<SetupOutcome, LockboxError> {
        if self.store.ensure_directory_exists()? {
            self.emit(VaultEventKind::DirectoryCreated, None, self.store.directory());
        }

        let path = self.store.path_for(identity);
        if self.store.exists(&path) {
            self.emit(VaultEventKind::AlreadyExists, identity, &path);
            return Err(LockboxError::AlreadyExists { path });
        }

        let dek = DataEncryptionKey::generate()?;
        let primary_wrap = wrap_dek(password.expose_secret().as_bytes(), &dek)?;

        let (recovery_code, recovery_wrap) = if with_recovery {
            let code = RecoveryCode::generate()?;
            let wrap = wrap_dek(code.expose_secret().as_bytes(), &dek)?;
            (Some(code), Some(wrap))
        } else {
            (None, None)
        };

        let record = VaultRecord {
            identity: identity.cloned(),
            primary_wrap,
            recovery_wrap,
        };

        // The early check above is only a fast path; the no-clobber write is
        // what actually settles a race between two setups.
        match self.store.write_new(&path, &record.to_json()?) {
            Ok(()) => {}
            Err(e @ LockboxError::AlreadyExists { .. }) => {
                self.emit(VaultEventKind::AlreadyExists, identity, &path);
                return Err(e);
            }
            Err(e) => return Err(e),
        }

        self.emit(VaultEventKind::Created, identity, &path);
        Ok(SetupOutcome {
            record,
            path,
            recovery_code,
            dek,
        })
    }

    /// [`KeyFileService::setup`] for command-line callers: an existing key
    /// file yields `Ok(None)` instead of an error.
    pub fn try_setup(
        &self,
        identity: Option<&Identity>,
        password: &SecretString,
        with_recovery: bool,
    ) -> Result<Option<SetupOutcome>, LockboxError> {
        match self.setup(identity, password, with_recovery) {
            Ok(outcome) => Ok(Some(outcome)),
            Err(LockboxError::AlreadyExists { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Recover the DEK with the password, or with the recovery code when
    /// `use_recovery` is set.
    ///
    /// A wrong secret and a tampered wrap both surface as
    /// [`LockboxError::WrongSecret`].
    pub fn unlock(
        &self,
        identity: Option<&Identity>,
        secret: &SecretString,
        use_recovery: bool,
    ) -> Result<DataEncryptionKey, LockboxError> {
        let slot = if use_recovery {
            WrapSlot::Recovery
        } else {
            WrapSlot::Primary
        };
        let record = self.load_record(identity)?;
        let dek = self.unwrap_slot(identity, &record, slot, secret)?;
        self.emit(VaultEventKind::Unlocked, identity, self.store.path_for(identity));
        Ok(dek)
    }

    /// Change the password: unlock with `old_secret`, then replace
    /// `primaryWrap` with a wrap of the same DEK under `new_secret`.
    pub fn rewrap(
        &self,
        identity: Option<&Identity>,
        old_secret: &SecretString,
        new_secret: &SecretString,
    ) -> Result<(), LockboxError> {
        self.replace_primary(identity, old_secret, WrapSlot::Primary, new_secret)
    }

    /// Forgotten password: unlock through `recoveryWrap` and install a new
    /// `primaryWrap` for `new_password`. The recovery code stays valid.
    pub fn reset_with_recovery(
        &self,
        identity: Option<&Identity>,
        recovery_code: &SecretString,
        new_password: &SecretString,
    ) -> Result<(), LockboxError> {
        self.replace_primary(identity, recovery_code, WrapSlot::Recovery, new_password)
    }

    /// Issue a new recovery code for the same DEK, replacing `recoveryWrap`
    /// (or adding one to a record set up without it). The previous code
    /// stops working.
    pub fn rotate_recovery(
        &self,
        identity: Option<&Identity>,
        password: &SecretString,
    ) -> Result<RecoveryCode, LockboxError> {
        let path = self.store.path_for(identity);
        let (original, mut record) = self.load(identity)?;
        let dek = self.unwrap_slot(identity, &record, WrapSlot::Primary, password)?;

        let code = RecoveryCode::generate()?;
        record.recovery_wrap = Some(wrap_dek(code.expose_secret().as_bytes(), &dek)?);
        self.store.replace(&path, &original, &record.to_json()?)?;

        self.emit(VaultEventKind::RecoveryRotated, identity, &path);
        Ok(code)
    }

    /// Delete the key file. Without a recovery path elsewhere the DEK, and
    /// everything encrypted under it, is gone for good.
    pub fn destroy(&self, identity: Option<&Identity>) -> Result<(), LockboxError> {
        let path = self.store.path_for(identity);
        self.store.remove(&path)?;
        self.emit(VaultEventKind::Destroyed, identity, &path);
        Ok(())
    }

    /// Read and parse the key file for `identity`.
    pub fn load_record(&self, identity: Option<&Identity>) -> Result<VaultRecord, LockboxError> {
        self.load(identity).map(|(_, record)| record)
    }

    /// The raw bytes alongside the parsed record, so an update can be
    /// checked against exactly what it was based on.
    fn load(&self, identity: Option<&Identity>) -> Result<(Vec<u8>, VaultRecord), LockboxError> {
        let path = self.store.path_for(identity);
        let bytes = self.store.read(&path)?;
        let record = VaultRecord::from_json(&bytes)?;
        if record.identity.as_ref() != identity {
            return Err(LockboxError::MalformedRecord(format!(
                "{} belongs to a different identity",
                path.display()
            )));
        }
        Ok((bytes, record))
    }

    fn replace_primary(
        &self,
        identity: Option<&Identity>,
        current: &SecretString,
        via: WrapSlot,
        new_password: &SecretString,
    ) -> Result<(), LockboxError> {
        let path = self.store.path_for(identity);
        let (original, mut record) = self.load(identity)?;
        let dek = self.unwrap_slot(identity, &record, via, current)?;

        record.primary_wrap = wrap_dek(new_password.expose_secret().as_bytes(), &dek)?;
        self.store.replace(&path, &original, &record.to_json()?)?;

        self.emit(VaultEventKind::Rewrapped, identity, &path);
        Ok(())
    }

    fn unwrap_slot(
        &self,
        identity: Option<&Identity>,
        record: &VaultRecord,
        slot: WrapSlot,
        secret: &SecretString,
    ) -> Result<DataEncryptionKey, LockboxError> {
        let wrap = record.wrap(slot)?;
        match unwrap_dek(secret.expose_secret().as_bytes(), wrap) {
            Err(LockboxError::WrongSecret) => {
                self.emit(VaultEventKind::WrongSecret, identity, self.store.path_for(identity));
                Err(LockboxError::WrongSecret)
            }
            other => other,
        }
    }

    fn emit(&self, kind: VaultEventKind, identity: Option<&Identity>, path: impl Into<PathBuf>) {
        self.observer.on_event(&VaultEvent::new(kind, identity, path));
    }
}

/// Wrap `dek` under a key derived from `secret` with a fresh salt, using the
/// current schema version's parameters.
fn wrap_dek(secret: &[u8], dek: &DataEncryptionKey) -> Result<WrappedKeyRecord, LockboxError> {
    let params = KdfParams::for_version(KEY_FILE_VERSION)?;
    let salt = kdf::generate_salt()?;
    let kek = kdf::derive_key(secret, &salt, &params)?;
    let sealed = crypto::wrap_key(&kek, dek.expose())?;
    Ok(WrappedKeyRecord::new(sealed, salt))
}

/// Re-derive with the stored salt and the wrap's own version parameters.
fn unwrap_dek(secret: &[u8], wrap: &WrappedKeyRecord) -> Result<DataEncryptionKey, LockboxError> {
    let params = KdfParams::for_version(wrap.version)?;
    let kek = kdf::derive_key(secret, &wrap.salt, &params)?;
    let plaintext = crypto::unwrap_key(&kek, &wrap.ciphertext, &wrap.iv, &wrap.tag).map_err(
        |e| match e {
            LockboxError::Authentication => LockboxError::WrongSecret,
            other => other,
        },
    )?;
    DataEncryptionKey::from_unwrapped(plaintext)
}
