// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the vault, configuration, and CLI crates.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::LockboxError;

/// Maximum identity length in bytes.
pub const MAX_IDENTITY_LEN: usize = 64;

/// The name a key file is stored under (e.g. a username).
///
/// Restricted to `[A-Za-z0-9._-]`, not starting with `.`, and folded to ASCII
/// lowercase, so that the identity maps to exactly one file name inside the
/// vault directory (also on case-insensitive filesystems) and can never
/// escape it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    /// Validate an identity name and fold it to lowercase.
    pub fn new(name: impl Into<String>) -> Result<Self, LockboxError> {
        let mut name = name.into();
        let reason = if name.is_empty() {
            Some("must not be empty")
        } else if name.len() > MAX_IDENTITY_LEN {
            Some("must be at most 64 bytes")
        } else if name.starts_with('.') {
            Some("must not start with `.`")
        } else if !name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
        {
            Some("may only contain ASCII letters, digits, `.`, `_` and `-`")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(LockboxError::InvalidIdentity { name, reason }),
            None => {
                name.make_ascii_lowercase();
                Ok(Self(name))
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Identity {
    type Err = LockboxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Identity {
    type Error = LockboxError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.0
    }
}

/// The outcome categories the vault reports to its observer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum VaultEventKind {
    DirectoryCreated,
    Created,
    AlreadyExists,
    Unlocked,
    WrongSecret,
    Rewrapped,
    RecoveryRotated,
    Destroyed,
}

/// A structured vault outcome. Carries no key material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultEvent {
    pub kind: VaultEventKind,
    /// `None` for the unnamed single-tenant record or directory events.
    pub identity: Option<Identity>,
    /// The key file (or vault directory) the event refers to.
    pub path: PathBuf,
}

impl VaultEvent {
    pub fn new(kind: VaultEventKind, identity: Option<&Identity>, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            identity: identity.cloned(),
            path: path.into(),
        }
    }
}
