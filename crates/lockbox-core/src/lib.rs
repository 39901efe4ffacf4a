// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Lockbox credential vault.
//!
//! This crate provides the error taxonomy, the validated [`Identity`] type,
//! and the [`VaultObserver`] seam through which the vault reports outcomes.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::LockboxError;
pub use traits::{RecordingObserver, VaultObserver};
pub use types::{Identity, VaultEvent, VaultEventKind, MAX_IDENTITY_LEN};
