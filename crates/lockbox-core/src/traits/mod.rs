// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits the vault calls out to.

pub mod observer;

pub use observer::{RecordingObserver, VaultObserver};
