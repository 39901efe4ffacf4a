// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Forwards vault events to `tracing`.

use lockbox_core::{VaultEvent, VaultEventKind, VaultObserver};
use tracing::{debug, info, warn};

/// Default observer: one structured log line per vault outcome.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl VaultObserver for TracingObserver {
    fn on_event(&self, event: &VaultEvent) {
        let identity = event.identity.as_ref().map_or("<unnamed>", |id| id.as_str());
        let path = event.path.display();

        match event.kind {
            VaultEventKind::DirectoryCreated => info!(path = %path, "vault directory created"),
            VaultEventKind::Created => info!(identity, path = %path, "key file created"),
            VaultEventKind::AlreadyExists => warn!(
                identity,
                path = %path,
                "key file already exists -- delete it explicitly to create a new one"
            ),
            VaultEventKind::Unlocked => debug!(identity, "key file unlocked"),
            VaultEventKind::WrongSecret => warn!(identity, "unlock failed -- wrong secret or corrupted key file"),
            VaultEventKind::Rewrapped => info!(identity, path = %path, "key file re-wrapped"),
            VaultEventKind::RecoveryRotated => info!(identity, path = %path, "recovery code rotated"),
            VaultEventKind::Destroyed => warn!(identity, path = %path, "key file destroyed"),
        }
    }
}
