// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Observer trait for vault outcome reporting.

use std::sync::Mutex;

use crate::types::VaultEvent;

/// Receives structured outcomes from the key file service.
///
/// The vault performs no formatting of its own; console output and
/// telemetry are the observer's concern.
pub trait VaultObserver: Send + Sync {
    /// Called once per reportable outcome.
    fn on_event(&self, event: &VaultEvent);
}


/// Records events in memory, for tests and embedding applications.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<VaultEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events seen so far, oldest first.
    pub fn events(&self) -> Vec<VaultEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl VaultObserver for RecordingObserver {
    fn on_event(&self, event: &VaultEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}
