// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lockbox status` command implementation.
//!
//! Reads the key file without deriving any key, so it never needs a secret.

use lockbox_core::{Identity, LockboxError};
use lockbox_vault::{KEY_FILE_VERSION, KeyFileService, KeyFileState};
use serde::Serialize;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub identity: Option<String>,
    pub path: String,
    pub initialized: bool,
    pub has_recovery: bool,
    pub schema_version: u32,
}

impl StatusResponse {
    fn new(identity: Option<&Identity>, path: &std::path::Path, state: KeyFileState) -> Self {
        let (initialized, has_recovery) = match state {
            KeyFileState::Uninitialized => (false, false),
            KeyFileState::Setup { has_recovery } => (true, has_recovery),
        };
        Self {
            identity: identity.map(|id| id.to_string()),
            path: path.display().to_string(),
            initialized,
            has_recovery,
            schema_version: KEY_FILE_VERSION,
        }
    }
}

/// Run the `lockbox status` command.
pub fn run_status(
    service: &KeyFileService,
    identity: Option<&Identity>,
    json: bool,
) -> Result<(), LockboxError> {
    let path = service.path_for(identity);
    let response = StatusResponse::new(identity, &path, service.state(identity)?);

    if json {
        let text = serde_json::to_string_pretty(&response)
            .map_err(|e| LockboxError::Internal(format!("failed to serialize status: {e}")))?;
        println!("{text}");
        return Ok(());
    }

    println!("Key file: {}", response.path);
    if !response.initialized {
        println!("State:    not set up");
    } else if response.has_recovery {
        println!("State:    set up, recovery code enabled");
    } else {
        println!("State:    set up, no recovery code");
    }
    Ok(())
}
