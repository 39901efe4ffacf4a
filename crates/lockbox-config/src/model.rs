// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Lockbox credential vault.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level Lockbox configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LockboxConfig {
    /// Key file storage settings.
    #[serde(default)]
    pub vault: VaultConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// Key file storage configuration.
///
/// Argon2id cost is deliberately absent: it is pinned by the key file's
/// schema version, not by whoever happens to run the binary.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Directory holding one `{identity}-key.json` per identity.
    #[serde(default = "default_vault_directory")]
    pub directory: String,

    /// Whether `setup` issues a recovery code unless told otherwise.
    #[serde(default = "default_recovery")]
    pub recovery: bool,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            directory: default_vault_directory(),
            recovery: default_recovery(),
        }
    }
}

impl VaultConfig {
    /// The configured vault directory as a path.
    pub fn directory_path(&self) -> PathBuf {
        PathBuf::from(&self.directory)
    }
}

fn default_vault_directory() -> String {
    dirs::data_dir()
        .map(|d| d.join("lockbox").join("vault").display().to_string())
        .unwrap_or_else(|| ".vault".to_string())
}

fn default_recovery() -> bool {
    true
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
