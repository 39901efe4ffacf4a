// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./lockbox.toml` > `~/.config/lockbox/lockbox.toml` > `/etc/lockbox/lockbox.toml`
//! with environment variable overrides via `LOCKBOX_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::LockboxConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/lockbox/lockbox.toml` (system-wide)
/// 3. `~/.config/lockbox/lockbox.toml` (user XDG config)
/// 4. `./lockbox.toml` (local directory)
/// 5. `LOCKBOX_*` environment variables
pub fn load_config() -> Result<LockboxConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<LockboxConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LockboxConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<LockboxConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LockboxConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(LockboxConfig::default()))
        .merge(Toml::file("/etc/lockbox/lockbox.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("lockbox/lockbox.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("lockbox.toml"))
        .merge(env_provider())
}

/// Suffixes of `LOCKBOX_*` variables that carry secrets.
const SECRET_ENV_KEYS: &[&str] = &["passphrase", "new_passphrase", "recovery_code"];

/// Environment provider with explicit section-to-dot mapping.
///
/// `LOCKBOX_VAULT_DIRECTORY` maps to `vault.directory` and `LOCKBOX_LOG_LEVEL`
/// to `log.level`. Secret inputs such as `LOCKBOX_PASSPHRASE` are not
/// configuration and are filtered out.
fn env_provider() -> Env {
    Env::prefixed("LOCKBOX_")
        .filter(|key| {
            !SECRET_ENV_KEYS
                .iter()
                .any(|secret| key.as_str().eq_ignore_ascii_case(secret))
        })
        .map(|key| {
            let mapped = key
                .as_str()
                .replacen("vault_", "vault.", 1)
                .replacen("log_", "log.", 1);
            mapped.into()
        })
}
