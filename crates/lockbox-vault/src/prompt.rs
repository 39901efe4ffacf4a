// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secret acquisition via environment variable or interactive TTY prompt.
//!
//! Priority for every secret:
//! 1. Its `LOCKBOX_*` environment variable (headless, CI, scripts)
//! 2. An interactive `rpassword` prompt on stderr (human operators)

use std::io::IsTerminal;

use lockbox_core::LockboxError;
use secrecy::{ExposeSecret, SecretString};

/// Current password.
pub const PASSPHRASE_ENV_VAR: &str = "LOCKBOX_PASSPHRASE";

/// Replacement password for re-wrap and recovery reset.
pub const NEW_PASSPHRASE_ENV_VAR: &str = "LOCKBOX_NEW_PASSPHRASE";

/// Recovery code for recovery unlock and reset.
pub const RECOVERY_CODE_ENV_VAR: &str = "LOCKBOX_RECOVERY_CODE";

/// Get the current passphrase.
pub fn get_passphrase() -> Result<SecretString, LockboxError> {
    read_secret(PASSPHRASE_ENV_VAR, "Passphrase: ")
}

/// Get a passphrase for a new key file, confirming it when typed.
pub fn get_passphrase_with_confirm() -> Result<SecretString, LockboxError> {
    read_confirmed(PASSPHRASE_ENV_VAR, "New passphrase: ")
}

/// Get the replacement passphrase for re-wrap or recovery reset.
pub fn get_new_passphrase() -> Result<SecretString, LockboxError> {
    read_confirmed(NEW_PASSPHRASE_ENV_VAR, "New passphrase: ")
}

/// Get a recovery code. Surrounding whitespace from copy-paste is dropped.
pub fn get_recovery_code() -> Result<SecretString, LockboxError> {
    let code = read_secret(RECOVERY_CODE_ENV_VAR, "Recovery code: ")?;
    let trimmed = code.expose_secret().trim();
    if trimmed.is_empty() {
        return Err(LockboxError::SecretInput("empty secret not allowed".to_string()));
    }
    if trimmed.len() == code.expose_secret().len() {
        return Ok(code);
    }
    Ok(SecretString::from(trimmed.to_string()))
}

fn from_env(var: &str) -> Option<SecretString> {
    match std::env::var(var) {
        Ok(value) if !value.is_empty() => Some(SecretString::from(value)),
        _ => None,
    }
}

fn read_secret(var: &str, label: &str) -> Result<SecretString, LockboxError> {
    if let Some(secret) = from_env(var) {
        return Ok(secret);
    }
    if std::io::stdin().is_terminal() {
        return prompt(label);
    }
    Err(no_secret(var))
}

fn read_confirmed(var: &str, label: &str) -> Result<SecretString, LockboxError> {
    // Env var does not need confirmation.
    if let Some(secret) = from_env(var) {
        return Ok(secret);
    }
    if std::io::stdin().is_terminal() {
        let first = prompt(label)?;
        let second = prompt("Confirm passphrase: ")?;
        if first.expose_secret() != second.expose_secret() {
            return Err(LockboxError::SecretInput("passphrases do not match".to_string()));
        }
        return Ok(first);
    }
    Err(no_secret(var))
}

fn prompt(label: &str) -> Result<SecretString, LockboxError> {
    let value = rpassword::prompt_password(label)
        .map_err(|e| LockboxError::SecretInput(format!("failed to read from terminal: {e}")))?;
    if value.is_empty() {
        return Err(LockboxError::SecretInput("empty secret not allowed".to_string()));
    }
    Ok(SecretString::from(value))
}

fn no_secret(var: &str) -> LockboxError {
    LockboxError::SecretInput(format!(
        "nothing provided; set {var} or run interactively"
    ))
}
