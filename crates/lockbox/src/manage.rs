// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Commands operating on an existing key file.

use lockbox_core::{Identity, LockboxError};
use lockbox_vault::KeyFileService;

/// Run `lockbox unlock`: verify the secret and print the key fingerprint.
pub fn run_unlock(
    service: &KeyFileService,
    identity: Option<&Identity>,
    use_recovery: bool,
) -> Result<(), LockboxError> {
    let secret = if use_recovery {
        lockbox_vault::get_recovery_code()?
    } else {
        lockbox_vault::get_passphrase()?
    };
    let dek = service.unlock(identity, &secret, use_recovery)?;
    println!("{}", dek.fingerprint());
    Ok(())
}

/// Run `lockbox rewrap`: old password in, new password out.
pub fn run_rewrap(service: &KeyFileService, identity: Option<&Identity>) -> Result<(), LockboxError> {
    let old = lockbox_vault::get_passphrase()?;
    let new = lockbox_vault::get_new_passphrase()?;
    service.rewrap(identity, &old, &new)?;
    eprintln!("Password changed: {}", service.path_for(identity).display());
    Ok(())
}

/// Run `lockbox recover`: recovery code in, new password out.
pub fn run_recover(service: &KeyFileService, identity: Option<&Identity>) -> Result<(), LockboxError> {
    let code = lockbox_vault::get_recovery_code()?;
    let new = lockbox_vault::get_new_passphrase()?;
    service.reset_with_recovery(identity, &code, &new)?;
    eprintln!("Password reset: {}", service.path_for(identity).display());
    Ok(())
}

/// Run `lockbox destroy`. Refuses without `--yes`.
pub fn run_destroy(
    service: &KeyFileService,
    identity: Option<&Identity>,
    confirmed: bool,
) -> Result<(), LockboxError> {
    let path = service.path_for(identity);
    if !service.exists(identity) {
        return Err(LockboxError::NotFound { path });
    }
    if !confirmed {
        return Err(LockboxError::Unconfirmed {
            action: "destroy",
            path,
        });
    }
    service.destroy(identity)?;
    eprintln!("Key file destroyed: {}", path.display());
    Ok(())
}
