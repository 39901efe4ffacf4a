// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lockbox setup` and `lockbox rotate-recovery`: the two commands that
//! hand a recovery code to the operator.

use lockbox_core::{Identity, LockboxError};
use lockbox_vault::{KeyFileService, RecoveryCode};

/// Run `lockbox setup`.
///
/// An existing key file is not an error: the operator gets a notice and the
/// file is left untouched.
pub fn run_setup(
    service: &KeyFileService,
    identity: Option<&Identity>,
    with_recovery: bool,
) -> Result<(), LockboxError> {
    let path = service.path_for(identity);
    if let Err(LockboxError::AlreadyExists { .. }) = service.check_setup_allowed(identity) {
        print_already_exists(&path);
        return Ok(());
    }

    let password = lockbox_vault::get_passphrase_with_confirm()?;
    let Some(outcome) = service.try_setup(identity, &password, with_recovery)? else {
        print_already_exists(&path);
        return Ok(());
    };

    eprintln!("Key file created: {}", outcome.path.display());
    eprintln!("Key fingerprint: {}", outcome.dek.fingerprint());
    if let Some(code) = &outcome.recovery_code {
        print_recovery_code(code);
    }
    Ok(())
}

/// Run `lockbox rotate-recovery`.
pub fn run_rotate_recovery(
    service: &KeyFileService,
    identity: Option<&Identity>,
) -> Result<(), LockboxError> {
    let password = lockbox_vault::get_passphrase()?;
    let code = service.rotate_recovery(identity, &password)?;
    eprintln!("Previous recovery code revoked.");
    print_recovery_code(&code);
    Ok(())
}

fn print_already_exists(path: &std::path::Path) {
    eprintln!(
        "Key file already exists: {}\nDelete it explicitly (lockbox destroy) to create a new one.",
        path.display()
    );
}

/// The code goes to stdout alone so it can be captured; the warning goes to stderr.
fn print_recovery_code(code: &RecoveryCode) {
    eprintln!("Recovery code (shown once, store it offline):");
    println!("{}", code.expose_secret());
}
