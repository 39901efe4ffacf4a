// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lockbox encrypt` / `lockbox decrypt`: payload round trips under the DEK.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use lockbox_core::{Identity, LockboxError};
use lockbox_vault::KeyFileService;

pub fn run_encrypt(
    service: &KeyFileService,
    identity: Option<&Identity>,
    input: Option<&Path>,
    output: Option<&Path>,
) -> Result<(), LockboxError> {
    let dek = service.unlock(identity, &lockbox_vault::get_passphrase()?, false)?;
    let data = read_input(input)?;
    write_output(output, &dek.encrypt(&data)?)
}

pub fn run_decrypt(
    service: &KeyFileService,
    identity: Option<&Identity>,
    input: Option<&Path>,
    output: Option<&Path>,
) -> Result<(), LockboxError> {
    let dek = service.unlock(identity, &lockbox_vault::get_passphrase()?, false)?;
    let blob = read_input(input)?;
    let data = dek.decrypt(&blob)?;
    write_output(output, &data)
}

fn read_input(input: Option<&Path>) -> Result<Vec<u8>, LockboxError> {
    match input {
        Some(path) => fs::read(path).map_err(|e| LockboxError::io(path, e)),
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .map_err(|e| LockboxError::io("<stdin>", e))?;
            Ok(buf)
        }
    }
}

fn write_output(output: Option<&Path>, bytes: &[u8]) -> Result<(), LockboxError> {
    match output {
        Some(path) => fs::write(path, bytes).map_err(|e| LockboxError::io(path, e)),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(bytes)
                .and_then(|()| stdout.flush())
                .map_err(|e| LockboxError::io("<stdout>", e))
        }
    }
}
