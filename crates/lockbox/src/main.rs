// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lockbox - a local credential vault.
//!
//! This is the binary entry point: it loads configuration, installs the
//! tracing subscriber, and dispatches to the subcommand handlers.

mod manage;
mod payload;
mod setup;
mod status;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use lockbox_config::LockboxConfig;
use lockbox_core::{Identity, LockboxError};
use lockbox_vault::{KeyFileService, VaultStore};

/// Lockbox - protect a data-encryption key with a password and a recovery code.
#[derive(Parser, Debug)]
#[command(name = "lockbox", version, about, long_about = None)]
struct Cli {
    /// Key file owner. Omit for the single unnamed key file.
    #[arg(long, global = true, value_parser = parse_identity)]
    identity: Option<Identity>,

    /// Vault directory, overriding `vault.directory` from the config.
    #[arg(long, global = true, value_name = "DIR")]
    vault_dir: Option<PathBuf>,

    /// Explicit config file instead of the XDG lookup.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a key file protecting a new data-encryption key.
    Setup {
        /// Skip the recovery code, even if `vault.recovery` is enabled.
        #[arg(long)]
        no_recovery: bool,
    },
    /// Verify a secret and print the key fingerprint.
    Unlock {
        /// Unlock with the recovery code instead of the password.
        #[arg(long)]
        recovery: bool,
    },
    /// Show whether a key file exists and whether it has a recovery path.
    Status {
        /// Output as JSON for scripting.
        #[arg(long)]
        json: bool,
    },
    /// Change the password, keeping the data-encryption key.
    Rewrap,
    /// Set a new password using the recovery code.
    Recover,
    /// Issue a new recovery code; the old one stops working.
    RotateRecovery,
    /// Delete the key file. Data encrypted under it becomes unrecoverable.
    Destroy {
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
    /// Encrypt data with the unlocked key.
    Encrypt {
        /// Input file (stdin if omitted).
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,
        /// Output file (stdout if omitted).
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// Decrypt data produced by `encrypt`.
    Decrypt {
        /// Input file (stdin if omitted).
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,
        /// Output file (stdout if omitted).
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
}

fn parse_identity(raw: &str) -> Result<Identity, String> {
    Identity::new(raw).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => lockbox_config::load_and_validate_path(path),
        None => lockbox_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            lockbox_config::render_errors(&errors);
            return ExitCode::from(1);
        }
    };

    init_tracing(&config.log.level);

    let service = KeyFileService::new(VaultStore::new(vault_dir(&cli, &config)));
    let identity = cli.identity.as_ref();

    let result = match cli.command {
        Commands::Setup { no_recovery } => {
            setup::run_setup(&service, identity, config.vault.recovery && !no_recovery)
        }
        Commands::Unlock { recovery } => manage::run_unlock(&service, identity, recovery),
        Commands::Status { json } => status::run_status(&service, identity, json),
        Commands::Rewrap => manage::run_rewrap(&service, identity),
        Commands::Recover => manage::run_recover(&service, identity),
        Commands::RotateRecovery => setup::run_rotate_recovery(&service, identity),
        Commands::Destroy { yes } => manage::run_destroy(&service, identity, yes),
        Commands::Encrypt { input, output } => {
            payload::run_encrypt(&service, identity, input.as_deref(), output.as_deref())
        }
        Commands::Decrypt { input, output } => {
            payload::run_decrypt(&service, identity, input.as_deref(), output.as_deref())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("lockbox: {e}");
            if matches!(e, LockboxError::Unconfirmed { .. }) {
                eprintln!("lockbox: pass --yes to confirm");
            }
            ExitCode::from(exit_code(&e))
        }
    }
}

fn vault_dir(cli: &Cli, config: &LockboxConfig) -> PathBuf {
    cli.vault_dir
        .clone()
        .unwrap_or_else(|| config.vault.directory_path())
}

/// Process exit status for a failed command.
fn exit_code(err: &LockboxError) -> u8 {
    match err {
        LockboxError::WrongSecret | LockboxError::Authentication => 2,
        LockboxError::NotFound { .. } => 3,
        _ => 1,
    }
}

/// Initialize tracing with an `EnvFilter`; `RUST_LOG` overrides the config.
///
/// Logs go to stderr so stdout stays clean for recovery codes and payloads.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lockbox={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
