// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end key file lifecycle against a real vault directory.

use std::fs;
use std::sync::Arc;

use lockbox_core::{Identity, LockboxError, RecordingObserver, VaultEventKind};
use lockbox_vault::{KeyFileService, VaultRecord, VaultStore};
use secrecy::SecretString;
use tempfile::{TempDir, tempdir};

fn secret(s: &str) -> SecretString {
    SecretString::from(s.to_string())
}

fn setup_service() -> (TempDir, KeyFileService) {
    let dir = tempdir().unwrap();
    let service = KeyFileService::new(VaultStore::new(dir.path().join(".vault")));
    (dir, service)
}

#[test]
fn alice_full_lifecycle() {
    let (_dir, service) = setup_service();
    let alice = Identity::new("alice").unwrap();

    let outcome = service.setup(Some(&alice), &secret("p@ss"), true).unwrap();
    let code = outcome.recovery_code.expect("recovery code issued");
    let original = *outcome.dek.expose();

    // Unlock both ways.
    assert_eq!(service.unlock(Some(&alice), &secret("p@ss"), false).unwrap().expose(), &original);
    assert_eq!(service.unlock(Some(&alice), &code.to_secret(), true).unwrap().expose(), &original);

    // Wrong password.
    assert!(matches!(
        service.unlock(Some(&alice), &secret("wrong"), false),
        Err(LockboxError::WrongSecret)
    ));

    // Forgotten password: reset through recovery.
    service
        .reset_with_recovery(Some(&alice), &code.to_secret(), &secret("n3w"))
        .unwrap();
    assert!(matches!(
        service.unlock(Some(&alice), &secret("p@ss"), false),
        Err(LockboxError::WrongSecret)
    ));
    assert_eq!(service.unlock(Some(&alice), &secret("n3w"), false).unwrap().expose(), &original);
    assert_eq!(service.unlock(Some(&alice), &code.to_secret(), true).unwrap().expose(), &original);

    service.destroy(Some(&alice)).unwrap();
    assert!(!service.exists(Some(&alice)));
    assert!(matches!(
        service.unlock(Some(&alice), &secret("n3w"), false),
        Err(LockboxError::NotFound { .. })
    ));
}

#[test]
fn second_setup_leaves_file_byte_identical() {
    let (_dir, service) = setup_service();
    let alice = Identity::new("alice").unwrap();

    service.setup(Some(&alice), &secret("first"), true).unwrap();
    let path = service.path_for(Some(&alice));
    let before = fs::read(&path).unwrap();

    let err = service.setup(Some(&alice), &secret("second"), false).unwrap_err();
    assert!(matches!(err, LockboxError::AlreadyExists { .. }));
    assert!(service.try_setup(Some(&alice), &secret("third"), true).unwrap().is_none());

    assert_eq!(fs::read(&path).unwrap(), before);
    assert!(service.unlock(Some(&alice), &secret("first"), false).is_ok());
}

#[test]
fn rewrap_keeps_dek_and_recovery_wrap() {
    let (_dir, service) = setup_service();

    let outcome = service.setup(None, &secret("old"), true).unwrap();
    let code = outcome.recovery_code.unwrap();
    let before = service.load_record(None).unwrap();

    service.rewrap(None, &secret("old"), &secret("new")).unwrap();
    let after = service.load_record(None).unwrap();

    assert_eq!(after.recovery_wrap, before.recovery_wrap);
    assert_ne!(after.primary_wrap, before.primary_wrap);
    assert_ne!(after.primary_wrap.salt, before.primary_wrap.salt);

    let dek = service.unlock(None, &secret("new"), false).unwrap();
    assert_eq!(dek.expose(), outcome.dek.expose());
    assert_eq!(
        service.unlock(None, &code.to_secret(), true).unwrap().expose(),
        outcome.dek.expose()
    );
}

#[test]
fn rewrap_with_wrong_password_changes_nothing() {
    let (_dir, service) = setup_service();
    service.setup(None, &secret("right"), false).unwrap();
    let before = fs::read(service.path_for(None)).unwrap();

    assert!(matches!(
        service.rewrap(None, &secret("wrong"), &secret("new")),
        Err(LockboxError::WrongSecret)
    ));
    assert_eq!(fs::read(service.path_for(None)).unwrap(), before);
}

#[test]
fn rotating_recovery_invalidates_old_code() {
    let (_dir, service) = setup_service();
    let bob = Identity::new("bob").unwrap();

    let outcome = service.setup(Some(&bob), &secret("pw"), true).unwrap();
    let old_code = outcome.recovery_code.unwrap();
    let primary_before = service.load_record(Some(&bob)).unwrap().primary_wrap;

    let new_code = service.rotate_recovery(Some(&bob), &secret("pw")).unwrap();
    assert_ne!(new_code.expose_secret(), old_code.expose_secret());

    assert!(matches!(
        service.unlock(Some(&bob), &old_code.to_secret(), true),
        Err(LockboxError::WrongSecret)
    ));
    assert_eq!(
        service.unlock(Some(&bob), &new_code.to_secret(), true).unwrap().expose(),
        outcome.dek.expose()
    );
    assert_eq!(service.load_record(Some(&bob)).unwrap().primary_wrap, primary_before);
}

#[test]
fn payload_survives_unlock_cycle() {
    let (_dir, service) = setup_service();
    let alice = Identity::new("alice").unwrap();

    let outcome = service.setup(Some(&alice), &secret("p@ss"), false).unwrap();
    let blob = outcome.dek.encrypt(b"api-token-123").unwrap();
    drop(outcome);

    let dek = service.unlock(Some(&alice), &secret("p@ss"), false).unwrap();
    assert_eq!(dek.decrypt(&blob).unwrap().as_slice(), b"api-token-123");

    let mut tampered = blob.clone();
    *tampered.last_mut().unwrap() ^= 0x01;
    assert!(matches!(dek.decrypt(&tampered), Err(LockboxError::Authentication)));
}

#[test]
fn unknown_identity_is_not_found() {
    let (_dir, service) = setup_service();
    service.setup(Some(&Identity::new("alice").unwrap()), &secret("pw"), false).unwrap();

    let bob = Identity::new("bob").unwrap();
    assert!(matches!(
        service.unlock(Some(&bob), &secret("pw"), false),
        Err(LockboxError::NotFound { .. })
    ));
    assert!(matches!(service.destroy(Some(&bob)), Err(LockboxError::NotFound { .. })));
}

#[test]
fn identities_are_isolated() {
    let (_dir, service) = setup_service();
    let alice = Identity::new("alice").unwrap();
    let bob = Identity::new("bob").unwrap();

    let a = service.setup(Some(&alice), &secret("shared"), false).unwrap();
    let b = service.setup(Some(&bob), &secret("shared"), false).unwrap();
    assert_ne!(a.dek.expose(), b.dek.expose());
    assert_ne!(a.path, b.path);

    service.destroy(Some(&alice)).unwrap();
    assert!(service.unlock(Some(&bob), &secret("shared"), false).is_ok());
}

#[test]
fn recovery_without_wrap_is_reported() {
    let (_dir, service) = setup_service();
    service.setup(None, &secret("pw"), false).unwrap();

    assert!(matches!(
        service.reset_with_recovery(None, &secret("0000"), &secret("new")),
        Err(LockboxError::NoRecoveryPath)
    ));
}

#[test]
fn tampered_file_is_wrong_secret_not_a_panic() {
    let (_dir, service) = setup_service();
    service.setup(None, &secret("pw"), false).unwrap();

    let path = service.path_for(None);
    let mut record = VaultRecord::from_json(&fs::read(&path).unwrap()).unwrap();
    record.primary_wrap.tag[0] ^= 0x80;
    fs::write(&path, record.to_json().unwrap()).unwrap();

    assert!(matches!(
        service.unlock(None, &secret("pw"), false),
        Err(LockboxError::WrongSecret)
    ));
}

#[test]
fn garbage_file_is_malformed() {
    let (_dir, service) = setup_service();
    service.setup(None, &secret("pw"), false).unwrap();
    fs::write(service.path_for(None), b"not json").unwrap();

    assert!(matches!(
        service.unlock(None, &secret("pw"), false),
        Err(LockboxError::MalformedRecord(_))
    ));
}

#[test]
fn observer_sees_every_mutation() {
    let dir = tempdir().unwrap();
    let observer = Arc::new(RecordingObserver::new());
    let service = KeyFileService::with_observer(VaultStore::new(dir.path()), observer.clone());

    service.setup(None, &secret("pw"), true).unwrap();
    service.rewrap(None, &secret("pw"), &secret("pw2")).unwrap();
    service.rotate_recovery(None, &secret("pw2")).unwrap();
    service.destroy(None).unwrap();

    // The tempdir already exists, so no DirectoryCreated event.
    let kinds: Vec<_> = observer.events().iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            VaultEventKind::Created,
            VaultEventKind::Rewrapped,
            VaultEventKind::RecoveryRotated,
            VaultEventKind::Destroyed,
        ]
    );
}

#[test]
fn concurrent_rewrap_and_rotation_never_lose_an_update() {
    let (_dir, service) = setup_service();
    service.setup(None, &secret("pw"), true).unwrap();
    let fingerprint = service.unlock(None, &secret("pw"), false).unwrap().fingerprint();

    let (rewrapped, rotated) = std::thread::scope(|s| {
        let rewrap = s.spawn(|| service.rewrap(None, &secret("pw"), &secret("pw2")));
        let rotate = s.spawn(|| service.rotate_recovery(None, &secret("pw")));
        (rewrap.join().unwrap(), rotate.join().unwrap())
    });

    // A losing writer fails loudly; it never reports success for a change
    // the other one overwrote.
    for err in [rewrapped.as_ref().err(), rotated.as_ref().err()].into_iter().flatten() {
        assert!(
            matches!(err, LockboxError::Conflict { .. } | LockboxError::WrongSecret),
            "unexpected error: {err}"
        );
    }
    assert!(rewrapped.is_ok() || rotated.is_ok());

    if rewrapped.is_ok() {
        let dek = service.unlock(None, &secret("pw2"), false).unwrap();
        assert_eq!(dek.fingerprint(), fingerprint);
    }
    if let Ok(code) = &rotated {
        let dek = service.unlock(None, &code.to_secret(), true).unwrap();
        assert_eq!(dek.fingerprint(), fingerprint);
    }
}
