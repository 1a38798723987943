// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Session Lifecycle Integration Tests
//!
//! ACTIVE → EXPIRED and ACTIVE → TERMINATED are final; every operation on a
//! non-active session must fail closed.

use std::time::Duration;
use vip_gps_crypto::{
    Coordinates, EncryptionConfig, EphemeralKeyPair, GpsCryptoError, GpsEncryptionService,
    MasterKey,
};

fn new_service() -> GpsEncryptionService {
    GpsEncryptionService::new(EncryptionConfig::new(MasterKey::generate())).unwrap()
}

fn client_key() -> Vec<u8> {
    EphemeralKeyPair::generate().public_key_bytes()
}

#[test]
fn test_zero_ttl_rejected_before_reaper_runs() {
    let service = new_service();
    let handshake = service
        .create_session("ride-expired", &client_key(), Some(Duration::ZERO))
        .unwrap();
    let id = handshake.session_id;

    let result = service.encrypt_location(&Coordinates::new(1.0, 1.0), &id);
    let err = result.unwrap_err();
    assert_eq!(
        err,
        GpsCryptoError::SessionExpired {
            session_id: id.clone()
        }
    );
    assert!(err.is_session_unavailable());

    assert!(service.session_info(&id).is_none());
    assert!(service.public_key(&id).is_none());

    // Still physically present until swept
    assert_eq!(service.stats().active_sessions, 1);
}

#[test]
fn test_expired_session_cannot_decrypt_old_envelopes() {
    let service = new_service();
    let handshake = service
        .create_session("ride-short", &client_key(), Some(Duration::from_millis(200)))
        .unwrap();

    let envelope = service
        .encrypt_location(&Coordinates::new(6.5244, 3.3792), &handshake.session_id)
        .unwrap();
    assert!(service.decrypt_location(&envelope).is_ok());

    std::thread::sleep(Duration::from_millis(300));

    assert!(matches!(
        service.decrypt_location(&envelope),
        Err(GpsCryptoError::SessionExpired { .. })
    ));

    assert_eq!(service.reap_expired(), 1);
    assert!(matches!(
        service.decrypt_location(&envelope),
        Err(GpsCryptoError::SessionNotFound { .. })
    ));
}

#[test]
fn test_termination_is_final() {
    let service = new_service();
    let handshake = service
        .create_session("ride-term", &client_key(), None)
        .unwrap();
    let id = handshake.session_id;

    let envelope = service
        .encrypt_location(&Coordinates::new(6.5244, 3.3792), &id)
        .unwrap();

    assert!(service.terminate_session(&id));

    assert!(matches!(
        service.encrypt_location(&Coordinates::new(6.5244, 3.3792), &id),
        Err(GpsCryptoError::SessionNotFound { .. })
    ));
    assert!(matches!(
        service.decrypt_location(&envelope),
        Err(GpsCryptoError::SessionNotFound { .. })
    ));
    assert!(service.session_info(&id).is_none());
    assert!(service.public_key(&id).is_none());

    // Second terminate is a no-op, not an error
    assert!(!service.terminate_session(&id));
    assert_eq!(service.stats().sessions_terminated, 1);
}

#[test]
fn test_unknown_session_rejected() {
    let service = new_service();
    let err = service
        .encrypt_location(&Coordinates::new(0.0, 0.0), "never-created")
        .unwrap_err();
    assert!(matches!(err, GpsCryptoError::SessionNotFound { .. }));
    assert!(!service.terminate_session("never-created"));
}

#[test]
fn test_session_info_exposes_no_secrets() {
    let service = new_service();
    let handshake = service
        .create_session("ride-info", &client_key(), Some(Duration::from_secs(7200)))
        .unwrap();

    for _ in 0..3 {
        service
            .encrypt_location(&Coordinates::new(6.5, 3.3), &handshake.session_id)
            .unwrap();
    }

    let info = service.session_info(&handshake.session_id).unwrap();
    assert_eq!(info.ride_id, "ride-info");
    assert_eq!(info.locations_encrypted, 3);
    assert_eq!(info.expires_at, handshake.expires_at);
    assert!(!info.expired);
    assert!(info.last_used_at >= info.created_at - chrono::Duration::milliseconds(1));

    let json = serde_json::to_value(&info).unwrap();
    let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
    assert!(keys.iter().all(|k| !k.contains("key")));
}
