// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Location encryption round trips, nonce freshness and session isolation

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{TimeZone, Utc};
use std::collections::HashSet;
use std::time::Duration;
use vip_gps_crypto::{
    Coordinates, EncryptionConfig, EphemeralKeyPair, GpsCryptoError, GpsEncryptionService,
    MasterKey,
};

fn new_service() -> GpsEncryptionService {
    GpsEncryptionService::new(EncryptionConfig::new(MasterKey::generate())).unwrap()
}

fn open_session(service: &GpsEncryptionService, ride_id: &str) -> String {
    let client = EphemeralKeyPair::generate();
    service
        .create_session(ride_id, &client.public_key_bytes(), Some(Duration::from_secs(3600)))
        .unwrap()
        .session_id
}

#[test]
fn test_ride_42_end_to_end() {
    let service = new_service();
    let session_id = open_session(&service, "ride-42");

    let coords = Coordinates::new(6.5244, 3.3792).with_accuracy(5.0);
    let envelope = service.encrypt_location(&coords, &session_id).unwrap();

    assert!(!envelope.encrypted_data.is_empty());
    assert!(envelope.ciphertext_bytes().unwrap().len() > 16);
    assert_eq!(envelope.nonce_bytes().unwrap().len(), 12);
    assert_eq!(envelope.nonce.len(), 16);
    assert_eq!(envelope.session_id, session_id);
    assert_eq!(envelope.ride_id, "ride-42");

    let recovered = service.decrypt_location(&envelope).unwrap();
    assert_eq!(recovered.latitude, 6.5244);
    assert_eq!(recovered.longitude, 3.3792);
    assert_eq!(recovered.accuracy, Some(5.0));
    assert_eq!(recovered, coords);
}

#[test]
fn test_envelope_survives_wire_transport() {
    let service = new_service();
    let session_id = open_session(&service, "ride-wire");

    let coords = Coordinates::new(40.7128, -74.006)
        .with_altitude(10.0)
        .with_speed(13.4)
        .with_heading(90.0)
        .with_accuracy(3.5)
        .with_timestamp(Utc.with_ymd_and_hms(2025, 6, 1, 8, 15, 0).unwrap());

    let json = service
        .encrypt_location(&coords, &session_id)
        .unwrap()
        .to_json()
        .unwrap();
    let envelope = vip_gps_crypto::EncryptedLocation::from_json(&json).unwrap();

    assert_eq!(service.decrypt_location(&envelope).unwrap(), coords);
}

#[test]
fn test_roundtrip_is_lossless_for_many_fixes() {
    let service = new_service();
    let session_id = open_session(&service, "ride-many");

    let fixes = [
        Coordinates::new(0.0, 0.0),
        Coordinates::new(-90.0, -180.0),
        Coordinates::new(90.0, 180.0),
        Coordinates::new(51.507_351_234_5, -0.127_758_123_4).with_accuracy(0.1),
        Coordinates::new(1e-12, -1e-12).with_speed(0.0).with_heading(359.999_999),
        Coordinates::new(35.6762, 139.6503).with_altitude(-12.75),
    ];

    for coords in &fixes {
        let envelope = service.encrypt_location(coords, &session_id).unwrap();
        let recovered = service.decrypt_location(&envelope).unwrap();
        assert_eq!(recovered.latitude.to_bits(), coords.latitude.to_bits());
        assert_eq!(recovered.longitude.to_bits(), coords.longitude.to_bits());
        assert_eq!(&recovered, coords);
    }

    let info = service.session_info(&session_id).unwrap();
    assert_eq!(info.locations_encrypted, fixes.len() as u64);
}

#[test]
fn test_nonces_never_repeat_within_session() {
    let service = new_service();
    let session_id = open_session(&service, "ride-nonce");
    let coords = Coordinates::new(6.5244, 3.3792);

    let mut seen = HashSet::new();
    for _ in 0..10_000 {
        let envelope = service.encrypt_location(&coords, &session_id).unwrap();
        assert!(seen.insert(envelope.nonce), "nonce collision");
    }
    assert_eq!(service.stats().locations_encrypted, 10_000);
}

#[test]
fn test_same_plaintext_differs_across_rides() {
    let service = new_service();
    let a = open_session(&service, "ride-a");
    let b = open_session(&service, "ride-b");
    let coords = Coordinates::new(6.5244, 3.3792).with_accuracy(5.0);

    let env_a = service.encrypt_location(&coords, &a).unwrap();
    let env_b = service.encrypt_location(&coords, &b).unwrap();

    assert_ne!(env_a.encrypted_data, env_b.encrypted_data);
    assert_ne!(env_a.nonce, env_b.nonce);
    assert_eq!(service.decrypt_location(&env_a).unwrap(), coords);
    assert_eq!(service.decrypt_location(&env_b).unwrap(), coords);
}

#[test]
fn test_envelope_not_portable_across_sessions() {
    let service = new_service();
    let a = open_session(&service, "ride-a");
    let b = open_session(&service, "ride-b");

    let mut envelope = service
        .encrypt_location(&Coordinates::new(10.0, 20.0), &a)
        .unwrap();

    // Re-label the envelope so it is interpreted under session B's key
    envelope.session_id = b;
    envelope.ride_id = "ride-b".to_string();

    assert_eq!(
        service.decrypt_location(&envelope),
        Err(GpsCryptoError::DecryptionFailure)
    );
}

#[test]
fn test_same_ride_sessions_are_isolated() {
    let service = new_service();
    let first = open_session(&service, "ride-same");
    let second = open_session(&service, "ride-same");

    let mut envelope = service
        .encrypt_location(&Coordinates::new(10.0, 20.0), &first)
        .unwrap();
    envelope.session_id = second;

    assert_eq!(
        service.decrypt_location(&envelope),
        Err(GpsCryptoError::DecryptionFailure)
    );
}

#[test]
fn test_decrypt_failures_are_indistinguishable() {
    let service = new_service();
    let session_id = open_session(&service, "ride-oracle");
    let good = service
        .encrypt_location(&Coordinates::new(1.0, 2.0), &session_id)
        .unwrap();

    let mut bad_base64 = good.clone();
    bad_base64.encrypted_data = "***not base64***".to_string();

    let mut short_nonce = good.clone();
    short_nonce.nonce = STANDARD.encode([0u8; 8]);

    let mut garbage = good.clone();
    garbage.encrypted_data = STANDARD.encode([0u8; 40]);

    let errors: Vec<String> = [bad_base64, short_nonce, garbage]
        .iter()
        .map(|env| service.decrypt_location(env).unwrap_err().to_string())
        .collect();

    assert!(errors.iter().all(|e| e == "Decryption failed"));
}
