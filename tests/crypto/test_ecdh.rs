// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tests for ECDH session key agreement
//!
//! The server derives the session key from its ephemeral secret and the
//! client's public key; the client must reach the same key from the other
//! direction.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use vip_gps_crypto::crypto::{parse_public_key, EphemeralKeyPair, GpsCryptoError, MasterKey};
use vip_gps_crypto::{EncryptionConfig, GpsEncryptionService};

#[test]
fn test_client_derives_server_session_key() {
    let master = MasterKey::generate();
    let service = GpsEncryptionService::new(EncryptionConfig::new(master.clone())).unwrap();
    let client = EphemeralKeyPair::generate();

    let handshake = service
        .create_session("ride-ecdh", &client.public_key_bytes(), None)
        .unwrap();
    assert_eq!(handshake.server_public_key.len(), 33);
    assert_eq!(
        service.public_key(&handshake.session_id),
        Some(handshake.server_public_key.clone())
    );

    // Client side derivation from the handshake response
    let client_key = client
        .derive_session_key(
            &handshake.server_public_key,
            &master,
            &handshake.ride_id,
            &handshake.session_id,
        )
        .unwrap();

    // Client seals a fix with its own copy of the key; server must open it
    let coords = vip_gps_crypto::Coordinates::new(48.8566, 2.3522).with_speed(8.5);
    let plaintext = coords.to_canonical_json().unwrap();
    let (nonce, ciphertext) =
        vip_gps_crypto::crypto::seal(client_key.as_bytes(), plaintext.as_bytes()).unwrap();

    let envelope = vip_gps_crypto::EncryptedLocation {
        encrypted_data: STANDARD.encode(&ciphertext),
        nonce: STANDARD.encode(nonce),
        timestamp: chrono::Utc::now(),
        session_id: handshake.session_id.clone(),
        ride_id: handshake.ride_id.clone(),
    };
    assert_eq!(service.decrypt_location(&envelope).unwrap(), coords);
}

#[test]
fn test_wrong_master_key_cannot_derive_session_key() {
    let service = GpsEncryptionService::new(EncryptionConfig::new(MasterKey::generate())).unwrap();
    let client = EphemeralKeyPair::generate();
    let handshake = service
        .create_session("ride-m", &client.public_key_bytes(), None)
        .unwrap();

    let outsider_key = client
        .derive_session_key(
            &handshake.server_public_key,
            &MasterKey::generate(),
            &handshake.ride_id,
            &handshake.session_id,
        )
        .unwrap();

    let plaintext = vip_gps_crypto::Coordinates::new(1.0, 1.0)
        .to_canonical_json()
        .unwrap();
    let (nonce, ciphertext) =
        vip_gps_crypto::crypto::seal(outsider_key.as_bytes(), plaintext.as_bytes()).unwrap();

    let envelope = vip_gps_crypto::EncryptedLocation {
        encrypted_data: STANDARD.encode(&ciphertext),
        nonce: STANDARD.encode(nonce),
        timestamp: chrono::Utc::now(),
        session_id: handshake.session_id,
        ride_id: handshake.ride_id,
    };
    assert_eq!(
        service.decrypt_location(&envelope),
        Err(GpsCryptoError::DecryptionFailure)
    );
}

#[test]
fn test_invalid_client_public_key_rejected() {
    let service = GpsEncryptionService::new(EncryptionConfig::new(MasterKey::generate())).unwrap();

    let too_short = service.create_session("ride-1", &[0u8; 20], None);
    assert!(matches!(too_short, Err(GpsCryptoError::KeyAgreement { .. })));

    let not_a_point = service.create_session("ride-1", &[0xFF; 33], None);
    assert!(matches!(not_a_point, Err(GpsCryptoError::KeyAgreement { .. })));

    assert_eq!(service.stats().sessions_created, 0);
}

#[test]
fn test_each_session_gets_fresh_server_key() {
    let service = GpsEncryptionService::new(EncryptionConfig::new(MasterKey::generate())).unwrap();
    let client = EphemeralKeyPair::generate();
    let pk = client.public_key_bytes();

    let a = service.create_session("ride-1", &pk, None).unwrap();
    let b = service.create_session("ride-1", &pk, None).unwrap();

    assert_ne!(a.session_id, b.session_id);
    assert_ne!(a.server_public_key, b.server_public_key);
    assert!(parse_public_key(&a.server_public_key).is_ok());
}
