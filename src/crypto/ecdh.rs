// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ECDH Session Key Agreement
//!
//! Implements Elliptic Curve Diffie-Hellman key agreement on secp256k1 and
//! HKDF-SHA256 session key derivation. Every session gets its own ephemeral
//! server key pair; the client contributes its own public key at session
//! creation.
//!
//! ## Derivation
//!
//! ```text
//! shared  = ECDH(own_secret, peer_public)
//! key     = HKDF-SHA256(salt = master_key, ikm = shared.x,
//!                       info = "vip-gps-session:v1:" || ride_id || ":" || session_id)
//! ```
//!
//! The derivation is symmetric: the server (ephemeral secret × client public)
//! and the client (client secret × server public) arrive at the same 32 bytes,
//! provided both use the same master key, ride id and session id.

use super::error::{GpsCryptoError, Result};
use super::master_key::MasterKey;
use hkdf::Hkdf;
use k256::{elliptic_curve::sec1::ToEncodedPoint, PublicKey, SecretKey};
use rand::rngs::OsRng;
use sha2::Sha256;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// HKDF info prefix; bumping the version invalidates every derived key
pub const KDF_INFO_PREFIX: &str = "vip-gps-session:v1";

/// Session key length in bytes (AES-256)
pub const SESSION_KEY_LEN: usize = 32;

/// Symmetric key shared by the two ends of one session
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey([u8; SESSION_KEY_LEN]);

impl SessionKey {
    pub fn as_bytes(&self) -> &[u8; SESSION_KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey([REDACTED])")
    }
}

/// Ephemeral secp256k1 key pair
///
/// Used on the server side (one per session) and by clients through
/// [`EphemeralKeyPair::derive_session_key`]. The secret scalar is never exposed.
pub struct EphemeralKeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl EphemeralKeyPair {
    /// Generate a fresh key pair from the OS RNG
    pub fn generate() -> Self {
        let secret = SecretKey::random(&mut OsRng);
        let public = secret.public_key();
        Self { secret, public }
    }

    /// SEC1 compressed public key (33 bytes)
    pub fn public_key_bytes(&self) -> Vec<u8> {
        self.public.to_encoded_point(true).as_bytes().to_vec()
    }

    /// Perform ECDH with the peer's public key and derive the session key
    ///
    /// # Arguments
    ///
    /// * `peer_public` - Peer's public key (33 bytes compressed or 65 bytes uncompressed)
    /// * `master_key` - Server master key, used as HKDF salt
    /// * `ride_id` - Ride the session belongs to
    /// * `session_id` - Session identifier
    ///
    /// # Errors
    ///
    /// Returns `KeyAgreement` if the peer key has the wrong size or is not a
    /// valid curve point.
    pub fn derive_session_key(
        &self,
        peer_public: &[u8],
        master_key: &MasterKey,
        ride_id: &str,
        session_id: &str,
    ) -> Result<SessionKey> {
        let peer = parse_public_key(peer_public)?;

        // shared_point = peer_pub * own_secret
        let shared_secret =
            k256::ecdh::diffie_hellman(self.secret.to_nonzero_scalar(), peer.as_affine());

        let info = kdf_info(ride_id, session_id);
        let hkdf = Hkdf::<Sha256>::new(
            Some(master_key.as_bytes().as_slice()),
            shared_secret.raw_secret_bytes(),
        );
        let mut derived = [0u8; SESSION_KEY_LEN];
        hkdf.expand(info.as_bytes(), &mut derived)
            .map_err(|e| GpsCryptoError::key_agreement(format!("HKDF expansion failed: {}", e)))?;

        let key = SessionKey(derived);
        derived.zeroize();
        Ok(key)
    }
}

impl fmt::Debug for EphemeralKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EphemeralKeyPair")
            .field("public", &hex::encode(self.public_key_bytes()))
            .finish_non_exhaustive()
    }
}

/// Parse and validate a SEC1-encoded secp256k1 public key
pub fn parse_public_key(bytes: &[u8]) -> Result<PublicKey> {
    if bytes.len() != 33 && bytes.len() != 65 {
        return Err(GpsCryptoError::key_agreement(format!(
            "Invalid public key size: expected 33 or 65 bytes, got {}",
            bytes.len()
        )));
    }

    PublicKey::from_sec1_bytes(bytes)
        .map_err(|_| GpsCryptoError::key_agreement("Invalid public key point"))
}

fn kdf_info(ride_id: &str, session_id: &str) -> String {
    format!("{}:{}:{}", KDF_INFO_PREFIX, ride_id, session_id)
}
