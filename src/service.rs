// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! GPS Encryption Service
//!
//! Session lifecycle manager for VIP ride telemetry. Owns the session store,
//! the reaper and the master key, and exposes the operations the HTTP layer
//! calls into:
//!
//! - `create_session`: ECDH with the client key, returns the server public key
//! - `encrypt_location` / `decrypt_location`: AES-256-GCM over canonical JSON
//! - `terminate_session`, `session_info`, `public_key`, `stats`
//!
//! ## Session states
//!
//! ```text
//! ACTIVE ──(expires_at reached)──▶ EXPIRED
//!    └────(terminate_session)────▶ TERMINATED
//! ```
//!
//! Both transitions are final. Every operation fails closed unless the
//! session is ACTIVE.
//!
//! The service is constructed explicitly by the hosting application and
//! shared as `Arc<GpsEncryptionService>`; there is no process-wide instance.
//! Tier-based authorization (VIP only) is enforced by the caller.

use crate::config::EncryptionConfig;
use crate::crypto::{self, EphemeralKeyPair, GpsCryptoError, MasterKey, Result};
use crate::location::{Coordinates, EncryptedLocation};
use crate::session::{generate_session_id, Session, SessionInfo, SessionReaper, SessionStore};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info};

/// Result of a successful session creation, returned to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionHandshake {
    pub session_id: String,
    pub ride_id: String,
    /// Server's ephemeral public key, SEC1 compressed (33 bytes); hex on the wire
    #[serde(serialize_with = "serialize_hex")]
    pub server_public_key: Vec<u8>,
    pub expires_at: DateTime<Utc>,
}

impl SessionHandshake {
    pub fn server_public_key_hex(&self) -> String {
        hex::encode(&self.server_public_key)
    }
}

fn serialize_hex<S>(bytes: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&hex::encode(bytes))
}

/// Service-wide counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServiceStats {
    /// Sessions currently in the store (expired but unreaped included)
    pub active_sessions: usize,
    pub sessions_created: u64,
    pub sessions_terminated: u64,
    pub sessions_reaped: u64,
    pub locations_encrypted: u64,
}

pub struct GpsEncryptionService {
    master_key: MasterKey,
    default_ttl: Duration,
    store: SessionStore,
    reaper: SessionReaper,
    sessions_created: AtomicU64,
    sessions_terminated: AtomicU64,
    locations_encrypted: AtomicU64,
}

impl GpsEncryptionService {
    pub fn new(config: EncryptionConfig) -> Result<Self> {
        config.validate()?;

        let store = SessionStore::new();
        let reaper = SessionReaper::new(store.clone(), config.reap_interval);

        Ok(Self {
            master_key: config.master_key,
            default_ttl: config.default_ttl,
            store,
            reaper,
            sessions_created: AtomicU64::new(0),
            sessions_terminated: AtomicU64::new(0),
            locations_encrypted: AtomicU64::new(0),
        })
    }

    /// Build from `GPS_ENCRYPTION_MASTER_KEY` and friends
    pub fn from_env() -> Result<Self> {
        Self::new(EncryptionConfig::from_env()?)
    }

    /// Start the background reaper (idempotent, needs a tokio runtime)
    pub fn start_reaper(&self) -> Result<bool> {
        self.reaper.start()
    }

    pub fn reaper_running(&self) -> bool {
        self.reaper.is_running()
    }

    /// Stop the background reaper
    ///
    /// Live sessions stay usable until they expire.
    pub async fn shutdown(&self) {
        self.reaper.shutdown().await;
    }

    /// Create an encryption session for a ride
    ///
    /// Generates the server's ephemeral key pair, completes ECDH with the
    /// client's public key and derives the session key.
    ///
    /// # Arguments
    ///
    /// * `ride_id` - Ride the session belongs to
    /// * `client_public_key` - Client's SEC1 public key (33 or 65 bytes)
    /// * `ttl` - Session lifetime; `None` uses the configured default (24h)
    ///
    /// # Errors
    ///
    /// - `KeyAgreement` if the ride id is empty or the client key is invalid
    /// - `Configuration` if the TTL cannot be represented
    pub fn create_session(
        &self,
        ride_id: &str,
        client_public_key: &[u8],
        ttl: Option<Duration>,
    ) -> Result<SessionHandshake> {
        if ride_id.trim().is_empty() {
            return Err(GpsCryptoError::key_agreement("ride id must not be empty"));
        }

        let ttl = ttl.unwrap_or(self.default_ttl);
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|_| GpsCryptoError::configuration("session TTL out of range"))?;

        let session_id = generate_session_id();
        let key_pair = EphemeralKeyPair::generate();
        let key =
            key_pair.derive_session_key(client_public_key, &self.master_key, ride_id, &session_id)?;

        let created_at = Utc::now();
        let expires_at = created_at
            .checked_add_signed(ttl)
            .ok_or_else(|| GpsCryptoError::configuration("session TTL out of range"))?;

        let session = self.store.insert(Session::new(
            session_id,
            ride_id.to_string(),
            created_at,
            expires_at,
            key,
            key_pair,
        ));
        self.sessions_created.fetch_add(1, Ordering::Relaxed);

        info!(
            session_id = %session.id(),
            ride_id = %ride_id,
            expires_at = %expires_at.to_rfc3339(),
            "🔑 GPS encryption session created"
        );

        Ok(SessionHandshake {
            session_id: session.id().to_string(),
            ride_id: ride_id.to_string(),
            server_public_key: session.public_key(),
            expires_at,
        })
    }

    /// Encrypt one GPS fix under the session's key
    pub fn encrypt_location(
        &self,
        coordinates: &Coordinates,
        session_id: &str,
    ) -> Result<EncryptedLocation> {
        let session = self.store.get(session_id)?;

        let plaintext = coordinates.to_canonical_json()?;
        let (nonce, ciphertext) = crypto::seal(session.key().as_bytes(), plaintext.as_bytes())
            .map_err(|e| GpsCryptoError::encryption(e.to_string()))?;

        let count = session.record_encryption();
        self.locations_encrypted.fetch_add(1, Ordering::Relaxed);
        debug!(session_id = %session_id, count, "Location encrypted");

        Ok(EncryptedLocation::from_parts(
            &ciphertext,
            &nonce,
            session.id(),
            session.ride_id(),
        ))
    }

    /// Decrypt an envelope produced by [`GpsEncryptionService::encrypt_location`]
    ///
    /// Only possible while the originating session is live. Every failure
    /// after the session lookup is reported as the same `DecryptionFailure`.
    pub fn decrypt_location(&self, envelope: &EncryptedLocation) -> Result<Coordinates> {
        let session = self.store.get(&envelope.session_id)?;

        self.open_envelope(&session, envelope).map_err(|reason| {
            debug!(
                session_id = %envelope.session_id,
                reason = %reason,
                "Location decryption failed"
            );
            GpsCryptoError::DecryptionFailure
        })
    }

    fn open_envelope(
        &self,
        session: &Session,
        envelope: &EncryptedLocation,
    ) -> std::result::Result<Coordinates, String> {
        if envelope.ride_id != session.ride_id() {
            return Err("ride id does not match session".to_string());
        }

        let ciphertext = envelope
            .ciphertext_bytes()
            .map_err(|e| format!("ciphertext base64: {}", e))?;
        let nonce = envelope
            .nonce_bytes()
            .map_err(|e| format!("nonce base64: {}", e))?;

        let plaintext = crypto::open(session.key().as_bytes(), &nonce, &ciphertext)
            .map_err(|e| e.to_string())?;

        Coordinates::from_canonical_json(&plaintext).map_err(|e| format!("payload json: {}", e))
    }

    /// Terminate a session; `false` if it was already gone
    pub fn terminate_session(&self, session_id: &str) -> bool {
        let removed = self.store.remove(session_id);
        if removed {
            self.sessions_terminated.fetch_add(1, Ordering::Relaxed);
            info!(session_id = %session_id, "🗑️  GPS encryption session terminated");
        }
        removed
    }

    /// Metadata for an ACTIVE session; `None` once expired or terminated
    pub fn session_info(&self, session_id: &str) -> Option<SessionInfo> {
        self.store.get(session_id).ok().map(|s| s.info())
    }

    /// Server's ephemeral public key for an ACTIVE session
    pub fn public_key(&self, session_id: &str) -> Option<Vec<u8>> {
        self.store.get(session_id).ok().map(|s| s.public_key())
    }

    /// Run one reaper sweep synchronously
    pub fn reap_expired(&self) -> usize {
        self.store.reap_expired()
    }

    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            active_sessions: self.store.len(),
            sessions_created: self.sessions_created.load(Ordering::Relaxed),
            sessions_terminated: self.sessions_terminated.load(Ordering::Relaxed),
            sessions_reaped: self.store.reaped_total(),
            locations_encrypted: self.locations_encrypted.load(Ordering::Relaxed),
        }
    }
}
