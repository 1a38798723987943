// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Session Store
//!
//! In-memory storage of live encryption sessions, keyed by session id.
//! A single `RwLock` covers insert, lookup, removal and reaping; per-session
//! telemetry (location counter, last use) is updated atomically on entries
//! obtained under that lock.
//!
//! **Security**: Keys are stored in memory only and never persisted to disk.
//! A process restart invalidates every session.

use crate::crypto::{EphemeralKeyPair, GpsCryptoError, Result, SessionKey};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, TimeZone, Utc};
use rand::{rngs::OsRng, RngCore};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

/// Random bytes behind a session id (43 URL-safe characters once encoded)
const SESSION_ID_BYTES: usize = 32;

/// Generate a high-entropy, URL-safe session identifier
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// One ride-scoped encryption context
pub struct Session {
    id: String,
    ride_id: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    key: SessionKey,
    key_pair: EphemeralKeyPair,
    locations_encrypted: AtomicU64,
    last_used_ms: AtomicI64,
}

impl Session {
    pub fn new(
        id: String,
        ride_id: String,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        key: SessionKey,
        key_pair: EphemeralKeyPair,
    ) -> Self {
        Self {
            id,
            ride_id,
            created_at,
            expires_at,
            key,
            key_pair,
            locations_encrypted: AtomicU64::new(0),
            last_used_ms: AtomicI64::new(created_at.timestamp_millis()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn ride_id(&self) -> &str {
        &self.ride_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub(crate) fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Server's ephemeral public key (SEC1 compressed)
    pub fn public_key(&self) -> Vec<u8> {
        self.key_pair.public_key_bytes()
    }

    pub fn locations_encrypted(&self) -> u64 {
        self.locations_encrypted.load(Ordering::Relaxed)
    }

    pub fn last_used_at(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.last_used_ms.load(Ordering::Relaxed))
            .single()
            .unwrap_or(self.created_at)
    }

    /// A session expires at `expires_at` exactly; a zero TTL is born expired
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Bump the location counter and last-used time after a successful seal
    pub(crate) fn record_encryption(&self) -> u64 {
        self.last_used_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
        self.locations_encrypted.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Metadata snapshot; never contains key material
    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            session_id: self.id.clone(),
            ride_id: self.ride_id.clone(),
            created_at: self.created_at,
            expires_at: self.expires_at,
            last_used_at: self.last_used_at(),
            locations_encrypted: self.locations_encrypted(),
            expired: self.is_expired(),
        }
    }
}

/// Public metadata for one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub ride_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
    pub locations_encrypted: u64,
    pub expired: bool,
}

/// Thread-safe map of live sessions
///
/// # Example
///
/// ```ignore
/// let store = SessionStore::new();
/// store.insert(session);
/// let session = store.get(&session_id)?;
/// store.remove(&session_id);
/// ```
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Arc<Session>>>>,
    reaped_total: Arc<AtomicU64>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a freshly created session
    pub fn insert(&self, session: Session) -> Arc<Session> {
        let session = Arc::new(session);
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.insert(session.id.clone(), session.clone());
        debug!(
            session_id = %session.id,
            total = sessions.len(),
            "Session stored"
        );
        session
    }

    /// Look up a session that is still usable
    ///
    /// Expiry is enforced here, independently of the reaper.
    pub fn get(&self, session_id: &str) -> Result<Arc<Session>> {
        let session = {
            let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
            sessions.get(session_id).cloned()
        };

        match session {
            Some(session) if session.is_expired() => {
                warn!(session_id = %session_id, "⚠️  Rejected use of expired session");
                Err(GpsCryptoError::SessionExpired {
                    session_id: session_id.to_string(),
                })
            }
            Some(session) => Ok(session),
            None => Err(GpsCryptoError::SessionNotFound {
                session_id: session_id.to_string(),
            }),
        }
    }

    /// Remove a session; returns whether it existed
    pub fn remove(&self, session_id: &str) -> bool {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.remove(session_id).is_some()
    }

    /// Metadata for a session still in the store, expired or not
    pub fn info(&self, session_id: &str) -> Option<SessionInfo> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions.get(session_id).map(|s| s.info())
    }

    /// Remove every session whose expiry has passed
    ///
    /// Returns the number of sessions removed.
    pub fn reap_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired_at(now));
        let reaped = before - sessions.len();

        if reaped > 0 {
            self.reaped_total.fetch_add(reaped as u64, Ordering::Relaxed);
            debug!(reaped, remaining = sessions.len(), "Expired sessions reaped");
        }
        reaped
    }

    /// Number of sessions in the store (including expired, unreaped ones)
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total sessions removed by [`SessionStore::reap_expired`]
    pub fn reaped_total(&self) -> u64 {
        self.reaped_total.load(Ordering::Relaxed)
    }
}
