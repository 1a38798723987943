// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Encrypted location envelope
//!
//! **Wire format** (JSON):
//! ```text
//! {
//!   "encrypted_data": base64(ciphertext || tag),
//!   "nonce":          base64(12-byte nonce),
//!   "timestamp":      ISO-8601,
//!   "session_id":     string,
//!   "ride_id":        string
//! }
//! ```

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sealed GPS fix bound to one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedLocation {
    /// Base64 ciphertext with the GCM tag appended
    pub encrypted_data: String,
    /// Base64 12-byte nonce
    pub nonce: String,
    /// Time of encryption
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub ride_id: String,
}

impl EncryptedLocation {
    pub(crate) fn from_parts(
        ciphertext: &[u8],
        nonce: &[u8],
        session_id: &str,
        ride_id: &str,
    ) -> Self {
        Self {
            encrypted_data: STANDARD.encode(ciphertext),
            nonce: STANDARD.encode(nonce),
            timestamp: Utc::now(),
            session_id: session_id.to_string(),
            ride_id: ride_id.to_string(),
        }
    }

    /// Decoded ciphertext bytes
    pub fn ciphertext_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.encrypted_data)
    }

    /// Decoded nonce bytes
    pub fn nonce_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.nonce)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
