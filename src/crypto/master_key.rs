// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Server Master Key Loading
//!
//! The master key is the long-lived server secret mixed into every session
//! key derivation (as the HKDF salt). It is read from the
//! `GPS_ENCRYPTION_MASTER_KEY` environment variable at startup.
//!
//! ## Accepted formats
//!
//! - `0x` followed by exactly 64 hex characters: decoded to 32 raw bytes
//! - anything else: taken as UTF-8 bytes, truncated to 32 bytes or padded
//!   with ASCII `'0'` up to 32 bytes
//!
//! ## Security Considerations
//!
//! - The key is NEVER logged; `Debug` output is redacted
//! - The key bytes are zeroized on drop
//! - A missing or empty variable is a fatal `Configuration` error

use super::error::{GpsCryptoError, Result};
use std::env;
use std::fmt;
use tracing::info;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Environment variable holding the master key
pub const MASTER_KEY_ENV: &str = "GPS_ENCRYPTION_MASTER_KEY";

/// Master key length in bytes (AES-256 key material)
pub const MASTER_KEY_LEN: usize = 32;

const PAD_BYTE: u8 = b'0';

/// 32-byte server master key
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey([u8; MASTER_KEY_LEN]);

impl MasterKey {
    /// Wrap raw key bytes
    pub fn from_bytes(bytes: [u8; MASTER_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse a configured secret string into a master key
    ///
    /// # Errors
    ///
    /// - secret is empty (after trimming)
    /// - secret has a `0x` prefix but is not 64 valid hex characters
    pub fn parse(secret: &str) -> Result<Self> {
        let secret = secret.trim();
        if secret.is_empty() {
            return Err(GpsCryptoError::configuration(format!(
                "{} is empty",
                MASTER_KEY_ENV
            )));
        }

        if let Some(hex_str) = secret.strip_prefix("0x") {
            if hex_str.len() != MASTER_KEY_LEN * 2 {
                return Err(GpsCryptoError::configuration(format!(
                    "{} hex form must be exactly 64 hex characters (32 bytes), got {} characters",
                    MASTER_KEY_ENV,
                    hex_str.len()
                )));
            }
            let mut decoded = hex::decode(hex_str).map_err(|e| {
                GpsCryptoError::configuration(format!(
                    "{} contains invalid hex characters: {}",
                    MASTER_KEY_ENV, e
                ))
            })?;
            let mut key = [0u8; MASTER_KEY_LEN];
            key.copy_from_slice(&decoded);
            decoded.zeroize();
            return Ok(Self(key));
        }

        let mut key = [PAD_BYTE; MASTER_KEY_LEN];
        let raw = secret.as_bytes();
        let take = raw.len().min(MASTER_KEY_LEN);
        key[..take].copy_from_slice(&raw[..take]);
        Ok(Self(key))
    }

    /// Load the master key from `GPS_ENCRYPTION_MASTER_KEY`
    pub fn from_env() -> Result<Self> {
        let secret = env::var(MASTER_KEY_ENV).map_err(|_| {
            GpsCryptoError::configuration(format!(
                "{} environment variable not set",
                MASTER_KEY_ENV
            ))
        })?;

        let key = Self::parse(&secret)?;

        // Log success WITHOUT logging the actual key
        info!("✅ GPS master key loaded ({} bytes)", MASTER_KEY_LEN);
        Ok(key)
    }

    /// Generate a random master key (used by the CLI and tests)
    pub fn generate() -> Self {
        use rand::{rngs::OsRng, RngCore};

        let mut key = [0u8; MASTER_KEY_LEN];
        OsRng.fill_bytes(&mut key);
        Self(key)
    }

    /// `0x`-prefixed hex form accepted by [`MasterKey::parse`]
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub(crate) fn as_bytes(&self) -> &[u8; MASTER_KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey([REDACTED])")
    }
}
