// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! GPS Encryption Error Types
//!
//! Flat error taxonomy for the session encryption core.
//!
//! ## Error Variants
//!
//! - **Configuration**: master key missing or malformed at startup (fatal)
//! - **SessionNotFound**: session never created, terminated, or already reaped
//! - **SessionExpired**: session still in the store but past its expiry
//! - **KeyAgreement**: client public key rejected during session creation
//! - **EncryptionFailure**: serialization, validation, or AEAD sealing failed
//! - **DecryptionFailure**: any failure on the decrypt path
//!
//! `DecryptionFailure` carries no detail. A wrong key, a flipped bit, bad
//! base64 and bad JSON must all render the same text; the concrete cause is
//! only emitted at `debug` level.

use thiserror::Error;

/// Errors returned by the GPS encryption core
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GpsCryptoError {
    /// Master key or other startup configuration is missing/invalid
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    /// Session id is not present in the store
    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: String },

    /// Session id is present but past its expiry
    #[error("Session expired: {session_id}")]
    SessionExpired { session_id: String },

    /// Client public key could not be used for ECDH
    #[error("Key agreement failed: {reason}")]
    KeyAgreement { reason: String },

    /// Coordinates could not be validated, serialized or sealed
    #[error("Encryption failed: {reason}")]
    EncryptionFailure { reason: String },

    /// Envelope could not be opened
    #[error("Decryption failed")]
    DecryptionFailure,
}

impl GpsCryptoError {
    /// True when the caller has to re-run key agreement.
    ///
    /// Not-found and expired sessions are handled identically by callers;
    /// the distinction only exists for diagnostics.
    pub fn is_session_unavailable(&self) -> bool {
        matches!(
            self,
            GpsCryptoError::SessionNotFound { .. } | GpsCryptoError::SessionExpired { .. }
        )
    }

    pub(crate) fn configuration(reason: impl Into<String>) -> Self {
        GpsCryptoError::Configuration {
            reason: reason.into(),
        }
    }

    pub(crate) fn encryption(reason: impl Into<String>) -> Self {
        GpsCryptoError::EncryptionFailure {
            reason: reason.into(),
        }
    }

    pub(crate) fn key_agreement(reason: impl Into<String>) -> Self {
        GpsCryptoError::KeyAgreement {
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, GpsCryptoError>;
