// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! VIP GPS Encryption Core
//!
//! Per-ride, session-scoped encryption of location telemetry: ephemeral ECDH
//! key agreement, HKDF-SHA256 key derivation and AES-256-GCM sealing, with
//! in-memory session lifecycle and expiry.

pub mod cli;
pub mod config;
pub mod crypto;
pub mod location;
pub mod service;
pub mod session;
pub mod version;

pub use config::EncryptionConfig;
pub use crypto::{EphemeralKeyPair, GpsCryptoError, MasterKey, Result};
pub use location::{Coordinates, EncryptedLocation};
pub use service::{GpsEncryptionService, ServiceStats, SessionHandshake};
pub use session::SessionInfo;
