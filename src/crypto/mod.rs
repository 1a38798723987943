// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! GPS Encryption Primitives
//!
//! This module implements the cryptographic building blocks of the VIP GPS
//! encryption core:
//!
//! - **ECDH**: Per-session ephemeral key agreement on secp256k1
//! - **HKDF**: Session key derivation bound to master key, ride and session
//! - **AES-GCM**: AES-256-GCM sealing with a fresh 96-bit nonce per call
//! - **Master Key**: Loading and normalization of the server secret
//!
//! ## Security Considerations
//!
//! - Session keys are stored in memory only, never persisted
//! - Nonces must be unique per encryption operation
//! - Key material is zeroized on drop and never logged
//!
//! ## Protocol Flow
//!
//! 1. Client generates a key pair and sends its public key with the ride id
//! 2. Node generates an ephemeral key pair for the new session
//! 3. Node performs ECDH and derives the session key with HKDF-SHA256
//! 4. Node returns session id + its ephemeral public key
//! 5. Client performs the mirror ECDH and derives the same session key
//! 6. Every location fix is sealed with AES-256-GCM under the session key

pub mod aes_gcm;
pub mod ecdh;
pub mod error;
pub mod master_key;

pub use aes_gcm::{open, seal, NONCE_LEN};
pub use ecdh::{parse_public_key, EphemeralKeyPair, SessionKey};
pub use error::{GpsCryptoError, Result};
pub use master_key::{MasterKey, MASTER_KEY_ENV};
