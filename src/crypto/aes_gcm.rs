// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! AES-256-GCM Sealing for Location Payloads
//!
//! Thin AEAD layer used by the encryption service:
//!
//! - Algorithm: AES-256-GCM
//! - Nonce: 12 bytes (96 bits), drawn from `OsRng` on every call
//! - Ciphertext: encrypted payload + 16-byte authentication tag
//! - No Additional Authenticated Data (AAD)
//!
//! **CRITICAL**: nonces are never cached or derived from counters. Reusing a
//! nonce under the same key breaks both confidentiality and authenticity.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use anyhow::{anyhow, Result};
use rand::{rngs::OsRng, RngCore};

/// GCM nonce size in bytes
pub const NONCE_LEN: usize = 12;

/// GCM authentication tag size in bytes
pub const TAG_LEN: usize = 16;

/// Encrypt `plaintext` under `key` with a fresh random nonce
///
/// # Returns
///
/// `(nonce, ciphertext)` where ciphertext has the 16-byte tag appended
pub fn seal(key: &[u8; 32], plaintext: &[u8]) -> Result<([u8; NONCE_LEN], Vec<u8>)> {
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut nonce_bytes)
        .map_err(|e| anyhow!("Nonce generation failed: {}", e))?;

    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| anyhow!("Failed to create AES-GCM cipher: {}", e))?;

    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce_bytes),
            Payload {
                msg: plaintext,
                aad: b"",
            },
        )
        .map_err(|e| anyhow!("AES-GCM encryption failed: {}", e))?;

    Ok((nonce_bytes, ciphertext))
}

/// Decrypt and authenticate `ciphertext` under `key`
///
/// # Errors
///
/// Returns error if:
/// - nonce is not 12 bytes
/// - ciphertext is shorter than the authentication tag
/// - authentication tag verification fails (wrong key or tampered data)
pub fn open(key: &[u8; 32], nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if nonce.len() != NONCE_LEN {
        return Err(anyhow!(
            "Invalid nonce size: expected {} bytes, got {}",
            NONCE_LEN,
            nonce.len()
        ));
    }

    if ciphertext.len() < TAG_LEN {
        return Err(anyhow!(
            "Ciphertext too short: expected at least {} bytes, got {}",
            TAG_LEN,
            ciphertext.len()
        ));
    }

    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| anyhow!("Failed to create AES-GCM cipher: {}", e))?;

    cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad: b"",
            },
        )
        .map_err(|e| {
            anyhow!(
                "AES-GCM decryption failed (authentication error - wrong key or corrupted data): {}",
                e
            )
        })
}
