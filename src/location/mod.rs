// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Location data model: plaintext GPS fixes and their encrypted envelopes.

pub mod coordinates;
pub mod envelope;

pub use coordinates::Coordinates;
pub use envelope::EncryptedLocation;
