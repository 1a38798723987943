// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Session state: the in-memory store and its background reaper.

pub mod reaper;
pub mod store;

pub use reaper::{SessionReaper, DEFAULT_REAP_INTERVAL};
pub use store::{generate_session_id, Session, SessionInfo, SessionStore};
