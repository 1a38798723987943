// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Background reaper for expired sessions.
//!
//! Runs [`SessionStore::reap_expired`] on a fixed interval until cancelled.
//! `start()` is idempotent; `shutdown()` cancels the task and waits for it.

use super::store::SessionStore;
use crate::crypto::{GpsCryptoError, Result};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Default sweep interval (5 minutes)
pub const DEFAULT_REAP_INTERVAL: Duration = Duration::from_secs(300);

struct RunningReaper {
    cancel_token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Periodic sweeper owned by the encryption service
pub struct SessionReaper {
    store: SessionStore,
    interval: Duration,
    running: Mutex<Option<RunningReaper>>,
}

impl SessionReaper {
    pub fn new(store: SessionStore, interval: Duration) -> Self {
        Self {
            store,
            interval,
            running: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Spawn the sweep task on the current tokio runtime
    ///
    /// Returns `Ok(false)` if the reaper is already running.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` when called outside a tokio runtime.
    pub fn start(&self) -> Result<bool> {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = running.as_ref() {
            if !existing.handle.is_finished() {
                return Ok(false);
            }
        }

        if self.interval.is_zero() {
            return Err(GpsCryptoError::configuration(
                "session reap interval must be greater than zero",
            ));
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            GpsCryptoError::configuration("session reaper requires a tokio runtime")
        })?;

        let cancel_token = CancellationToken::new();
        let token = cancel_token.clone();
        let store = self.store.clone();
        let interval = self.interval;

        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!("Session reaper cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        let reaped = store.reap_expired();
                        if reaped > 0 {
                            info!(reaped, remaining = store.len(), "🗑️  Reaped expired GPS sessions");
                        }
                    }
                }
            }
        });

        info!(interval_secs = interval.as_secs(), "Session reaper started");
        *running = Some(RunningReaper {
            cancel_token,
            handle,
        });
        Ok(true)
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|r| !r.handle.is_finished())
            .unwrap_or(false)
    }

    /// Cancel the sweep task and wait for it to exit
    pub async fn shutdown(&self) {
        let running = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(running) = running {
            running.cancel_token.cancel();
            // A join error here only means the task panicked; nothing to clean up
            let _ = running.handle.await;
            info!("Session reaper stopped");
        }
    }
}

impl Drop for SessionReaper {
    fn drop(&mut self) {
        if let Some(running) = self
            .running
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            running.cancel_token.cancel();
        }
    }
}
