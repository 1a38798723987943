// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Encryption service configuration.
//!
//! | Variable                    | Default | Meaning                         |
//! |-----------------------------|---------|---------------------------------|
//! | `GPS_ENCRYPTION_MASTER_KEY` | none    | Server master key (required)    |
//! | `GPS_SESSION_TTL_HOURS`     | `24`    | Default session lifetime        |
//! | `GPS_REAP_INTERVAL_SECS`    | `300`   | Reaper sweep interval           |

use crate::crypto::{GpsCryptoError, MasterKey, Result};
use crate::session::DEFAULT_REAP_INTERVAL;
use chrono::Utc;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const SESSION_TTL_ENV: &str = "GPS_SESSION_TTL_HOURS";
pub const REAP_INTERVAL_ENV: &str = "GPS_REAP_INTERVAL_SECS";

/// Default session lifetime (24 hours)
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone)]
pub struct EncryptionConfig {
    pub master_key: MasterKey,
    pub default_ttl: Duration,
    pub reap_interval: Duration,
}

impl EncryptionConfig {
    pub fn new(master_key: MasterKey) -> Self {
        Self {
            master_key,
            default_ttl: DEFAULT_SESSION_TTL,
            reap_interval: DEFAULT_REAP_INTERVAL,
        }
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_reap_interval(mut self, interval: Duration) -> Self {
        self.reap_interval = interval;
        self
    }

    /// Build the configuration from the process environment
    ///
    /// Fails fast when the master key is absent.
    pub fn from_env() -> Result<Self> {
        let master_key = MasterKey::from_env()?;

        let default_ttl = parse_env::<u64>(SESSION_TTL_ENV)?
            .map(|hours| Duration::from_secs(hours.saturating_mul(3600)))
            .unwrap_or(DEFAULT_SESSION_TTL);
        let reap_interval = parse_env::<u64>(REAP_INTERVAL_ENV)?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REAP_INTERVAL);

        let config = Self::new(master_key)
            .with_default_ttl(default_ttl)
            .with_reap_interval(reap_interval);
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would only fail later, at session creation
    pub fn validate(&self) -> Result<()> {
        if self.reap_interval.is_zero() {
            return Err(GpsCryptoError::configuration(format!(
                "{} must be greater than zero",
                REAP_INTERVAL_ENV
            )));
        }

        // Expiry is computed as now + ttl on a chrono timestamp
        let representable = chrono::Duration::from_std(self.default_ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .is_some();
        if !representable {
            return Err(GpsCryptoError::configuration(format!(
                "{} is too large",
                SESSION_TTL_ENV
            )));
        }
        Ok(())
    }
}

fn parse_env<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            GpsCryptoError::configuration(format!("{} has an invalid value: {:?}", name, raw))
        }),
        Err(_) => Ok(None),
    }
}
