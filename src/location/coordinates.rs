// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! GPS fix value object and its canonical serialization.
//!
//! The canonical form is compact JSON with keys in sorted order and absent
//! optional fields omitted. Encrypt and decrypt both go through
//! [`Coordinates::to_canonical_json`] / [`Coordinates::from_canonical_json`].

use crate::crypto::{GpsCryptoError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single GPS fix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Coordinates {
    /// Latitude in degrees, [-90, 90]
    pub latitude: f64,
    /// Longitude in degrees, [-180, 180]
    pub longitude: f64,
    /// Horizontal accuracy in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    /// Altitude in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    /// Ground speed in m/s
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    /// Heading in degrees from true north
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    /// Time the fix was taken
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: None,
            altitude: None,
            speed: None,
            heading: None,
            timestamp: None,
        }
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_heading(mut self, heading: f64) -> Self {
        self.heading = Some(heading);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Check ranges and reject NaN/infinite values
    ///
    /// JSON has no representation for non-finite floats, so they would not
    /// survive the round trip.
    pub fn validate(&self) -> Result<()> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(GpsCryptoError::encryption("latitude out of range [-90, 90]"));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(GpsCryptoError::encryption("longitude out of range [-180, 180]"));
        }

        let optional = [
            ("accuracy", self.accuracy),
            ("altitude", self.altitude),
            ("speed", self.speed),
            ("heading", self.heading),
        ];
        for (field, value) in optional {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(GpsCryptoError::encryption(format!(
                        "{} is not a finite number",
                        field
                    )));
                }
            }
        }

        Ok(())
    }

    /// Serialize to canonical (key-sorted) JSON
    pub fn to_canonical_json(&self) -> Result<String> {
        self.validate()?;
        // serde_json::Map is BTreeMap-backed, so going through Value sorts keys
        let value = serde_json::to_value(self)
            .map_err(|e| GpsCryptoError::encryption(format!("serialization failed: {}", e)))?;
        serde_json::to_string(&value)
            .map_err(|e| GpsCryptoError::encryption(format!("serialization failed: {}", e)))
    }

    /// Parse canonical JSON produced by [`Coordinates::to_canonical_json`]
    pub fn from_canonical_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}
