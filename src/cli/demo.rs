// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, bail, Result};
use clap::Args;
use std::time::Duration;
use tracing::info;

use crate::config::EncryptionConfig;
use crate::crypto::{EphemeralKeyPair, MasterKey, MASTER_KEY_ENV};
use crate::location::Coordinates;
use crate::service::GpsEncryptionService;

/// Arguments for the demo command
#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Ride identifier the session is bound to
    #[arg(long, default_value = "ride-42")]
    pub ride_id: String,

    /// Latitude in degrees
    #[arg(long)]
    pub lat: f64,

    /// Longitude in degrees
    #[arg(long)]
    pub lon: f64,

    /// Horizontal accuracy in meters
    #[arg(long)]
    pub accuracy: Option<f64>,

    /// Session lifetime in hours
    #[arg(long, default_value_t = 1)]
    pub ttl_hours: u64,

    /// Master key (can also be set via GPS_ENCRYPTION_MASTER_KEY env var)
    #[arg(long, env = "GPS_ENCRYPTION_MASTER_KEY", hide_env_values = true)]
    pub master_key: Option<String>,

    /// Use a throwaway random master key instead of the configured one
    #[arg(long)]
    pub ephemeral_master_key: bool,
}

/// Run one complete session: handshake, encrypt, decrypt, terminate
pub async fn run_demo(args: DemoArgs) -> Result<()> {
    let master_key = if args.ephemeral_master_key {
        println!("⚠️  Using an ephemeral master key");
        MasterKey::generate()
    } else {
        let secret = args.master_key.as_deref().ok_or_else(|| {
            anyhow!(
                "Master key required. Use --master-key, set {} or pass --ephemeral-master-key",
                MASTER_KEY_ENV
            )
        })?;
        MasterKey::parse(secret)?
    };

    let service = GpsEncryptionService::new(EncryptionConfig::new(master_key))?;
    service.start_reaper()?;

    // Client side: generate a key pair and send the public half
    let client = EphemeralKeyPair::generate();
    let ttl = Duration::from_secs(args.ttl_hours.saturating_mul(3600));
    let handshake = service.create_session(&args.ride_id, &client.public_key_bytes(), Some(ttl))?;

    println!("\n📋 Session:");
    println!("  Session ID:        {}", handshake.session_id);
    println!("  Ride ID:           {}", handshake.ride_id);
    println!("  Server public key: {}", handshake.server_public_key_hex());
    println!("  Expires at:        {}", handshake.expires_at.to_rfc3339());

    let mut coords = Coordinates::new(args.lat, args.lon);
    if let Some(accuracy) = args.accuracy {
        coords = coords.with_accuracy(accuracy);
    }

    let envelope = service.encrypt_location(&coords, &handshake.session_id)?;
    println!("\n🔒 Encrypted envelope:");
    println!("{}", serde_json::to_string_pretty(&envelope)?);

    let recovered = service.decrypt_location(&envelope)?;
    if recovered != coords {
        bail!("Round trip mismatch: {:?} != {:?}", recovered, coords);
    }
    let (lat, lon) = (recovered.latitude, recovered.longitude);
    println!("\n✅ Decrypted: lat={} lon={}", lat, lon);

    service.terminate_session(&handshake.session_id);
    service.shutdown().await;

    let stats = service.stats();
    info!(
        created = stats.sessions_created,
        encrypted = stats.locations_encrypted,
        "Demo complete"
    );
    Ok(())
}
