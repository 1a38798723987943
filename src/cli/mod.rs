// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod demo;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::Path;
use tracing::debug;

use crate::crypto::MasterKey;
use crate::version;

/// VIP GPS Encryption CLI
#[derive(Parser, Debug)]
#[command(name = "vip-gps-cli")]
#[command(version)]
#[command(about = "Tools for the VIP GPS session encryption core", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a fresh random master key for GPS_ENCRYPTION_MASTER_KEY
    GenerateMasterKey,

    /// Run a full client/server session handshake and encrypt one fix
    Demo(demo::DemoArgs),

    /// Print version and feature information
    Version,
}

/// Load variables from a `.env` file into the process environment
///
/// Call before parsing [`Cli`]; `env =` argument fallbacks are resolved at
/// parse time. Variables already set in the process are not overridden.
/// `None` searches the current directory and its parents.
pub fn load_env_file(path: Option<&Path>) {
    let loaded = match path {
        Some(path) => dotenv::from_path(path).map(|_| path.to_path_buf()),
        None => dotenv::dotenv(),
    };
    if let Ok(path) = loaded {
        debug!(path = %path.display(), "Loaded environment file");
    }
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::GenerateMasterKey => {
            println!("{}", MasterKey::generate().to_hex());
            Ok(())
        }
        Commands::Demo(args) => demo::run_demo(args).await,
        Commands::Version => {
            let info = version::get_version_info();
            println!("{}", serde_json::to_string_pretty(&info)?);
            Ok(())
        }
    }
}
