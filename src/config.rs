//! Configuration management for the MBTiles server.
//!
//! This module provides a configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `MBTILES_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Commands
//!
//! - `serve` - Serve tiles from an archive over HTTP
//! - `pack` - Build an archive from a `{z}/{x}/{y}.{ext}` directory
//!
//! # Environment Variables
//!
//! - `MBTILES_ADDR` - Server bind address (default: localhost:8080)
//! - `MBTILES_PATH` - Archive to serve (required for `serve`)
//! - `MBTILES_TILE_PREFIX` - URL prefix for tiles (default: archive file name)
//! - `MBTILES_CACHE_MAX_AGE` - HTTP cache max-age seconds (default: 3600)
//! - `MBTILES_CORS_ORIGINS` - Comma-separated allowed origins (default: any)

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::pack::{PackOptions, DEFAULT_BATCH_SIZE};
use crate::server::{RouterConfig, DEFAULT_CACHE_MAX_AGE};
use crate::tileset::Optimizations;

// =============================================================================
// Default Values
// =============================================================================

/// Default server bind address.
pub const DEFAULT_ADDR: &str = "localhost:8080";

// =============================================================================
// CLI
// =============================================================================

/// MBTiles server - serve and build MBTiles tile archives.
#[derive(Parser, Debug, Clone)]
#[command(name = "mbtiles-server")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve tiles from an archive over HTTP
    Serve(ServeConfig),

    /// Pack a directory of tiles into a new archive
    Pack(PackConfig),
}

// =============================================================================
// Serve Command
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    /// Address to bind the server to.
    #[arg(long, default_value = DEFAULT_ADDR, env = "MBTILES_ADDR")]
    pub addr: String,

    /// Path of the MBTiles archive to serve.
    #[arg(long, env = "MBTILES_PATH")]
    pub path: PathBuf,

    /// URL prefix for tiles. Defaults to the archive's file name.
    #[arg(long, env = "MBTILES_TILE_PREFIX")]
    pub tile_prefix: Option<String>,

    /// HTTP Cache-Control max-age in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "MBTILES_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    /// Allowed CORS origins (comma-separated). Any origin when unset.
    #[arg(long, env = "MBTILES_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.addr.is_empty() {
            return Err("Bind address is required. Set --addr or MBTILES_ADDR".to_string());
        }

        if !self.path.is_file() {
            return Err(format!(
                "Archive not found: {}. Set --path or MBTILES_PATH",
                self.path.display()
            ));
        }

        if self.tile_prefix().contains(['{', '}']) {
            return Err("tile_prefix must not contain '{' or '}'".to_string());
        }

        Ok(())
    }

    /// The tile URL prefix, falling back to the archive's file name.
    pub fn tile_prefix(&self) -> String {
        self.tile_prefix.clone().unwrap_or_else(|| {
            self.path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default()
        })
    }

    /// Build the router configuration for this server.
    pub fn router_config(&self) -> RouterConfig {
        let mut router_config = RouterConfig::new(self.tile_prefix())
            .with_cache_max_age(self.cache_max_age)
            .with_tracing(!self.no_tracing);

        if let Some(ref origins) = self.cors_origins {
            router_config = router_config.with_cors_origins(origins.clone());
        }

        router_config
    }
}

// =============================================================================
// Pack Command
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct PackConfig {
    /// Input directory laid out as {z}/{x}/{y}.{ext}
    pub source_dir: PathBuf,

    /// Output *.mbtiles file
    pub target_file: PathBuf,

    /// Tileset name. Defaults to the output file stem.
    #[arg(long, short)]
    pub name: Option<String>,

    /// Tile format. Defaults to the extension of the first tile.
    #[arg(long)]
    pub format: Option<String>,

    /// Tiles written per transaction.
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Disable fsync on commit (faster, not crash safe).
    #[arg(long, default_value_t = false)]
    pub synchronous_off: bool,

    /// Keep the rollback journal in memory (faster, not crash safe).
    #[arg(long, default_value_t = false)]
    pub journal_memory: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl PackConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if !self.source_dir.is_dir() {
            return Err(format!(
                "Source directory not found: {}",
                self.source_dir.display()
            ));
        }

        if self.batch_size == 0 {
            return Err("batch_size must be greater than 0".to_string());
        }

        Ok(())
    }

    pub fn to_options(&self) -> PackOptions {
        PackOptions {
            source_dir: self.source_dir.clone(),
            target_file: self.target_file.clone(),
            name: self.name.clone(),
            format: self.format.clone(),
            batch_size: self.batch_size,
            optimizations: Optimizations {
                synchronous_off: self.synchronous_off,
                journal_mode_memory: self.journal_memory,
            },
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
