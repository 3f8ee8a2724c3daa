//! MBTiles server - serve and build MBTiles tile archives.
//!
//! This binary parses the command line, sets up logging and runs either the
//! HTTP server or the directory packer.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mbtiles_server::{
    config::{Cli, Command, PackConfig, ServeConfig},
    pack::pack,
    server::create_router,
    tileset::Reader,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Pack(config) => run_pack(config).await,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let reader = match Reader::open(&config.path) {
        Ok(reader) => reader,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let router_config = config.router_config();
    let tile_route = router_config.tile_route();
    let router = create_router(reader, router_config);

    let listener = match tokio::net::TcpListener::bind(&config.addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", config.addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Serving {} on http://{}", config.path.display(), config.addr);
    info!("  Tiles:  http://{}{}", config.addr, tile_route);
    info!("  Health: http://{}/health", config.addr);

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

// =============================================================================
// Pack Command
// =============================================================================

async fn run_pack(config: PackConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let options = config.to_options();
    match tokio::task::spawn_blocking(move || pack(&options)).await {
        Ok(Ok(summary)) => {
            info!(
                "Packed {} tile(s), skipped {} file(s)",
                summary.tiles, summary.skipped
            );
            ExitCode::SUCCESS
        }
        Ok(Err(e)) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("Pack task failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "mbtiles_server=debug,tower_http=debug"
    } else {
        "mbtiles_server=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
