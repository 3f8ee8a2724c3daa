//! Router configuration for the tile server.
//!
//! # Route Structure
//!
//! ```text
//! /health                      - Health check
//! /{tile_prefix}/{z}/{x}/{y}   - Tile endpoint
//! ```
//!
//! # Example
//!
//! ```ignore
//! use mbtiles_server::server::{create_router, RouterConfig};
//! use mbtiles_server::tileset::Reader;
//!
//! let reader = Reader::open("world.mbtiles")?;
//! let router = create_router(reader, RouterConfig::new("world.mbtiles"));
//!
//! let listener = tokio::net::TcpListener::bind("localhost:8080").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{routing::get, Router};
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{health_handler, tile_handler, AppState};
use crate::tileset::Reader;

/// Default Cache-Control max-age in seconds (1 hour).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 3600;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Path prefix in front of `{z}/{x}/{y}`, without surrounding slashes
    pub tile_prefix: String,

    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Cache-Control max-age in seconds
    pub cache_max_age: u32,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a configuration serving tiles under `tile_prefix`.
    ///
    /// Leading and trailing slashes are ignored; an empty prefix serves tiles
    /// from the root.
    pub fn new(tile_prefix: impl Into<String>) -> Self {
        Self {
            tile_prefix: normalize_prefix(&tile_prefix.into()),
            cors_origins: None,
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
            enable_tracing: true,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Set the Cache-Control max-age in seconds.
    pub fn with_cache_max_age(mut self, seconds: u32) -> Self {
        self.cache_max_age = seconds;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }

    /// Route pattern for the tile endpoint.
    pub fn tile_route(&self) -> String {
        if self.tile_prefix.is_empty() {
            "/{z}/{x}/{y}".to_string()
        } else {
            format!("/{}/{{z}}/{{x}}/{{y}}", self.tile_prefix)
        }
    }
}

fn normalize_prefix(prefix: &str) -> String {
    prefix.trim_matches('/').to_string()
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router serving tiles from `reader`.
pub fn create_router(reader: Reader, config: RouterConfig) -> Router {
    let app_state = AppState::new(reader, config.cache_max_age);
    let cors = build_cors_layer(&config);

    let router = Router::new()
        .route("/health", get(health_handler))
        .route(&config.tile_route(), get(tile_handler))
        .with_state(app_state)
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(86400));

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
