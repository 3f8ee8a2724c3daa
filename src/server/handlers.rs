//! HTTP request handlers for the tile API.
//!
//! # Endpoints
//!
//! - `GET /{prefix}/{z}/{x}/{y}` - Serve the raw bytes of a tile
//! - `GET /health` - Health check endpoint

use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    extract::{rejection::PathRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error};

use crate::tileset::metadata::METADATA_FORMAT_KEY;
use crate::tileset::{parse_component, Reader, TileCoordinate, MAX_ZOOM};

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the tileset reader.
///
/// The reader owns a single SQLite connection, so requests take turns on it
/// through the mutex. Store calls run on the blocking thread pool.
#[derive(Clone)]
pub struct AppState {
    /// Reader for the served archive
    pub reader: Arc<Mutex<Reader>>,

    /// Cache-Control max-age in seconds
    pub cache_max_age: u32,

    /// Content-Type sent with every tile, if the archive declares a format
    pub content_type: Option<&'static str>,
}

impl AppState {
    /// Create application state for `reader`.
    ///
    /// The tile content type is taken from the archive's `format` metadata
    /// once, up front.
    pub fn new(reader: Reader, cache_max_age: u32) -> Self {
        let content_type = match reader.select_metadata(METADATA_FORMAT_KEY) {
            Ok(format) => content_type_for_format(&format),
            Err(err) => {
                debug!(error = %err, "no usable tile format in metadata");
                None
            }
        };

        Self {
            reader: Arc::new(Mutex::new(reader)),
            cache_max_age,
            content_type,
        }
    }
}

/// Map an MBTiles `format` metadata value to a MIME type.
pub fn content_type_for_format(format: &str) -> Option<&'static str> {
    match format.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "pbf" | "mvt" => Some("application/x-protobuf"),
        _ => None,
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Path Parsing
// =============================================================================

/// Parse the `{z}/{x}/{y}` segments of a tile path.
///
/// Every segment must be plain ASCII digits. Returns `None` for any other
/// shape, for values that do not fit, and for zoom levels above
/// [`MAX_ZOOM`].
pub fn parse_tile_path(z: &str, x: &str, y: &str) -> Option<TileCoordinate> {
    let coord = TileCoordinate::new(
        parse_component(z)?,
        parse_component(x)?,
        parse_component(y)?,
    );
    if coord.z > MAX_ZOOM {
        return None;
    }
    Some(coord)
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle tile requests.
///
/// # Endpoint
///
/// `GET /{prefix}/{z}/{x}/{y}`
///
/// # Response
///
/// - `200 OK`: the stored tile bytes, unmodified
/// - `404 Not Found`: malformed or undecodable path, absent tile, or store
///   failure
///
/// Absent tiles and store failures look the same to the client; they are
/// told apart only in the logs.
pub async fn tile_handler(
    State(state): State<AppState>,
    path: Result<Path<(String, String, String)>, PathRejection>,
) -> Response {
    let Path((z, x, y)) = match path {
        Ok(path) => path,
        Err(rejection) => {
            debug!(error = %rejection, "undecodable tile path");
            return StatusCode::NOT_FOUND.into_response();
        }
    };

    let Some(coord) = parse_tile_path(&z, &x, &y) else {
        debug!(z = %z, x = %x, y = %y, "malformed tile path");
        return StatusCode::NOT_FOUND.into_response();
    };

    let reader = Arc::clone(&state.reader);
    let result = tokio::task::spawn_blocking(move || {
        let reader = reader.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        reader.select_tile(coord.z, coord.x, coord.y)
    })
    .await;

    match result {
        Ok(Ok(data)) => tile_response(data, &state),
        Ok(Err(err)) if err.is_not_found() => {
            debug!(z = coord.z, x = coord.x, y = coord.y, "tile not found");
            StatusCode::NOT_FOUND.into_response()
        }
        Ok(Err(err)) => {
            error!(z = coord.z, x = coord.x, y = coord.y, error = %err, "tile lookup failed");
            StatusCode::NOT_FOUND.into_response()
        }
        Err(err) => {
            error!(error = %err, "tile lookup task failed");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

fn tile_response(data: Vec<u8>, state: &AppState) -> Response {
    let mut response = (
        StatusCode::OK,
        [(
            header::CACHE_CONTROL,
            format!("public, max-age={}", state.cache_max_age),
        )],
        Body::from(data),
    )
        .into_response();

    if let Some(content_type) = state.content_type {
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static(content_type),
        );
    }

    response
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
