//! # MBTiles Server
//!
//! Storage, retrieval and HTTP serving for MBTiles tile archives.
//!
//! An MBTiles archive is a single SQLite file with a `tiles` table keyed by
//! zoom, column and row, plus a `metadata` key/value table. This library
//! reads and writes such archives and serves their tiles over HTTP.
//!
//! ## Features
//!
//! - **Coordinate translation**: web (top-origin) `y` in, stored (bottom-origin) row out
//! - **Statement reuse**: every query is compiled once per connection
//! - **Atomic bulk loading**: a batch of tiles is committed whole or not at all
//! - **Tile server**: `GET /{prefix}/{z}/{x}/{y}` returns the stored bytes
//!
//! ## Architecture
//!
//! - [`tileset`] - Coordinate transform, tileset handle, reader and writer
//! - [`server`] - Axum-based HTTP server and routes
//! - [`pack`] - Directory-of-tiles ingestion
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```
//! use mbtiles_server::tileset::Writer;
//!
//! let mut writer = Writer::open_in_memory().unwrap();
//! writer.insert_tile(0, 0, 0, &[0x00]).unwrap();
//! assert_eq!(writer.select_tile(0, 0, 0).unwrap(), vec![0x00]);
//! ```

pub mod config;
pub mod error;
pub mod pack;
pub mod server;
pub mod tileset;

// Re-export commonly used types
pub use config::{Cli, Command, PackConfig, ServeConfig};
pub use error::{PackError, TilesetError};
pub use pack::{pack, PackOptions, PackSummary};
pub use server::{create_router, AppState, RouterConfig};
pub use tileset::{
    MetadataJson, Optimizations, Reader, StatementKind, StoredCoordinate, TileCoordinate,
    TileData, Tileset, Writer, MAX_ZOOM,
};
