//! Tileset storage layer.
//!
//! This module reads and writes MBTiles archives: a SQLite file with a
//! `tiles` table keyed by `(zoom_level, tile_column, tile_row)` and a
//! `metadata` key/value table.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │                 Writer                  │
//! │  (schema, insert, bulk insert, pragmas) │
//! └────────────────────┬────────────────────┘
//!                      │ holds
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │                 Reader                  │
//! │      (select tile, select metadata)     │
//! └────────────────────┬────────────────────┘
//!                      │ holds
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │                Tileset                  │
//! │ (connection + cached prepared stmts)    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! Callers always pass web-convention (top-origin) `y`; [`coord`] flips it to
//! the stored bottom-origin row on both the read and the write path.
//!
//! # Example
//!
//! ```
//! use mbtiles_server::tileset::{TileData, Writer};
//!
//! let mut writer = Writer::open_in_memory().unwrap();
//! writer.insert_metadata("name", "demo").unwrap();
//! writer
//!     .bulk_insert_tiles(&[TileData::new(0, 0, 0, vec![0x00])])
//!     .unwrap();
//!
//! assert_eq!(writer.select_tile(0, 0, 0).unwrap(), vec![0x00]);
//! assert!(writer.select_tile(1, 0, 0).unwrap_err().is_not_found());
//! ```

pub mod coord;
mod handle;
pub mod metadata;
mod reader;
mod writer;

pub use coord::{flip_row, parse_component, StoredCoordinate, TileCoordinate, MAX_ZOOM};
pub use handle::{StatementKind, Tileset};
pub use metadata::{MetadataJson, VectorLayer, METADATA_JSON_KEY};
pub use reader::Reader;
pub use writer::{Optimizations, TileData, Writer};
