//! Schema creation, tile insertion and metadata mutation.
//!
//! Schema creation is idempotent (`CREATE ... IF NOT EXISTS`) and may be
//! issued before every write. The `has_tiles` / `has_metadata` flags only skip
//! re-issuing it within the lifetime of one [`Writer`].

use std::path::Path;

use rusqlite::params;
use tracing::{debug, info, warn};

use crate::error::TilesetError;

use super::coord::TileCoordinate;
use super::handle::Tileset;
use super::metadata::{MetadataJson, METADATA_JSON_KEY};
use super::reader::Reader;

const CREATE_TILES_SQL: &str = "
    CREATE TABLE IF NOT EXISTS tiles (
        zoom_level INTEGER NOT NULL,
        tile_column INTEGER NOT NULL,
        tile_row INTEGER NOT NULL,
        tile_data BLOB NOT NULL,
        PRIMARY KEY (zoom_level, tile_column, tile_row)
    );
    CREATE UNIQUE INDEX IF NOT EXISTS tiles_index ON tiles (zoom_level, tile_column, tile_row);";

const CREATE_TILE_INDEX_SQL: &str =
    "CREATE UNIQUE INDEX IF NOT EXISTS tiles_index ON tiles (zoom_level, tile_column, tile_row)";

const DROP_TILE_INDEX_SQL: &str = "DROP INDEX IF EXISTS tiles_index";

const CREATE_METADATA_SQL: &str =
    "CREATE TABLE IF NOT EXISTS metadata (name TEXT, value TEXT, PRIMARY KEY (name))";

const DELETE_METADATA_SQL: &str = "DELETE FROM metadata";

// =============================================================================
// Tile Data
// =============================================================================

/// One element of a bulk insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileData {
    /// Web-convention coordinate
    pub coord: TileCoordinate,

    /// Raw tile bytes, stored as given
    pub data: Vec<u8>,
}

impl TileData {
    pub fn new(z: u8, x: u32, y: u32, data: impl Into<Vec<u8>>) -> Self {
        Self {
            coord: TileCoordinate::new(z, x, y),
            data: data.into(),
        }
    }
}

// =============================================================================
// Optimizations
// =============================================================================

/// Opt-in SQLite tuning that trades crash durability for write throughput.
///
/// Both options stay in effect for the rest of the connection's life.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Optimizations {
    /// `PRAGMA synchronous = OFF`: no fsync on commit
    pub synchronous_off: bool,

    /// `PRAGMA journal_mode = MEMORY`: keep the rollback journal in memory
    pub journal_mode_memory: bool,
}

impl Optimizations {
    /// Every option enabled.
    pub fn all() -> Self {
        Self {
            synchronous_off: true,
            journal_mode_memory: true,
        }
    }
}

// =============================================================================
// Writer
// =============================================================================

/// Writes tiles and metadata into an archive.
///
/// A `Writer` wraps a [`Reader`] over the same handle, so everything a reader
/// can look up is also available here.
#[derive(Debug)]
pub struct Writer {
    reader: Reader,
    has_tiles: bool,
    has_metadata: bool,
}

impl Writer {
    /// Open (or create) an archive for writing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TilesetError> {
        Ok(Self::from_tileset(Tileset::open(path)?))
    }

    /// Create a scratch archive in memory.
    pub fn open_in_memory() -> Result<Self, TilesetError> {
        Ok(Self::from_tileset(Tileset::open_in_memory()?))
    }

    pub fn from_tileset(tileset: Tileset) -> Self {
        Self {
            reader: Reader::from_tileset(tileset),
            has_tiles: false,
            has_metadata: false,
        }
    }

    pub fn reader(&self) -> &Reader {
        &self.reader
    }

    pub fn tileset(&self) -> &Tileset {
        self.reader.tileset()
    }

    pub fn into_reader(self) -> Reader {
        self.reader
    }

    /// Release the underlying tileset.
    pub fn close(self) -> Result<(), TilesetError> {
        self.reader.close()
    }

    // -------------------------------------------------------------------------
    // Storage tuning
    // -------------------------------------------------------------------------

    /// Apply the requested optimizations. Options left `false` are untouched.
    pub fn set_optimizations(&self, opts: Optimizations) -> Result<(), TilesetError> {
        let conn = self.tileset().connection();

        if opts.synchronous_off {
            conn.pragma_update(None, "synchronous", "OFF")?;
            warn!("synchronous = OFF: commits are no longer fsynced");
        }

        if opts.journal_mode_memory {
            let mode: String = conn.pragma_update_and_check(None, "journal_mode", "MEMORY", |row| {
                row.get(0)
            })?;
            info!(journal_mode = %mode, "journal mode updated");
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Schema
    // -------------------------------------------------------------------------

    /// Create the `tiles` table and its unique index if they are missing.
    pub fn ensure_tiles_schema(&mut self) -> Result<(), TilesetError> {
        if self.has_tiles {
            return Ok(());
        }
        let tx = self.tileset().connection().unchecked_transaction()?;
        tx.execute_batch(CREATE_TILES_SQL)?;
        tx.commit()?;
        debug!("tiles schema ready");
        self.has_tiles = true;
        Ok(())
    }

    /// Create the `metadata` table if it is missing.
    pub fn ensure_metadata_schema(&mut self) -> Result<(), TilesetError> {
        if self.has_metadata {
            return Ok(());
        }
        self.tileset()
            .connection()
            .execute_batch(CREATE_METADATA_SQL)?;
        debug!("metadata schema ready");
        self.has_metadata = true;
        Ok(())
    }

    /// Recreate the `tiles_index` unique index.
    pub fn create_tile_index(&mut self) -> Result<(), TilesetError> {
        self.ensure_tiles_schema()?;
        self.tileset()
            .connection()
            .execute_batch(CREATE_TILE_INDEX_SQL)?;
        Ok(())
    }

    /// Drop the `tiles_index` unique index.
    ///
    /// Large ingests run faster without it; the primary key still enforces
    /// uniqueness. Call [`Writer::create_tile_index`] afterwards.
    pub fn delete_tile_index(&mut self) -> Result<(), TilesetError> {
        self.tileset().connection().execute_batch(DROP_TILE_INDEX_SQL)?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Tiles
    // -------------------------------------------------------------------------

    /// Look up a tile, creating the tiles schema first so a fresh archive
    /// reports not-found instead of a missing table.
    pub fn select_tile(&mut self, z: u8, x: u32, y: u32) -> Result<Vec<u8>, TilesetError> {
        self.ensure_tiles_schema()?;
        self.reader.select_tile(z, x, y)
    }

    /// Insert or replace a single tile in its own implicit transaction.
    pub fn insert_tile(&mut self, z: u8, x: u32, y: u32, data: &[u8]) -> Result<(), TilesetError> {
        let coord = TileCoordinate::new(z, x, y);
        coord.check_zoom()?;
        self.ensure_tiles_schema()?;

        let stored = coord.to_stored();
        let mut stmt = self.tileset().tile_insert_statement()?;
        stmt.execute(params![stored.z, stored.x, stored.row, data])?;
        Ok(())
    }

    /// Insert or replace many tiles inside one transaction.
    ///
    /// Either every tile in `tiles` is written or none is: the first failing
    /// row rolls the whole batch back and is reported as
    /// [`TilesetError::Transaction`]. A failed commit is reported the same way
    /// with `index == total`. Returns the number of tiles written.
    pub fn bulk_insert_tiles(&mut self, tiles: &[TileData]) -> Result<usize, TilesetError> {
        for tile in tiles {
            tile.coord.check_zoom()?;
        }
        if tiles.is_empty() {
            return Ok(0);
        }
        self.ensure_tiles_schema()?;

        let total = tiles.len();
        let tileset = self.reader.tileset();
        let tx = tileset.connection().unchecked_transaction()?;
        let mut stmt = tileset.tile_insert_statement()?;

        for (index, tile) in tiles.iter().enumerate() {
            let stored = tile.coord.to_stored();
            if let Err(source) = stmt.execute(params![stored.z, stored.x, stored.row, tile.data]) {
                drop(stmt);
                if let Err(err) = tx.rollback() {
                    warn!(error = %err, "rollback after failed bulk insert also failed");
                }
                warn!(index, total, error = %source, "bulk insert rolled back");
                return Err(TilesetError::Transaction {
                    index,
                    total,
                    source,
                });
            }
        }

        drop(stmt);
        tx.commit().map_err(|source| TilesetError::Transaction {
            index: total,
            total,
            source,
        })?;

        debug!(count = total, "bulk insert committed");
        Ok(total)
    }

    // -------------------------------------------------------------------------
    // Metadata
    // -------------------------------------------------------------------------

    /// Look up a metadata value, creating the metadata schema first.
    pub fn select_metadata(&mut self, name: &str) -> Result<String, TilesetError> {
        self.ensure_metadata_schema()?;
        self.reader.select_metadata(name)
    }

    /// Insert or replace the value stored under `name`.
    pub fn insert_metadata(&mut self, name: &str, value: &str) -> Result<(), TilesetError> {
        self.ensure_metadata_schema()?;
        let mut stmt = self.tileset().metadata_insert_statement()?;
        stmt.execute(params![name, value])?;
        Ok(())
    }

    /// Serialize `doc` and store it under the `json` key.
    pub fn insert_metadata_json(&mut self, doc: &MetadataJson) -> Result<(), TilesetError> {
        let value = serde_json::to_string(doc)?;
        self.insert_metadata(METADATA_JSON_KEY, &value)
    }

    /// Remove every metadata row.
    pub fn delete_metadata(&mut self) -> Result<(), TilesetError> {
        self.ensure_metadata_schema()?;
        self.tileset()
            .connection()
            .execute_batch(DELETE_METADATA_SQL)?;
        self.has_metadata = false;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
