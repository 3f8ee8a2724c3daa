//! Read-only access to tiles and metadata.

use std::path::Path;

use rusqlite::{params, OptionalExtension};
use tracing::trace;

use crate::error::TilesetError;

use super::coord::TileCoordinate;
use super::handle::Tileset;
use super::metadata::{MetadataJson, METADATA_JSON_KEY};

/// Looks up tiles and metadata in an archive.
///
/// Coordinates are always given in the web convention (y counted from the
/// top); the row flip happens here, once.
#[derive(Debug)]
pub struct Reader {
    tileset: Tileset,
}

impl Reader {
    /// Open an existing archive read-only.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TilesetError> {
        Ok(Self::from_tileset(Tileset::open_read_only(path)?))
    }

    pub fn from_tileset(tileset: Tileset) -> Self {
        Self { tileset }
    }

    pub fn tileset(&self) -> &Tileset {
        &self.tileset
    }

    /// Fetch the tile stored at web coordinate `(z, x, y)`.
    ///
    /// Returns [`TilesetError::TileNotFound`] when the archive has no such
    /// tile; any other error is a genuine store failure.
    pub fn select_tile(&self, z: u8, x: u32, y: u32) -> Result<Vec<u8>, TilesetError> {
        let coord = TileCoordinate::new(z, x, y);
        coord.check_zoom()?;
        let stored = coord.to_stored();

        let mut stmt = self.tileset.tile_select_statement()?;
        let data = stmt
            .query_row(params![stored.z, stored.x, stored.row], |row| {
                row.get::<_, Vec<u8>>(0)
            })
            .optional()?;

        trace!(z, x, y, row = stored.row, found = data.is_some(), "select tile");
        data.ok_or(TilesetError::TileNotFound { z, x, y })
    }

    /// Fetch the metadata value stored under `name`.
    pub fn select_metadata(&self, name: &str) -> Result<String, TilesetError> {
        let mut stmt = self.tileset.metadata_select_statement()?;
        stmt.query_row(params![name], |row| row.get::<_, String>(0))
            .optional()?
            .ok_or_else(|| TilesetError::MetadataNotFound {
                name: name.to_string(),
            })
    }

    /// Fetch and parse the vector-tile `json` metadata document.
    pub fn select_metadata_json(&self) -> Result<MetadataJson, TilesetError> {
        let value = self.select_metadata(METADATA_JSON_KEY)?;
        Ok(serde_json::from_str(&value)?)
    }

    pub fn into_tileset(self) -> Tileset {
        self.tileset
    }

    /// Release the underlying tileset.
    pub fn close(self) -> Result<(), TilesetError> {
        self.tileset.close()
    }
}
