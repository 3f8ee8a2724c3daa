use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the tileset storage layer.
#[derive(Debug, Error)]
pub enum TilesetError {
    /// The archive could not be opened
    #[error("Cannot open tileset {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// A statement could not be compiled against the archive
    #[error("Failed to prepare {statement} statement: {source}")]
    Prepare {
        statement: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// No tile is stored at the requested web coordinate
    #[error("Tile not found: {z}/{x}/{y}")]
    TileNotFound { z: u8, x: u32, y: u32 },

    /// No metadata row exists for the requested name
    #[error("Metadata not found: {name}")]
    MetadataNotFound { name: String },

    /// Zoom level too deep for the row transform
    #[error("Zoom level {z} out of range (max: {max})")]
    ZoomOutOfRange { z: u8, max: u8 },

    /// A bulk insert failed and was rolled back as a whole
    #[error("Bulk insert rolled back at tile {index} of {total}: {source}")]
    Transaction {
        index: usize,
        total: usize,
        #[source]
        source: rusqlite::Error,
    },

    /// Releasing a statement or the connection failed
    #[error("Failed to release {resource}: {source}")]
    ResourceRelease {
        resource: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// The `json` metadata value could not be (de)serialized
    #[error("Invalid metadata JSON: {0}")]
    MetadataJson(#[from] serde_json::Error),

    /// Any other failure reported by SQLite
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl TilesetError {
    /// True for the expected "no such row" outcomes.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TilesetError::TileNotFound { .. } | TilesetError::MetadataNotFound { .. }
        )
    }

    /// True when the backing store could not be opened or prepared against.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, TilesetError::Open { .. } | TilesetError::Prepare { .. })
    }
}

/// Errors raised while packing a directory of tiles into an archive.
#[derive(Debug, Error)]
pub enum PackError {
    /// Refusing to overwrite an existing archive
    #[error("Target file exists: {}", .0.display())]
    TargetExists(PathBuf),

    /// Error walking the source directory
    #[error("Error walking directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// Error reading a tile file
    #[error("Error reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error writing into the archive
    #[error(transparent)]
    Tileset(#[from] TilesetError),
}
