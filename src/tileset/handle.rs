//! Tileset handle: the single owner of an archive's SQLite connection.
//!
//! Statements are compiled on first use and kept in the connection's
//! prepared-statement cache, so every later call reuses the same compiled
//! statement. [`Tileset::close`] finalizes every cached statement and then
//! closes the connection.

use std::cell::Cell;
use std::path::{Path, PathBuf};

use rusqlite::{CachedStatement, Connection, OpenFlags};
use tracing::debug;

use crate::error::TilesetError;

// =============================================================================
// Statement Kinds
// =============================================================================

/// The reusable statements a tileset prepares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    TileSelect,
    TileInsert,
    MetadataSelect,
    MetadataInsert,
}

impl StatementKind {
    pub const ALL: [StatementKind; 4] = [
        StatementKind::TileSelect,
        StatementKind::TileInsert,
        StatementKind::MetadataSelect,
        StatementKind::MetadataInsert,
    ];

    /// SQL text for this statement.
    pub fn sql(self) -> &'static str {
        match self {
            StatementKind::TileSelect => {
                "SELECT tile_data FROM tiles \
                 WHERE zoom_level = ?1 AND tile_column = ?2 AND tile_row = ?3"
            }
            StatementKind::TileInsert => {
                "INSERT OR REPLACE INTO tiles (zoom_level, tile_column, tile_row, tile_data) \
                 VALUES (?1, ?2, ?3, ?4)"
            }
            StatementKind::MetadataSelect => "SELECT value FROM metadata WHERE name = ?1",
            StatementKind::MetadataInsert => {
                "INSERT OR REPLACE INTO metadata (name, value) VALUES (?1, ?2)"
            }
        }
    }

    /// Human-readable name used in errors and logs.
    pub fn name(self) -> &'static str {
        match self {
            StatementKind::TileSelect => "tile select",
            StatementKind::TileInsert => "tile insert",
            StatementKind::MetadataSelect => "metadata select",
            StatementKind::MetadataInsert => "metadata insert",
        }
    }

    fn bit(self) -> u8 {
        match self {
            StatementKind::TileSelect => 1,
            StatementKind::TileInsert => 1 << 1,
            StatementKind::MetadataSelect => 1 << 2,
            StatementKind::MetadataInsert => 1 << 3,
        }
    }
}

// =============================================================================
// Tileset
// =============================================================================

/// An open MBTiles archive.
///
/// `Tileset` is `Send` but not `Sync`: share it between threads behind a
/// mutex, or open one handle per thread.
pub struct Tileset {
    conn: Connection,

    /// Location of the archive, `None` for in-memory archives
    path: Option<PathBuf>,

    /// Bitset of the statement kinds prepared so far
    prepared: Cell<u8>,
}

impl Tileset {
    /// Open an archive for reading and writing, creating the file if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TilesetError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| TilesetError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "opened tileset");
        Ok(Self::with_connection(conn, Some(path.to_path_buf())))
    }

    /// Open an existing archive without write access.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self, TilesetError> {
        let path = path.as_ref();
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags).map_err(|source| {
            TilesetError::Open {
                path: path.to_path_buf(),
                source,
            }
        })?;
        debug!(path = %path.display(), "opened tileset read-only");
        Ok(Self::with_connection(conn, Some(path.to_path_buf())))
    }

    /// Open a fresh archive that lives only in memory.
    pub fn open_in_memory() -> Result<Self, TilesetError> {
        let conn = Connection::open_in_memory().map_err(|source| TilesetError::Open {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        Ok(Self::with_connection(conn, None))
    }

    /// Wrap an already-open connection. No statement is prepared yet.
    pub fn with_connection(conn: Connection, path: Option<PathBuf>) -> Self {
        Self {
            conn,
            path,
            prepared: Cell::new(0),
        }
    }

    /// Location of the archive on disk, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Whether `kind` has been prepared on this handle.
    pub fn is_prepared(&self, kind: StatementKind) -> bool {
        self.prepared.get() & kind.bit() != 0
    }

    /// Return the cached statement for `kind`, compiling it on first use.
    pub fn statement(&self, kind: StatementKind) -> Result<CachedStatement<'_>, TilesetError> {
        let stmt = self
            .conn
            .prepare_cached(kind.sql())
            .map_err(|source| TilesetError::Prepare {
                statement: kind.name(),
                source,
            })?;

        if !self.is_prepared(kind) {
            debug!(statement = kind.name(), "prepared statement");
            self.prepared.set(self.prepared.get() | kind.bit());
        }

        Ok(stmt)
    }

    pub fn tile_select_statement(&self) -> Result<CachedStatement<'_>, TilesetError> {
        self.statement(StatementKind::TileSelect)
    }

    pub fn tile_insert_statement(&self) -> Result<CachedStatement<'_>, TilesetError> {
        self.statement(StatementKind::TileInsert)
    }

    pub fn metadata_select_statement(&self) -> Result<CachedStatement<'_>, TilesetError> {
        self.statement(StatementKind::MetadataSelect)
    }

    pub fn metadata_insert_statement(&self) -> Result<CachedStatement<'_>, TilesetError> {
        self.statement(StatementKind::MetadataInsert)
    }

    /// Release every prepared statement, then the connection.
    ///
    /// The statement cache is always flushed first, so the connection close
    /// is attempted even when no statement was ever prepared.
    pub fn close(self) -> Result<(), TilesetError> {
        let Tileset {
            conn,
            path,
            prepared,
        } = self;

        let released = StatementKind::ALL
            .iter()
            .filter(|kind| prepared.get() & kind.bit() != 0)
            .count();
        conn.flush_prepared_statement_cache();

        let result = conn
            .close()
            .map_err(|(_conn, source)| TilesetError::ResourceRelease {
                resource: "connection",
                source,
            });

        debug!(
            path = ?path,
            statements = released,
            ok = result.is_ok(),
            "closed tileset"
        );
        result
    }
}

impl std::fmt::Debug for Tileset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tileset")
            .field("path", &self.path)
            .field("prepared", &self.prepared.get())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
