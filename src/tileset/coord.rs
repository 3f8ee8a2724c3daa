//! Coordinate translation between web (XYZ) and MBTiles (TMS) row numbering.
//!
//! Web maps number tile rows from the top of the world; the `tiles` table
//! numbers them from the bottom. For a zoom level `z` with `2^z` rows:
//!
//! ```text
//! row = 2^z - y - 1
//! ```
//!
//! The formula is its own inverse, so the same function converts in both
//! directions. All reads and writes go through it exactly once.

use crate::error::TilesetError;

/// Deepest zoom level the transform accepts.
pub const MAX_ZOOM: u8 = 30;

/// Flip a row index at zoom `z` between top-origin and bottom-origin numbering.
///
/// Out-of-range inputs are not corrected: a `v` outside `[0, 2^z)` produces a
/// result outside that range too. `z` must not exceed [`MAX_ZOOM`].
#[inline]
pub fn flip_row(z: u8, v: i64) -> i64 {
    debug_assert!(z <= MAX_ZOOM);
    (1i64 << z) - v - 1
}

/// Parse a coordinate component written as plain ASCII digits.
///
/// Signs, whitespace and empty strings are rejected, as are values that do
/// not fit in `T`.
pub fn parse_component<T: std::str::FromStr>(segment: &str) -> Option<T> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// A tile address in the web (top-left origin) tiling scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoordinate {
    /// Zoom level
    pub z: u8,

    /// Column, counted from the left
    pub x: u32,

    /// Row, counted from the top
    pub y: u32,
}

impl TileCoordinate {
    pub fn new(z: u8, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Reject zoom levels the row transform cannot represent.
    pub fn check_zoom(&self) -> Result<(), TilesetError> {
        if self.z > MAX_ZOOM {
            return Err(TilesetError::ZoomOutOfRange {
                z: self.z,
                max: MAX_ZOOM,
            });
        }
        Ok(())
    }

    /// Convert to the archive's bottom-origin coordinate.
    pub fn to_stored(self) -> StoredCoordinate {
        StoredCoordinate {
            z: self.z,
            x: self.x,
            row: flip_row(self.z, i64::from(self.y)),
        }
    }
}

/// A tile address as stored in the `tiles` table (bottom-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoredCoordinate {
    /// `zoom_level` column
    pub z: u8,

    /// `tile_column` column
    pub x: u32,

    /// `tile_row` column
    pub row: i64,
}

impl StoredCoordinate {
    pub fn new(z: u8, x: u32, row: i64) -> Self {
        Self { z, x, row }
    }

    /// Convert back to the web coordinate, or `None` if the row has no
    /// web-convention equivalent at this zoom.
    pub fn to_tile(self) -> Option<TileCoordinate> {
        if self.z > MAX_ZOOM || !(0..1i64 << self.z).contains(&self.row) {
            return None;
        }
        let y = u32::try_from(flip_row(self.z, self.row)).ok()?;
        Some(TileCoordinate {
            z: self.z,
            x: self.x,
            y,
        })
    }
}

impl From<TileCoordinate> for StoredCoordinate {
    fn from(coord: TileCoordinate) -> Self {
        coord.to_stored()
    }
}
