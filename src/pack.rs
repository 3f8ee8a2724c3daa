//! Pack a `{z}/{x}/{y}.{ext}` directory of tiles into a new archive.
//!
//! Tiles are written through [`Writer::bulk_insert_tiles`] in batches, so a
//! failed batch leaves none of its tiles behind.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::PackError;
use crate::tileset::metadata::{
    METADATA_FORMAT_KEY, METADATA_MAXZOOM_KEY, METADATA_MINZOOM_KEY, METADATA_NAME_KEY,
};
use crate::tileset::{parse_component, Optimizations, TileData, Writer, MAX_ZOOM};

/// Default number of tiles written per transaction.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Options for [`pack`].
#[derive(Debug, Clone)]
pub struct PackOptions {
    /// Directory laid out as `{z}/{x}/{y}.{ext}`
    pub source_dir: PathBuf,

    /// Archive to create; must not exist yet
    pub target_file: PathBuf,

    /// Tileset name, defaults to the target file stem
    pub name: Option<String>,

    /// Tile format, defaults to the extension of the first tile
    pub format: Option<String>,

    /// Tiles per transaction
    pub batch_size: usize,

    /// Storage tuning to apply before writing
    pub optimizations: Optimizations,
}

impl PackOptions {
    pub fn new(source_dir: impl Into<PathBuf>, target_file: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            target_file: target_file.into(),
            name: None,
            format: None,
            batch_size: DEFAULT_BATCH_SIZE,
            optimizations: Optimizations::default(),
        }
    }

    fn tileset_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| {
                self.target_file
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
            })
            .unwrap_or_else(|| "noname".into())
    }
}

/// Result of a successful [`pack`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackSummary {
    pub tiles: usize,
    pub skipped: usize,
    pub min_zoom: Option<u8>,
    pub max_zoom: Option<u8>,
    pub format: Option<String>,
}

impl PackSummary {
    fn record(&mut self, z: u8) {
        self.tiles += 1;
        self.min_zoom = Some(self.min_zoom.map_or(z, |zoom| zoom.min(z)));
        self.max_zoom = Some(self.max_zoom.map_or(z, |zoom| zoom.max(z)));
    }
}

/// Create `options.target_file` from the tiles under `options.source_dir`.
pub fn pack(options: &PackOptions) -> Result<PackSummary, PackError> {
    let target_file = options.target_file.as_path();
    if target_file.exists() {
        return Err(PackError::TargetExists(target_file.to_path_buf()));
    }

    let mut writer = Writer::open(target_file)?;
    writer.set_optimizations(options.optimizations)?;
    writer.ensure_tiles_schema()?;

    let batch_size = options.batch_size.max(1);
    let mut batch = Vec::with_capacity(batch_size);
    let mut summary = PackSummary {
        format: options.format.clone(),
        ..PackSummary::default()
    };

    for entry in WalkDir::new(&options.source_dir).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();
        let Some((ext, z, x, y)) = parse_tile_file(&options.source_dir, path) else {
            warn!(path = %path.display(), "unexpected file, skipping");
            summary.skipped += 1;
            continue;
        };

        let data = fs::read(path).map_err(|source| PackError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        if summary.format.is_none() {
            summary.format = Some(ext);
        }
        summary.record(z);
        batch.push(TileData::new(z, x, y, data));

        if batch.len() >= batch_size {
            writer.bulk_insert_tiles(&batch)?;
            debug!(written = summary.tiles, "batch committed");
            batch.clear();
        }
    }
    writer.bulk_insert_tiles(&batch)?;

    write_metadata(&mut writer, options, &summary)?;
    writer.close()?;

    info!(
        tiles = summary.tiles,
        skipped = summary.skipped,
        target = %target_file.display(),
        "packed tileset"
    );
    Ok(summary)
}

fn write_metadata(
    writer: &mut Writer,
    options: &PackOptions,
    summary: &PackSummary,
) -> Result<(), PackError> {
    writer.insert_metadata(METADATA_NAME_KEY, &options.tileset_name())?;

    if let Some(format) = &summary.format {
        writer.insert_metadata(METADATA_FORMAT_KEY, format)?;
    }
    if let Some(min_zoom) = summary.min_zoom {
        writer.insert_metadata(METADATA_MINZOOM_KEY, &min_zoom.to_string())?;
    }
    if let Some(max_zoom) = summary.max_zoom {
        writer.insert_metadata(METADATA_MAXZOOM_KEY, &max_zoom.to_string())?;
    }

    Ok(())
}

/// Split `{root}/{z}/{x}/{y}.{ext}` into `(ext, z, x, y)`.
///
/// Components must be plain digits; any further extensions after the first
/// are ignored.
fn parse_tile_file(root: &Path, path: &Path) -> Option<(String, u8, u32, u32)> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = relative
        .iter()
        .map(|part| part.to_string_lossy().to_string())
        .collect();

    let [z, x, file] = parts.as_slice() else {
        return None;
    };
    // `5377.pbf.gz` names a pbf tile; only the first extension is the format.
    let mut pieces = file.split('.');
    let y = pieces.next()?;
    let ext = pieces.next().filter(|ext| !ext.is_empty())?;

    let z: u8 = parse_component(z)?;
    if z > MAX_ZOOM {
        return None;
    }
    let x: u32 = parse_component(x)?;
    let y: u32 = parse_component(y)?;

    Some((ext.to_string(), z, x, y))
}
