//! Well-known metadata keys and the vector-tile `json` metadata document.
//!
//! The document is a passive convention: it is stored as a plain string under
//! [`METADATA_JSON_KEY`] and is neither generated nor checked against the
//! tiles in the archive.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Metadata key holding the tileset name.
pub const METADATA_NAME_KEY: &str = "name";

/// Metadata key holding the tile format (`png`, `jpg`, `pbf`, ...).
pub const METADATA_FORMAT_KEY: &str = "format";

/// Metadata key holding the lowest zoom level.
pub const METADATA_MINZOOM_KEY: &str = "minzoom";

/// Metadata key holding the highest zoom level.
pub const METADATA_MAXZOOM_KEY: &str = "maxzoom";

/// Metadata key holding the vector-tile JSON document.
pub const METADATA_JSON_KEY: &str = "json";

/// Metadata required for vector tilesets, stored under [`METADATA_JSON_KEY`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataJson {
    /// Vector layers in this archive. Not needed for raster tilesets.
    pub vector_layers: Vec<VectorLayer>,
}

/// One vector tile layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorLayer {
    /// Layer name as used inside the vector tiles
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minzoom: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxzoom: Option<u8>,

    /// Attribute names mapped to `"Number"`, `"Boolean"` or `"String"`
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl VectorLayer {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: None,
            minzoom: None,
            maxzoom: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, kind: impl Into<String>) -> Self {
        self.fields.insert(name.into(), kind.into());
        self
    }
}
