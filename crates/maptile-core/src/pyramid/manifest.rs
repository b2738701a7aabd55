//! The `info.json` manifest describing a tile pyramid.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TileError};

/// One emitted tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileManifestEntry {
    /// Tile file path with the configured prefix stripped.
    pub path: String,
    /// Grid column.
    pub x: u32,
    /// Grid row.
    pub y: u32,
    /// Scale of the tile's level relative to the source.
    pub resolution: f64,
    pub tile_size: u32,
}

/// Everything a viewer needs to load the pyramid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PyramidManifest {
    pub map_name: String,
    /// Tiles in emission order: row-major within a level, levels ascending.
    pub tiles: Vec<TileManifestEntry>,
    #[serde(rename = "mapMd5")]
    pub map_md5: String,
    /// Empty when no level was small enough for a thumbnail.
    pub map_thumb_path: String,
    pub map_thumb_width: u32,
    pub map_thumb_height: u32,
}

impl PyramidManifest {
    pub fn new(map_name: impl Into<String>, map_md5: impl Into<String>) -> Self {
        Self {
            map_name: map_name.into(),
            map_md5: map_md5.into(),
            ..Default::default()
        }
    }

    /// Serialize to `path`, replacing any existing file.
    pub fn write(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_vec(self)?;
        std::fs::write(path, data).map_err(|e| TileError::io(path, e))
    }

    pub fn read(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| TileError::io(path, e))?;
        Ok(serde_json::from_slice(&data)?)
    }
}

/// Render `path` for the manifest, removing `prefix` from its front.
pub fn manifest_path(path: &Path, prefix: &str) -> String {
    let full = path.to_string_lossy();
    match full.strip_prefix(prefix) {
        Some(rest) if !prefix.is_empty() => rest.to_string(),
        _ => full.into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_field_names() {
        let mut manifest = PyramidManifest::new("RoboGo-1-1-1", "abc123");
        manifest.tiles.push(TileManifestEntry {
            path: "/maps/RoboGo-1-1-1/1_0_1.png".to_string(),
            x: 1,
            y: 0,
            resolution: 1.0,
            tile_size: 512,
        });
        manifest.map_thumb_path = "/maps/RoboGo-1-1-1/thumb.png".to_string();
        manifest.map_thumb_width = 625;
        manifest.map_thumb_height = 500;

        let value = serde_json::to_value(&manifest).unwrap();
        assert_eq!(value["mapName"], "RoboGo-1-1-1");
        assert_eq!(value["mapMd5"], "abc123");
        assert_eq!(value["mapThumbPath"], "/maps/RoboGo-1-1-1/thumb.png");
        assert_eq!(value["mapThumbWidth"], 625);
        assert_eq!(value["mapThumbHeight"], 500);
        assert_eq!(value["tiles"][0]["path"], "/maps/RoboGo-1-1-1/1_0_1.png");
        assert_eq!(value["tiles"][0]["x"], 1);
        assert_eq!(value["tiles"][0]["y"], 0);
        assert_eq!(value["tiles"][0]["resolution"], 1.0);
        assert_eq!(value["tiles"][0]["tileSize"], 512);
    }

    #[test]
    fn test_write_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("info.json");
        let manifest = PyramidManifest::new("m", "md5");
        manifest.write(&path).unwrap();
        assert_eq!(PyramidManifest::read(&path).unwrap(), manifest);
    }

    #[test]
    fn test_manifest_path_strips_prefix() {
        let path = Path::new("/srv/app/maps/m/1_0_0.png");
        assert_eq!(manifest_path(path, "/srv/app"), "/maps/m/1_0_0.png");
        assert_eq!(manifest_path(path, ""), "/srv/app/maps/m/1_0_0.png");
        assert_eq!(manifest_path(path, "/other"), "/srv/app/maps/m/1_0_0.png");
    }
}
