//! Pipeline settings.
//!
//! Every literal the algorithms depend on lives here with its default, so a
//! caller can override one value without restating the rest.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::rotate::Placement;

/// Settings for [`crate::rotate::RotationEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotateConfig {
    /// Edge length of the square source tiles.
    pub tile_size: u32,
    /// Rotation angle in degrees (positive = clockwise on screen).
    pub angle_degrees: f64,
    /// Extra pixels added to each tile's right and bottom edges.
    pub tile_margin: u32,
    /// Canvas value where no rotated tile lands.
    pub background: u8,
    /// How rotated tiles are positioned on the canvas.
    pub placement: Placement,
}

impl Default for RotateConfig {
    fn default() -> Self {
        Self {
            tile_size: 100,
            angle_degrees: 0.0,
            tile_margin: 2,
            background: 128,
            placement: Placement::Centered,
        }
    }
}

/// Settings for [`crate::pyramid::PyramidBuilder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PyramidConfig {
    /// Edge length of the emitted tiles.
    pub tile_size: u32,
    /// Scale factor between successive levels, in (0, 1).
    pub downscale_ratio: f64,
    /// Both level dimensions must be at or below this to produce the thumbnail.
    pub thumbnail_threshold: u32,
    /// Stripped from the front of every path recorded in the manifest.
    pub path_strip_prefix: String,
}

impl Default for PyramidConfig {
    fn default() -> Self {
        Self {
            tile_size: 512,
            downscale_ratio: 0.5,
            thumbnail_threshold: 1000,
            path_strip_prefix: String::new(),
        }
    }
}

/// Settings for [`crate::merge::TileMerger`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Edge of the coarse tiles the updated image is split into on disk.
    pub coarse_tile_size: u32,
    /// Edge of the in-memory blocks processed inside each coarse tile.
    pub block_size: u32,
    /// Lower bound of the ambiguous gray band (inclusive).
    pub mid_tone_low: u8,
    /// Upper bound of the ambiguous gray band (inclusive).
    pub mid_tone_high: u8,
    /// Value mid-tone pixels are forced to.
    pub neutral_gray: u8,
    /// Directory name, next to the updated image, receiving coarse tiles.
    pub intermediate_dir: PathBuf,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            coarse_tile_size: 5000,
            block_size: 2000,
            mid_tone_low: 100,
            mid_tone_high: 200,
            neutral_gray: 128,
            intermediate_dir: PathBuf::from("subImages"),
        }
    }
}
